//! Interactive CLI backend.
//!
//! The device output for SNMP communities is only available as running
//! configuration text, so reads parse `snmp-server community <name> <perm>`
//! lines and writes push single configuration lines through config mode.

use crate::backend::ConfigBackend;
use crate::community::{check_name, Community, OperationResult, Permission};
use crate::device::TransportKind;
use crate::error::{RotateKeyError, RotateKeyResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

pub mod framer;
pub mod platform;
#[cfg(feature = "async-ssh2-lite")]
pub mod ssh;

use platform::{Capabilities, Platform};

pub const COMMUNITY_PATTERN: &str = "snmp-server community";
const DISABLE_PAGING: &str = "terminal length 0";
const SHOW_VERSION: &str = "show version";

/// An open interactive shell on a device.
#[async_trait]
pub trait CliTransport: Send {
    /// Run one command line and return its output without echo or prompt.
    async fn send_command(&mut self, command: &str) -> RotateKeyResult<String>;
    async fn close(&mut self) -> RotateKeyResult<()>;
}

/// Opens shells; one connector is shared by every session backend in a run.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &str) -> RotateKeyResult<Box<dyn CliTransport>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unvalidated,
    Connecting,
    Usable,
    Unusable,
}

pub struct SessionBackend {
    address: String,
    connector: Arc<dyn Connector>,
    command_timeout: Duration,
    state: SessionState,
    transport: Option<Box<dyn CliTransport>>,
    capabilities: Option<Capabilities>,
}

impl SessionBackend {
    pub fn new(address: &str, connector: Arc<dyn Connector>, command_timeout: Duration) -> Self {
        SessionBackend {
            address: address.to_string(),
            connector,
            command_timeout,
            state: SessionState::Unvalidated,
            transport: None,
            capabilities: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn platform(&self) -> Option<Platform> {
        self.capabilities.as_ref().map(Capabilities::platform)
    }

    async fn open(&mut self) -> RotateKeyResult<Capabilities> {
        let transport = self.connector.connect(&self.address).await?;
        self.transport = Some(transport);
        self.exec(DISABLE_PAGING).await?;
        let version = self.exec(SHOW_VERSION).await?;
        let platform = Platform::detect(&version).ok_or(RotateKeyError::UnsupportedPlatform)?;
        Ok(platform.capabilities())
    }

    /// A timed out or failed command leaves its reply unread on the shell,
    /// so the session is dropped rather than reused out of step.
    async fn exec(&mut self, command: &str) -> RotateKeyResult<String> {
        let transport = self.transport.as_mut().ok_or(RotateKeyError::NotConnected)?;
        let reply = timeout(self.command_timeout, transport.send_command(command)).await;
        let output = match reply {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                self.abandon(command, &err).await;
                return Err(err);
            }
            Err(_) => {
                let err = RotateKeyError::Timeout(self.command_timeout);
                self.abandon(command, &err).await;
                return Err(err);
            }
        };
        match rejection(&output) {
            Some(message) => Err(RotateKeyError::CommandRejected {
                command: command.to_string(),
                message,
            }),
            None => Ok(output),
        }
    }

    fn usable_capabilities(&self) -> RotateKeyResult<Capabilities> {
        match (&self.state, &self.capabilities) {
            (SessionState::Usable, Some(capabilities)) => Ok(capabilities.clone()),
            _ => Err(RotateKeyError::NotConnected),
        }
    }

    async fn apply(&mut self, line: String) -> RotateKeyResult<()> {
        let capabilities = self.usable_capabilities()?;
        for command in capabilities.config_script(&[line]) {
            if let Err(err) = self.exec(&command).await {
                if self.transport.is_some() && command != capabilities.config_exit() {
                    let _ = self.exec(capabilities.config_exit()).await;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn abandon(&mut self, command: &str, err: &RotateKeyError) {
        warn!(target: &self.address, "Dropping CLI session after {:?} failed: {}", command, err);
        self.close_transport().await;
        self.capabilities = None;
        self.state = SessionState::Unusable;
    }

    async fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            match timeout(self.command_timeout, transport.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => debug!(target: &self.address, "Error closing session: {}", err),
                Err(_) => debug!(target: &self.address, "Timed out closing session"),
            }
        }
    }
}

#[async_trait]
impl ConfigBackend for SessionBackend {
    fn transport(&self) -> TransportKind {
        TransportKind::Session
    }

    async fn validate(&mut self) -> bool {
        if self.state == SessionState::Usable {
            return true;
        }
        self.state = SessionState::Connecting;
        match self.open().await {
            Ok(capabilities) => {
                info!(target: &self.address, "CLI session open, platform {}", capabilities.platform());
                self.capabilities = Some(capabilities);
                self.state = SessionState::Usable;
                true
            }
            Err(err) => {
                warn!(target: &self.address, "CLI session unavailable: {}", err);
                self.close_transport().await;
                self.state = SessionState::Unusable;
                false
            }
        }
    }

    async fn list_communities(&mut self) -> RotateKeyResult<Vec<Community>> {
        let capabilities = self.usable_capabilities()?;
        let output = self
            .exec(&capabilities.filtered_running_config(COMMUNITY_PATTERN))
            .await?;
        parse_communities(&output)
    }

    async fn create_community(&mut self, name: &str, permission: Permission) -> OperationResult {
        if let Err(err) = check_name(name) {
            return OperationResult::failure(err.to_string());
        }
        self.apply(format!("{} {} {}", COMMUNITY_PATTERN, name, permission))
            .await
            .into()
    }

    async fn delete_community(&mut self, name: &str) -> OperationResult {
        if let Err(err) = check_name(name) {
            return OperationResult::failure(err.to_string());
        }
        self.apply(format!("no {} {}", COMMUNITY_PATTERN, name))
            .await
            .into()
    }

    async fn disconnect(&mut self) {
        self.close_transport().await;
        self.capabilities = None;
        self.state = SessionState::Unvalidated;
    }
}

/// Parse `snmp-server community <name> <RO|RW> [acl]` lines. Any line that
/// does not follow that layout fails the whole read.
pub fn parse_communities(output: &str) -> RotateKeyResult<Vec<Community>> {
    let mut communities = Vec::new();
    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(malformed(line, "expected at least 4 tokens"));
        }
        if tokens[0] != "snmp-server" || tokens[1] != "community" {
            return Err(malformed(line, "not a community line"));
        }
        let permission = tokens[3]
            .parse::<Permission>()
            .map_err(|_| malformed(line, "permission is neither RO nor RW"))?;
        communities.push(Community::new(tokens[2], permission));
    }
    Ok(communities)
}

fn malformed(line: &str, reason: &'static str) -> RotateKeyError {
    RotateKeyError::MalformedLine {
        line: line.to_string(),
        reason,
    }
}

/// Cisco-style CLIs report rejected input on a line starting with `%`.
fn rejection(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('%'))
        .map(|line| line.trim_start_matches('%').trim().to_string())
}
