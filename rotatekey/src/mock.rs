//! In-memory devices for unit tests.

use crate::backend::{BackendFactory, ConfigBackend};
use crate::community::{Community, OperationResult, Permission};
use crate::device::{Device, TransportKind};
use crate::error::{RotateKeyError, RotateKeyResult};
use crate::session::{CliTransport, Connector};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const IOSXE_VERSION: &str = "Cisco IOS XE Software, Version 17.03.04a\n\
Cisco IOS Software [Amsterdam], Virtual XE Software (X86_64_LINUX_IOSD-UNIVERSALK9-M)";

#[derive(Debug, Default)]
pub struct FakeCliState {
    pub version: String,
    pub communities: Vec<Community>,
    pub raw_config: Vec<String>,
    pub commands: Vec<String>,
    pub raising: Vec<(String, String)>,
    pub rejecting: Vec<String>,
    pub stalling: Vec<String>,
    pub config_mode: bool,
    pub closes: usize,
}

/// Scripted Cisco-style CLI. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeCli {
    state: Arc<Mutex<FakeCliState>>,
}

impl FakeCli {
    pub fn iosxe() -> FakeCli {
        FakeCli::default().with_version(IOSXE_VERSION)
    }

    pub fn with_version(self, version: &str) -> FakeCli {
        self.state.lock().unwrap().version = version.to_string();
        self
    }

    pub fn with_community(self, name: &str, permission: Permission) -> FakeCli {
        self.state
            .lock()
            .unwrap()
            .communities
            .push(Community::new(name, permission));
        self
    }

    pub fn with_raw_config_line(self, line: &str) -> FakeCli {
        self.state.lock().unwrap().raw_config.push(line.to_string());
        self
    }

    /// Commands containing `pattern` fail at the transport level.
    pub fn raising_on(self, pattern: &str, message: &str) -> FakeCli {
        self.state
            .lock()
            .unwrap()
            .raising
            .push((pattern.to_string(), message.to_string()));
        self
    }

    /// Commands containing `pattern` are answered with a `%` error.
    pub fn rejecting(self, pattern: &str) -> FakeCli {
        self.state.lock().unwrap().rejecting.push(pattern.to_string());
        self
    }

    /// Commands containing `pattern` never get an answer.
    pub fn stalling_on(self, pattern: &str) -> FakeCli {
        self.state.lock().unwrap().stalling.push(pattern.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

#[async_trait]
impl CliTransport for FakeCli {
    async fn send_command(&mut self, command: &str) -> RotateKeyResult<String> {
        let stall = {
            let mut state = self.state.lock().unwrap();
            state.commands.push(command.to_string());
            state.stalling.iter().any(|p| command.contains(p.as_str()))
        };
        if stall {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some((_, message)) = state.raising.iter().find(|(p, _)| command.contains(p.as_str())) {
            return Err(RotateKeyError::new(message.clone()));
        }
        if state.rejecting.iter().any(|p| command.contains(p.as_str())) {
            return Ok("        ^\n% Invalid input detected at '^' marker.".to_string());
        }

        let tokens: Vec<&str> = command.split_whitespace().collect();
        let output = match tokens.as_slice() {
            ["terminal", "length", "0"] => String::new(),
            ["show", "version"] => state.version.clone(),
            ["show", "running-config", "|", "include", ..] => {
                let mut lines: Vec<String> = state
                    .communities
                    .iter()
                    .map(|c| {
                        format!(
                            "snmp-server community {} {}",
                            c.name,
                            c.permission.as_str().to_uppercase()
                        )
                    })
                    .collect();
                lines.extend(state.raw_config.iter().cloned());
                lines.join("\n")
            }
            ["configure", "terminal"] => {
                state.config_mode = true;
                "Enter configuration commands, one per line.  End with CNTL/Z.".to_string()
            }
            ["end"] => {
                state.config_mode = false;
                String::new()
            }
            ["snmp-server", "community", name, permission] if state.config_mode => {
                let permission: Permission = permission.parse()?;
                state.communities.retain(|c| c.name != *name);
                state.communities.push(Community::new(*name, permission));
                String::new()
            }
            ["no", "snmp-server", "community", name] if state.config_mode => {
                state.communities.retain(|c| c.name != *name);
                String::new()
            }
            _ => "% Invalid input detected at '^' marker.".to_string(),
        };
        Ok(output)
    }

    async fn close(&mut self) -> RotateKeyResult<()> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

pub struct FakeConnector {
    cli: FakeCli,
    refuse: Option<String>,
    connects: Mutex<usize>,
}

impl FakeConnector {
    pub fn new(cli: FakeCli) -> FakeConnector {
        FakeConnector {
            cli,
            refuse: None,
            connects: Mutex::new(0),
        }
    }

    pub fn refusing(mut self, message: &str) -> FakeConnector {
        self.refuse = Some(message.to_string());
        self
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _address: &str) -> RotateKeyResult<Box<dyn CliTransport>> {
        *self.connects.lock().unwrap() += 1;
        match &self.refuse {
            Some(message) => Err(RotateKeyError::new(message.clone())),
            None => Ok(Box::new(self.cli.clone())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub usable: bool,
    pub validated: bool,
    pub communities: Vec<Community>,
    pub list_failure: Option<String>,
    pub delete_failures: HashMap<String, String>,
    pub create_failures: HashMap<String, String>,
    pub validate_calls: usize,
    pub delete_calls: Vec<String>,
    pub calls: Vec<String>,
    pub disconnects: usize,
    pub hang: bool,
}

/// Backend with scripted outcomes; the shared state stays inspectable after
/// the backend is boxed and handed away.
#[derive(Clone)]
pub struct MockBackend {
    kind: TransportKind,
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new(kind: TransportKind) -> MockBackend {
        let state = MockState {
            usable: true,
            ..MockState::default()
        };
        MockBackend {
            kind,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn unusable(self) -> MockBackend {
        self.state.lock().unwrap().usable = false;
        self
    }

    pub fn hanging(self) -> MockBackend {
        self.state.lock().unwrap().hang = true;
        self
    }

    pub fn with_communities(self, communities: &[(&str, Permission)]) -> MockBackend {
        self.state.lock().unwrap().communities = communities
            .iter()
            .map(|(name, permission)| Community::new(*name, *permission))
            .collect();
        self
    }

    pub fn failing_list(self, reason: &str) -> MockBackend {
        self.state.lock().unwrap().list_failure = Some(reason.to_string());
        self
    }

    pub fn failing_delete(self, name: &str, reason: &str) -> MockBackend {
        self.state
            .lock()
            .unwrap()
            .delete_failures
            .insert(name.to_string(), reason.to_string());
        self
    }

    pub fn failing_create(self, name: &str, reason: &str) -> MockBackend {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .insert(name.to_string(), reason.to_string());
        self
    }

    pub fn state(&self) -> Arc<Mutex<MockState>> {
        self.state.clone()
    }

    async fn maybe_hang(&self) {
        let hang = self.state.lock().unwrap().hang;
        if hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl ConfigBackend for MockBackend {
    fn transport(&self) -> TransportKind {
        self.kind
    }

    async fn validate(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.validated {
            return true;
        }
        state.validate_calls += 1;
        state.validated = state.usable;
        state.usable
    }

    async fn list_communities(&mut self) -> RotateKeyResult<Vec<Community>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list".to_string());
        if !state.validated {
            return Err(RotateKeyError::NotConnected);
        }
        match &state.list_failure {
            Some(reason) => Err(RotateKeyError::new(reason.clone())),
            None => Ok(state.communities.clone()),
        }
    }

    async fn create_community(&mut self, name: &str, permission: Permission) -> OperationResult {
        self.maybe_hang().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {} {}", name, permission));
        if let Some(reason) = state.create_failures.get(name) {
            return OperationResult::failure(reason.clone());
        }
        state.communities.retain(|c| c.name != name);
        state.communities.push(Community::new(name, permission));
        OperationResult::Success
    }

    async fn delete_community(&mut self, name: &str) -> OperationResult {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(name.to_string());
        state.calls.push(format!("delete {}", name));
        if let Some(reason) = state.delete_failures.get(name) {
            return OperationResult::failure(reason.clone());
        }
        state.communities.retain(|c| c.name != name);
        OperationResult::Success
    }

    async fn disconnect(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.disconnects += 1;
        state.validated = false;
    }
}

/// Hands out preconfigured backends keyed by device name and transport.
#[derive(Default)]
pub struct MockFactory {
    backends: Mutex<HashMap<(String, TransportKind), MockBackend>>,
    builds: Mutex<Vec<(String, TransportKind)>>,
}

impl MockFactory {
    pub fn new() -> MockFactory {
        MockFactory::default()
    }

    pub fn with(self, device: &str, backend: MockBackend) -> MockFactory {
        self.backends
            .lock()
            .unwrap()
            .insert((device.to_string(), backend.transport()), backend);
        self
    }

    pub fn builds(&self) -> Vec<(String, TransportKind)> {
        self.builds.lock().unwrap().clone()
    }
}

impl BackendFactory for MockFactory {
    fn build(&self, device: &Device, kind: TransportKind) -> RotateKeyResult<Box<dyn ConfigBackend>> {
        self.builds
            .lock()
            .unwrap()
            .push((device.device_name.clone(), kind));
        let backend = self
            .backends
            .lock()
            .unwrap()
            .get(&(device.device_name.clone(), kind))
            .cloned()
            .ok_or_else(|| {
                RotateKeyError::new(format!("no {} backend for {}", kind, device.device_name))
            })?;
        Ok(Box::new(backend))
    }
}
