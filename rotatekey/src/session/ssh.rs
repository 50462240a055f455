use crate::config::RunContext;
use crate::error::{RotateKeyError, RotateKeyResult};
use crate::session::framer::PromptFramer;
use crate::session::{CliTransport, Connector};
use async_ssh2_lite::{ssh2, AsyncChannel, AsyncSession, SessionConfiguration};
use async_trait::async_trait;
use log::{debug, info};
use std::io;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Opens interactive shells with the run's password credentials.
pub struct SshConnector {
    ctx: Arc<RunContext>,
}

impl SshConnector {
    pub fn new(ctx: Arc<RunContext>) -> SshConnector {
        SshConnector { ctx }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, address: &str) -> RotateKeyResult<Box<dyn CliTransport>> {
        let (host, port) = split_address(address, self.ctx.ssh_port)?;
        let shell = SshShell::new_with_user_auth(&host, port, &self.ctx).await?;
        Ok(Box::new(shell))
    }
}

pub struct SshShell {
    address: String,
    session: AsyncSession<TcpStream>,
    framer: PromptFramer<AsyncChannel<TcpStream>>,
}

impl SshShell {
    pub async fn new_with_user_auth(
        host: &str,
        port: u16,
        ctx: &RunContext,
    ) -> RotateKeyResult<SshShell> {
        let address = format!("{}:{}", host, port);
        debug!(target: &address, "Trying to establish connection");
        let stream = timeout(ctx.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| RotateKeyError::Timeout(ctx.connect_timeout))??;

        let mut configuration = SessionConfiguration::new();
        configuration.set_timeout(ctx.command_timeout.as_millis().min(u32::MAX as u128) as u32);
        let mut session = AsyncSession::new(stream, configuration)?;
        session.handshake().await?;

        let credentials = &ctx.credentials;
        session
            .userauth_password(credentials.username(), credentials.password())
            .await?;
        if !session.authenticated() {
            return Err(RotateKeyError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("authentication failed for user '{}'", credentials.username()),
            )));
        }

        let mut channel = session.channel_session().await?;
        channel.request_pty("vt100", None, Some((512, 24, 0, 0))).await?;
        channel.shell().await?;

        let mut framer = PromptFramer::new(channel);
        timeout(ctx.command_timeout, framer.read_until_prompt())
            .await
            .map_err(|_| RotateKeyError::Timeout(ctx.command_timeout))??;
        info!(target: &address, "Established CLI session");

        Ok(SshShell {
            address,
            session,
            framer,
        })
    }
}

#[async_trait]
impl CliTransport for SshShell {
    async fn send_command(&mut self, command: &str) -> RotateKeyResult<String> {
        self.framer.send_command(command).await
    }

    async fn close(&mut self) -> RotateKeyResult<()> {
        debug!(target: &self.address, "Closing CLI session");
        let channel = self.framer.get_mut();
        channel.send_eof().await?;
        channel.close().await?;
        self.session
            .disconnect(Some(ssh2::ByApplication), "Shutdown", None)
            .await?;
        Ok(())
    }
}

/// `host` or `host:port`; bare IPv6 addresses keep the default port.
fn split_address(address: &str, default_port: u16) -> RotateKeyResult<(String, u16)> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            let port = port
                .parse()
                .map_err(|_| RotateKeyError::new(format!("invalid port in address '{}'", address)))?;
            Ok((host.to_string(), port))
        }
        _ => Ok((address.to_string(), default_port)),
    }
}
