use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Username/password pair shared by every device in a run.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Credentials {
        Credentials {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Settings for one run, built once by the caller and shared by reference
/// with the selector, the backends and the orchestrator.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub credentials: Credentials,
    /// Probe RESTCONF on every device, not only the ones flagged in inventory.
    pub prefer_restconf: bool,
    /// Probe the CLI session of non-RESTCONF devices during selection.
    pub verify_cli: bool,
    pub ssh_port: u16,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub http_timeout: Duration,
    /// Upper bound for the whole operation sequence of a single device.
    pub device_timeout: Option<Duration>,
}

impl RunContext {
    pub fn new(credentials: Credentials) -> RunContext {
        RunContext {
            credentials,
            prefer_restconf: false,
            verify_cli: false,
            ssh_port: DEFAULT_SSH_PORT,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(30),
            device_timeout: None,
        }
    }

    pub fn with_prefer_restconf(mut self, prefer: bool) -> RunContext {
        self.prefer_restconf = prefer;
        self
    }

    pub fn with_verify_cli(mut self, verify: bool) -> RunContext {
        self.verify_cli = verify;
        self
    }

    pub fn with_device_timeout(mut self, timeout: Option<Duration>) -> RunContext {
        self.device_timeout = timeout;
        self
    }
}
