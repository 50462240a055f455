use crate::community::{Community, OperationResult, Permission};
use crate::config::RunContext;
use crate::device::{Device, TransportKind};
use crate::error::RotateKeyResult;
use crate::restconf::RestconfBackend;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

/// Transport-agnostic access to the SNMP communities of one device.
///
/// Implementations catch every transport error at the method boundary:
/// `validate` reports a bool, reads return `Err` only for a failed query, and
/// mutations return an [`OperationResult`].
#[async_trait]
pub trait ConfigBackend: Send {
    fn transport(&self) -> TransportKind;

    /// Probe the device. Returns `true` once the backend is usable; a usable
    /// backend is not probed again.
    async fn validate(&mut self) -> bool;

    /// `Ok(vec![])` when nothing is configured, `Err` when the query failed.
    async fn list_communities(&mut self) -> RotateKeyResult<Vec<Community>>;

    async fn create_community(&mut self, name: &str, permission: Permission) -> OperationResult;

    async fn delete_community(&mut self, name: &str) -> OperationResult;

    /// Delete every configured community. Deletions that succeed stay
    /// applied even when others fail.
    async fn clear_communities(&mut self) -> OperationResult {
        let current = match self.list_communities().await {
            Ok(current) => current,
            Err(err) => {
                return OperationResult::failure(format!("lookup of current communities failed: {}", err))
            }
        };

        let mut reasons = Vec::new();
        for community in current {
            debug!("Deleting community {}", community.name);
            if let OperationResult::Failure(reason) = self.delete_community(&community.name).await {
                reasons.push(format!("Community {}, {}", community.name, reason));
            }
        }

        if reasons.is_empty() {
            OperationResult::Success
        } else {
            OperationResult::failure(reasons.join(", "))
        }
    }

    /// Release the device. Safe to call repeatedly and before `validate`.
    async fn disconnect(&mut self);
}

/// Builds the backend for a device once its transport is known.
pub trait BackendFactory: Send + Sync {
    fn build(&self, device: &Device, kind: TransportKind) -> RotateKeyResult<Box<dyn ConfigBackend>>;
}

/// Production factory: RESTCONF over `reqwest`, CLI over SSH.
pub struct DeviceBackendFactory {
    ctx: Arc<RunContext>,
}

impl DeviceBackendFactory {
    pub fn new(ctx: Arc<RunContext>) -> Self {
        DeviceBackendFactory { ctx }
    }
}

impl BackendFactory for DeviceBackendFactory {
    fn build(&self, device: &Device, kind: TransportKind) -> RotateKeyResult<Box<dyn ConfigBackend>> {
        match kind {
            TransportKind::Restconf => Ok(Box::new(RestconfBackend::new(&device.address, &self.ctx)?)),
            TransportKind::Session | TransportKind::Unreachable => session_backend(device, &self.ctx),
        }
    }
}

#[cfg(feature = "async-ssh2-lite")]
fn session_backend(device: &Device, ctx: &Arc<RunContext>) -> RotateKeyResult<Box<dyn ConfigBackend>> {
    use crate::session::ssh::SshConnector;
    use crate::session::SessionBackend;

    let connector = SshConnector::new(ctx.clone());
    Ok(Box::new(SessionBackend::new(
        &device.address,
        Arc::new(connector),
        ctx.command_timeout,
    )))
}

#[cfg(not(feature = "async-ssh2-lite"))]
fn session_backend(_device: &Device, _ctx: &Arc<RunContext>) -> RotateKeyResult<Box<dyn ConfigBackend>> {
    Err(crate::error::RotateKeyError::new(
        "CLI sessions require the async-ssh2-lite feature".to_string(),
    ))
}
