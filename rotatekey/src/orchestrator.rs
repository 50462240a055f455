use crate::backend::{BackendFactory, ConfigBackend};
use crate::community::{Community, OperationResult, Permission};
use crate::config::RunContext;
use crate::device::TransportKind;
use crate::error::RotateKeyError;
use crate::selector::{Fleet, ResolvedDevice};
use core::fmt;
use core::fmt::Display;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// One step of a device's update sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    DeleteCurrent,
    Create { name: String, permission: Permission },
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::DeleteCurrent => write!(f, "snmp-delete-current"),
            Operation::Create { name, permission } => {
                write!(f, "snmp-create-{} [{}]", permission, name)
            }
        }
    }
}

/// Requested update. Steps always run as clear, create ro, create rw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    delete_current: bool,
    read_only: Option<String>,
    read_write: Option<String>,
}

impl ActionSet {
    pub fn new() -> ActionSet {
        ActionSet::default()
    }

    pub fn delete_current(mut self) -> ActionSet {
        self.delete_current = true;
        self
    }

    pub fn read_only(mut self, name: impl Into<String>) -> ActionSet {
        self.read_only = Some(name.into());
        self
    }

    pub fn read_write(mut self, name: impl Into<String>) -> ActionSet {
        self.read_write = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations().is_empty()
    }

    pub fn operations(&self) -> Vec<Operation> {
        let mut operations = Vec::with_capacity(3);
        if self.delete_current {
            operations.push(Operation::DeleteCurrent);
        }
        if let Some(name) = &self.read_only {
            operations.push(Operation::Create {
                name: name.clone(),
                permission: Permission::ReadOnly,
            });
        }
        if let Some(name) = &self.read_write {
            operations.push(Operation::Create {
                name: name.clone(),
                permission: Permission::ReadWrite,
            });
        }
        operations
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub device: String,
    pub operation: Operation,
    pub result: OperationResult,
}

impl Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            OperationResult::Success => write!(
                f,
                "Action {} on Device {} succeeded",
                self.operation, self.device
            ),
            OperationResult::Failure(reason) => write!(
                f,
                "Action {} on Device {} failed with reason '{}'",
                self.operation, self.device, reason
            ),
        }
    }
}

/// Every (device, operation, result) of an update run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn for_device<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a ReportEntry> {
        self.entries.iter().filter(move |entry| entry.device == device)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|entry| !entry.result.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Communities of one device, or why they could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub device: String,
    pub result: Result<Vec<Community>, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListReport {
    entries: Vec<ListEntry>,
}

impl ListReport {
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// (device, community) pairs for every device that answered.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &Community)> {
        self.entries.iter().flat_map(|entry| {
            entry
                .result
                .iter()
                .flatten()
                .map(move |community| (entry.device.as_str(), community))
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| match &entry.result {
            Ok(_) => None,
            Err(reason) => Some((entry.device.as_str(), reason.as_str())),
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Runs operation sequences device by device. Each device gets its own
/// backend, which is disconnected before the next device starts no matter
/// how its sequence ended.
pub struct BatchOrchestrator<'a> {
    factory: &'a dyn BackendFactory,
    ctx: &'a RunContext,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(factory: &'a dyn BackendFactory, ctx: &'a RunContext) -> Self {
        BatchOrchestrator { factory, ctx }
    }

    pub async fn update(&self, fleet: &mut Fleet, actions: &ActionSet) -> RunReport {
        let operations = actions.operations();
        let mut entries = Vec::with_capacity(fleet.len() * operations.len());
        for resolved in fleet.devices_mut() {
            info!("Processing device {}", resolved.name());
            self.update_device(resolved, &operations, &mut entries).await;
        }
        RunReport { entries }
    }

    pub async fn list(&self, fleet: &mut Fleet) -> ListReport {
        let mut entries = Vec::with_capacity(fleet.len());
        for resolved in fleet.devices_mut() {
            debug!("Processing device {}", resolved.name());
            let result = self.list_device(resolved).await;
            entries.push(ListEntry {
                device: resolved.name().to_string(),
                result,
            });
        }
        ListReport { entries }
    }

    async fn update_device(
        &self,
        resolved: &mut ResolvedDevice,
        operations: &[Operation],
        entries: &mut Vec<ReportEntry>,
    ) {
        let device = resolved.name().to_string();
        let start = entries.len();
        let mut backend = match self.backend_for(resolved) {
            Ok(backend) => backend,
            Err(reason) => {
                record_all(&device, operations, &reason, entries);
                return;
            }
        };

        let sequence = run_sequence(backend.as_mut(), &device, operations, entries);
        let outcome = bounded(self.ctx.device_timeout, sequence).await;
        if let Err(limit) = outcome {
            let reason = RotateKeyError::Timeout(limit).to_string();
            warn!("Device {}: {}", device, reason);
            let done = entries.len() - start;
            record_all(&device, &operations[done..], &reason, entries);
        }

        backend.disconnect().await;
    }

    async fn list_device(&self, resolved: &mut ResolvedDevice) -> Result<Vec<Community>, String> {
        let mut backend = self.backend_for(resolved)?;
        let lookup = async {
            if !backend.validate().await {
                return Err(unavailable(backend.transport()));
            }
            backend
                .list_communities()
                .await
                .map_err(|err| err.to_string())
        };
        let result = match bounded(self.ctx.device_timeout, lookup).await {
            Ok(result) => result,
            Err(limit) => Err(RotateKeyError::Timeout(limit).to_string()),
        };
        backend.disconnect().await;
        result
    }

    /// Reuse the backend probed during selection, otherwise build a fresh one
    /// for the resolved transport.
    fn backend_for(&self, resolved: &mut ResolvedDevice) -> Result<Box<dyn ConfigBackend>, String> {
        let kind = resolved.transport();
        if kind == TransportKind::Unreachable {
            return Err(unavailable(TransportKind::Session));
        }
        match resolved.take_backend() {
            Some(backend) => Ok(backend),
            None => self
                .factory
                .build(resolved.device(), kind)
                .map_err(|err| err.to_string()),
        }
    }
}

async fn run_sequence(
    backend: &mut dyn ConfigBackend,
    device: &str,
    operations: &[Operation],
    entries: &mut Vec<ReportEntry>,
) {
    if !backend.validate().await {
        record_all(device, operations, &unavailable(backend.transport()), entries);
        return;
    }

    for operation in operations {
        let result = match operation {
            Operation::DeleteCurrent => {
                debug!("Clearing all currently configured communities on {}", device);
                backend.clear_communities().await
            }
            Operation::Create { name, permission } => {
                debug!("Creating community {} ({}) on {}", name, permission, device);
                backend.create_community(name, *permission).await
            }
        };
        debug!("Action {} on {}: {}", operation, device, result);
        entries.push(ReportEntry {
            device: device.to_string(),
            operation: operation.clone(),
            result,
        });
    }
}

async fn bounded<F: Future>(limit: Option<Duration>, future: F) -> Result<F::Output, Duration> {
    match limit {
        Some(limit) => timeout(limit, future).await.map_err(|_| limit),
        None => Ok(future.await),
    }
}

fn record_all(device: &str, operations: &[Operation], reason: &str, entries: &mut Vec<ReportEntry>) {
    for operation in operations {
        entries.push(ReportEntry {
            device: device.to_string(),
            operation: operation.clone(),
            result: OperationResult::failure(reason),
        });
    }
}

fn unavailable(kind: TransportKind) -> String {
    format!("{} transport unavailable on device", kind)
}
