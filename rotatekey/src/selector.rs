use crate::backend::{BackendFactory, ConfigBackend};
use crate::config::RunContext;
use crate::device::{Device, TransportKind};
use crate::inventory::Inventory;
use log::{debug, warn};

/// A device whose transport has been decided, plus the RESTCONF backend
/// that was probed to decide it, if any.
pub struct ResolvedDevice {
    device: Device,
    backend: Option<Box<dyn ConfigBackend>>,
}

impl ResolvedDevice {
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn name(&self) -> &str {
        &self.device.device_name
    }

    pub fn transport(&self) -> TransportKind {
        self.device.transport().unwrap_or(TransportKind::Unreachable)
    }

    pub(crate) fn take_backend(&mut self) -> Option<Box<dyn ConfigBackend>> {
        self.backend.take()
    }

    async fn release(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.disconnect().await;
        }
    }
}

/// Inventory after selection, in inventory order.
#[derive(Default)]
pub struct Fleet {
    devices: Vec<ResolvedDevice>,
}

impl Fleet {
    pub fn devices(&self) -> impl Iterator<Item = &ResolvedDevice> {
        self.devices.iter()
    }

    pub(crate) fn devices_mut(&mut self) -> impl Iterator<Item = &mut ResolvedDevice> {
        self.devices.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Disconnect any backend still held from selection.
    pub async fn release(&mut self) {
        for resolved in self.devices.iter_mut() {
            resolved.release().await;
        }
    }
}

/// Decides, once per run, which transport each device is driven over.
pub struct DeviceSelector<'a> {
    factory: &'a dyn BackendFactory,
    ctx: &'a RunContext,
}

impl<'a> DeviceSelector<'a> {
    pub fn new(factory: &'a dyn BackendFactory, ctx: &'a RunContext) -> Self {
        DeviceSelector { factory, ctx }
    }

    pub async fn resolve(&self, inventory: Inventory) -> Fleet {
        debug!("Prefer RESTCONF status: {}", self.ctx.prefer_restconf);
        let mut devices = Vec::with_capacity(inventory.len());
        for device in inventory {
            devices.push(self.resolve_device(device).await);
        }
        Fleet { devices }
    }

    /// RESTCONF is probed for devices flagged in inventory or when the run
    /// prefers it. Everything else goes to the CLI, probed only with
    /// `verify_cli`; a verified session is closed again right away.
    pub async fn resolve_device(&self, mut device: Device) -> ResolvedDevice {
        if device.wants_restconf() || self.ctx.prefer_restconf {
            debug!("Testing device {} for RESTCONF support", device.device_name);
            if let Some(backend) = self.probe(&device, TransportKind::Restconf).await {
                device.resolve(TransportKind::Restconf);
                return ResolvedDevice {
                    device,
                    backend: Some(backend),
                };
            }
        } else {
            debug!("Device {} will use CLI connection", device.device_name);
        }

        if !self.ctx.verify_cli {
            device.resolve(TransportKind::Session);
            return ResolvedDevice {
                device,
                backend: None,
            };
        }

        match self.probe(&device, TransportKind::Session).await {
            Some(mut backend) => {
                // a session is held only for its own device's sequence
                backend.disconnect().await;
                device.resolve(TransportKind::Session);
                ResolvedDevice {
                    device,
                    backend: None,
                }
            }
            None => {
                warn!("Device {} is unreachable", device.device_name);
                device.resolve(TransportKind::Unreachable);
                ResolvedDevice {
                    device,
                    backend: None,
                }
            }
        }
    }

    async fn probe(&self, device: &Device, kind: TransportKind) -> Option<Box<dyn ConfigBackend>> {
        let mut backend = match self.factory.build(device, kind) {
            Ok(backend) => backend,
            Err(err) => {
                warn!("Could not set up {} for {}: {}", kind, device.device_name, err);
                return None;
            }
        };
        if backend.validate().await {
            Some(backend)
        } else {
            backend.disconnect().await;
            None
        }
    }
}
