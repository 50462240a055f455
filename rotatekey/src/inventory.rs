use crate::device::Device;
use crate::error::RotateKeyResult;
use log::debug;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Ordered list of devices loaded from a YAML inventory file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    devices: Vec<Device>,
}

impl Inventory {
    pub fn new(devices: Vec<Device>) -> Inventory {
        Inventory { devices }
    }

    pub fn from_path(path: impl AsRef<Path>) -> RotateKeyResult<Inventory> {
        let path = path.as_ref();
        debug!("Loading inventory '{}'", path.display());
        let inventory = Inventory::from_str(&fs::read_to_string(path)?)?;
        debug!("Loaded {} devices", inventory.len());
        Ok(inventory)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl FromStr for Inventory {
    type Err = crate::error::RotateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Inventory::default());
        }
        let devices: Option<Vec<Device>> = serde_yaml::from_str(s)?;
        Ok(Inventory {
            devices: devices.unwrap_or_default(),
        })
    }
}

impl IntoIterator for Inventory {
    type Item = Device;
    type IntoIter = std::vec::IntoIter<Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}
