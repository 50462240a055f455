use core::fmt;
use core::fmt::Display;
use serde_derive::{Deserialize, Serialize};

/// How a device is driven for the remainder of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Restconf,
    Session,
    Unreachable,
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Restconf => write!(f, "RESTCONF"),
            TransportKind::Session => write!(f, "CLI"),
            TransportKind::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// One inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Device {
    pub device_name: String,
    pub address: String,
    /// Inventory hint on load; after selection, whether RESTCONF is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restconf: Option<bool>,
    #[serde(skip)]
    transport: Option<TransportKind>,
}

impl Device {
    pub fn new(device_name: impl Into<String>, address: impl Into<String>) -> Device {
        Device {
            device_name: device_name.into(),
            address: address.into(),
            restconf: None,
            transport: None,
        }
    }

    pub fn with_restconf(mut self, restconf: bool) -> Device {
        self.restconf = Some(restconf);
        self
    }

    pub fn wants_restconf(&self) -> bool {
        self.restconf.unwrap_or(false)
    }

    pub fn transport(&self) -> Option<TransportKind> {
        self.transport
    }

    /// Records the selection outcome. Only the first call has any effect.
    pub(crate) fn resolve(&mut self, kind: TransportKind) -> TransportKind {
        match self.transport {
            Some(resolved) => resolved,
            None => {
                self.transport = Some(kind);
                self.restconf = Some(kind == TransportKind::Restconf);
                kind
            }
        }
    }
}
