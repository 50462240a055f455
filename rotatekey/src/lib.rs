//! # rotatekey
//!
//! ```toml
//! rotatekey = "^0.1.0"
//! ```
//!
//! Manage SNMP community strings across an inventory of network devices.
//! Each device is driven over RESTCONF when it offers it, or over an
//! interactive CLI session otherwise.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rotatekey::backend::DeviceBackendFactory;
//! use rotatekey::config::{Credentials, RunContext};
//! use rotatekey::inventory::Inventory;
//! use rotatekey::orchestrator::{ActionSet, BatchOrchestrator};
//! use rotatekey::selector::DeviceSelector;
//!
//! # async fn run() -> rotatekey::error::RotateKeyResult<()> {
//! let ctx = Arc::new(RunContext::new(Credentials::new("admin", "secret")));
//! let factory = DeviceBackendFactory::new(ctx.clone());
//! let inventory = Inventory::from_path("inventory.yaml")?;
//!
//! let mut fleet = DeviceSelector::new(&factory, &ctx).resolve(inventory).await;
//! let actions = ActionSet::new().delete_current().read_only("public");
//! let report = BatchOrchestrator::new(&factory, &ctx).update(&mut fleet, &actions).await;
//! for failure in report.failures() {
//!     println!("{}", failure);
//! }
//! # Ok(())
//! # }
//! ```
//!
pub mod backend;
pub mod community;
pub mod config;
pub mod device;
pub mod error;
pub mod inventory;
pub mod orchestrator;
pub mod restconf;
pub mod selector;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub const YANG_DATA_JSON: &str = "application/yang-data+json";
pub const HOST_META_PATH: &str = "/.well-known/host-meta";
pub const SNMP_SERVER_RESOURCE: &str = "/data/Cisco-IOS-XE-native:native/snmp-server";
