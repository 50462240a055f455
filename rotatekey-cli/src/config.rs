use crate::commands::builtin::{value_of, value_of_if_exists};
use clap::ArgMatches;
use log::debug;
use rotatekey::config::{Credentials, RunContext};
use rotatekey::error::{RotateKeyError, RotateKeyResult};
use rotatekey::inventory::Inventory;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inner: Arc<Config>,
}

#[derive(Debug)]
pub struct Config {
    pub args: ArgMatches,
    pub inventory: PathBuf,
    pub ctx: Arc<RunContext>,
}

impl CliConfig {
    pub fn new(args: ArgMatches) -> RotateKeyResult<Self> {
        let username = value_of_if_exists::<String>("username", &args)
            .ok_or_else(|| {
                RotateKeyError::new(
                    "No username provided (use --username or NETWORK_USERNAME)".to_string(),
                )
            })?
            .clone();
        let password = value_of_if_exists::<String>("password", &args)
            .ok_or_else(|| {
                RotateKeyError::new(
                    "No password provided (use --password or NETWORK_PASSWORD)".to_string(),
                )
            })?
            .clone();
        let device_timeout =
            value_of_if_exists::<u64>("device-timeout", &args).map(|secs| Duration::from_secs(*secs));

        let ctx = RunContext::new(Credentials::new(username, password))
            .with_prefer_restconf(*value_of::<bool>("prefer-restconf", &args))
            .with_verify_cli(*value_of::<bool>("verify-cli", &args))
            .with_device_timeout(device_timeout);
        debug!("Run context: {:?}", ctx);

        Ok(Self {
            inner: Arc::new(Config {
                inventory: value_of::<PathBuf>("inventory", &args).clone(),
                args,
                ctx: Arc::new(ctx),
            }),
        })
    }
}

impl Config {
    pub fn load_inventory(&self) -> RotateKeyResult<Inventory> {
        debug!("Reading inventory '{}'", self.inventory.display());
        Inventory::from_path(&self.inventory).map_err(|err| {
            RotateKeyError::new(format!(
                "Could not load inventory '{}': {}",
                self.inventory.display(),
                err
            ))
        })
    }
}
