use crate::commands::builtin::subcommand_template;
use crate::config::Config;
use clap::Command;
use color_print::cprintln;
use log::warn;
use rotatekey::backend::DeviceBackendFactory;
use rotatekey::device::TransportKind;
use rotatekey::error::RotateKeyResult;
use rotatekey::selector::DeviceSelector;

pub fn cli() -> Command {
    Command::new("check-inventory")
        .about("Show which transport each device resolves to")
        .help_template(subcommand_template())
}

pub async fn exec(cfg: &Config) -> RotateKeyResult<bool> {
    let inventory = cfg.load_inventory()?;
    let factory = DeviceBackendFactory::new(cfg.ctx.clone());
    let mut fleet = DeviceSelector::new(&factory, &cfg.ctx)
        .resolve(inventory)
        .await;

    let name_width = fleet
        .devices()
        .map(|resolved| resolved.name().len())
        .max()
        .unwrap_or(0)
        .max("Device".len());
    let address_width = fleet
        .devices()
        .map(|resolved| resolved.device().address.len())
        .max()
        .unwrap_or(0)
        .max("Address".len());

    let header = format!(
        "{:<nw$}  {:<aw$}  Transport",
        "Device",
        "Address",
        nw = name_width,
        aw = address_width
    );
    cprintln!("<bold>{}</>", header);
    let mut unreachable = 0;
    for resolved in fleet.devices() {
        let transport = resolved.transport();
        if transport == TransportKind::Unreachable {
            unreachable += 1;
        }
        println!(
            "{:<nw$}  {:<aw$}  {}",
            resolved.name(),
            resolved.device().address,
            transport,
            nw = name_width,
            aw = address_width
        );
    }
    fleet.release().await;

    if unreachable > 0 {
        warn!("{} of {} devices are unreachable", unreachable, fleet.len());
    }
    Ok(unreachable == 0)
}
