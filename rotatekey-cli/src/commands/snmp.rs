use crate::commands::builtin::{subcommand_template, value_of_if_exists};
use crate::config::Config;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use color_print::{ceprintln, cprintln};
use log::info;
use rotatekey::backend::DeviceBackendFactory;
use rotatekey::error::{RotateKeyError, RotateKeyResult};
use rotatekey::orchestrator::{ActionSet, BatchOrchestrator};
use rotatekey::selector::DeviceSelector;

pub fn cli() -> Command {
    Command::new("snmp")
        .about("Manage SNMP communities")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .help_template(color_print::cstr!(
            "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Commands:</>
{subcommands}

<green,bold>Options:</>
{options}\n",
        ))
        .subcommands([
            Command::new("list")
                .about("List SNMP communities on every device")
                .help_template(subcommand_template()),
            Command::new("update")
                .about("Delete, create or rotate SNMP communities")
                .help_template(subcommand_template())
                .args([
                    Arg::new("delete-current")
                        .help("Delete every community currently configured")
                        .short('d')
                        .long("delete-current")
                        .action(ArgAction::SetTrue),
                    Arg::new("ro")
                        .help("Create a read-only community")
                        .long("ro")
                        .value_name("NAME"),
                    Arg::new("rw")
                        .help("Create a read-write community")
                        .long("rw")
                        .value_name("NAME"),
                ])
                .group(
                    ArgGroup::new("actions")
                        .args(["delete-current", "ro", "rw"])
                        .multiple(true)
                        .required(true),
                ),
        ])
}

pub async fn exec(cfg: &Config) -> RotateKeyResult<bool> {
    match cfg.args.subcommand() {
        Some(("list", _)) => list(cfg).await,
        Some(("update", args)) => update(cfg, args).await,
        Some((cmd, _)) => Err(RotateKeyError::new(format!("Unknown snmp command '{}'", cmd))),
        None => Err(RotateKeyError::new("No snmp command given".to_string())),
    }
}

fn actions(args: &ArgMatches) -> ActionSet {
    let mut actions = ActionSet::new();
    if args.get_flag("delete-current") {
        actions = actions.delete_current();
    }
    if let Some(name) = value_of_if_exists::<String>("ro", args) {
        actions = actions.read_only(name);
    }
    if let Some(name) = value_of_if_exists::<String>("rw", args) {
        actions = actions.read_write(name);
    }
    actions
}

async fn list(cfg: &Config) -> RotateKeyResult<bool> {
    let inventory = cfg.load_inventory()?;
    let factory = DeviceBackendFactory::new(cfg.ctx.clone());
    let mut fleet = DeviceSelector::new(&factory, &cfg.ctx)
        .resolve(inventory)
        .await;
    let report = BatchOrchestrator::new(&factory, &cfg.ctx)
        .list(&mut fleet)
        .await;
    fleet.release().await;

    let device_width = report
        .rows()
        .map(|(device, _)| device.len())
        .max()
        .unwrap_or(0)
        .max("Device".len());
    let community_width = report
        .rows()
        .map(|(_, community)| community.name.len())
        .max()
        .unwrap_or(0)
        .max("Community".len());

    let header = format!(
        "{:<dw$}  {:<cw$}  Rights",
        "Device",
        "Community",
        dw = device_width,
        cw = community_width
    );
    cprintln!("<bold>{}</>", header);
    for (device, community) in report.rows() {
        println!(
            "{:<dw$}  {:<cw$}  {}",
            device,
            community.name,
            community.permission.as_str().to_uppercase(),
            dw = device_width,
            cw = community_width
        );
    }
    for (device, reason) in report.failures() {
        ceprintln!(
            "<red>ERROR: Could not read communities on Device {}: {}</>",
            device,
            reason
        );
    }
    Ok(report.is_success())
}

async fn update(cfg: &Config, args: &ArgMatches) -> RotateKeyResult<bool> {
    let actions = actions(args);
    cprintln!("<bold>Planned actions:</>");
    for operation in actions.operations() {
        println!("    {}", operation);
    }

    let inventory = cfg.load_inventory()?;
    let factory = DeviceBackendFactory::new(cfg.ctx.clone());
    let mut fleet = DeviceSelector::new(&factory, &cfg.ctx)
        .resolve(inventory)
        .await;
    let report = BatchOrchestrator::new(&factory, &cfg.ctx)
        .update(&mut fleet, &actions)
        .await;
    fleet.release().await;

    for failure in report.failures() {
        ceprintln!("<red>ERROR: {}</>", failure);
    }
    info!(
        "{} actions on {} devices, {} failed",
        report.entries().len(),
        fleet.len(),
        report.failures().count()
    );
    Ok(report.is_success())
}
