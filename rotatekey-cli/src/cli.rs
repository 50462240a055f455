use crate::commands::builtin::{builtin, builtin_exec};
use crate::config::CliConfig;
use clap::{arg, crate_description, crate_name, crate_version, value_parser, Arg, Command};
use color_print::ceprintln;
use log::{debug, info};
use rotatekey::error::{RotateKeyError, RotateKeyResult};
use std::path::PathBuf;
use std::time::Instant;

/// Runs one top level command. `Ok(false)` means it ran but something on
/// the way failed and has already been reported.
pub async fn exec(cmd: &str, cfg: CliConfig) -> RotateKeyResult<bool> {
    let start_time = Instant::now();
    let result = match builtin_exec(cmd, &cfg.inner).await {
        Some(result) => result,
        None => Err(RotateKeyError::new(format!("Unknown command '{}'", cmd))),
    };
    info!("Operation took: {:.3}s", start_time.elapsed().as_secs_f32());

    match result {
        Ok(success) => {
            debug!("Command '{}' finished, success: {}", cmd, success);
            Ok(success)
        }
        Err(err) => {
            ceprintln!("<red,bold>ERROR:</> <red>{}</>", err);
            Ok(false)
        }
    }
}

pub fn cli() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .long_version(crate_version!())
        .arg_required_else_help(true)
        .allow_external_subcommands(false)
        .bin_name("rotatekey")
        .display_name("rotatekey")
        .help_template(color_print::cstr!(
            "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}

<green,bold>Commands:</>
    <cyan,bold>check-inventory</>   Show which transport each device resolves to
    <cyan,bold>snmp list</>         List SNMP communities on every device
    <cyan,bold>snmp update</>       Delete, create or rotate SNMP communities

See '<cyan,bold>rotatekey help</> <cyan><<command>></>' for more information on a specific command.\n",
        ))
        .args([
            global_opt("inventory", "Inventory file listing the devices")
                .short('i')
                .default_value("inventory.yaml")
                .value_parser(value_parser!(PathBuf)),
            arg!(--debug "Log debug output from the library").global(true),
            arg!(--"cli-verbose" "Log every command sent to and output read from CLI sessions")
                .global(true),
            arg!(--"prefer-restconf" "Probe RESTCONF on every device, not only those flagged in inventory")
                .global(true),
            arg!(--"verify-cli" "Open a CLI session during selection and mark devices that fail as unreachable")
                .global(true),
            arg!(-q --quiet "Disable logging completely").global(true),
            global_opt("username", "Username for device connections").env("NETWORK_USERNAME"),
            global_opt("password", "Password for device connections")
                .env("NETWORK_PASSWORD")
                .hide_env(true),
            global_opt("device-timeout", "Give up on a device after this many seconds")
                .value_name("SECS")
                .value_parser(value_parser!(u64).range(1..)),
        ])
        .subcommands(builtin())
}

fn global_opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).help(help).long(name).global(true)
}

#[test]
fn verify_cli() {
    cli().debug_assert();
}

#[test]
fn test_update_requires_an_action() {
    assert!(cli().try_get_matches_from(["rotatekey", "snmp", "update"]).is_err());
    let matches = cli()
        .try_get_matches_from(["rotatekey", "snmp", "update", "-d", "--ro", "pub1"])
        .unwrap();
    let (_, snmp) = matches.subcommand().unwrap();
    let (name, update) = snmp.subcommand().unwrap();
    assert_eq!(name, "update");
    assert!(update.get_flag("delete-current"));
    assert_eq!(update.get_one::<String>("ro").map(String::as_str), Some("pub1"));
}
