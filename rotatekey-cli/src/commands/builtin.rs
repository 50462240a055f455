use crate::commands::*;
use crate::config::Config;
use clap::{ArgMatches, Command};
use rotatekey::error::RotateKeyResult;

pub fn builtin() -> Vec<Command> {
    vec![check_inventory::cli(), snmp::cli()]
}

pub async fn builtin_exec(cmd: &str, cfg: &Config) -> Option<RotateKeyResult<bool>> {
    let f = match cmd {
        "check-inventory" => check_inventory::exec(cfg).await,
        "snmp" => snmp::exec(cfg).await,
        _ => return None,
    };
    Some(f)
}

pub(crate) fn value_of<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> &'a T {
    args.get_one::<T>(name).unwrap()
}

pub(crate) fn value_of_if_exists<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> Option<&'a T> {
    if args.contains_id(name) {
        args.get_one::<T>(name)
    } else {
        None
    }
}

/// Shared help layout for subcommands.
pub(super) fn subcommand_template() -> &'static str {
    color_print::cstr!(
        "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}\n",
    )
}
