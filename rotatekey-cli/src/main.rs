use crate::commands::builtin::value_of;
use color_print::ceprintln;
use config::CliConfig;
use env_logger::{Builder, Target};
use log::LevelFilter;
use rotatekey::error::RotateKeyResult;
use std::process::ExitCode;

mod cli;
mod commands;
mod config;

fn init_logging(debug: bool, cli_verbose: bool) {
    let mut builder = Builder::new();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
        builder.filter_module("rotatekey", LevelFilter::Warn);
        builder.filter_module("rotatekey_cli", LevelFilter::Info);
    }
    if cli_verbose {
        builder.filter_module("rotatekey::session", LevelFilter::Trace);
    }
    builder.target(Target::Stdout);
    builder.init();
}

#[tokio::main]
async fn main() -> RotateKeyResult<ExitCode> {
    let mut args = cli::cli().get_matches();
    let debug = *value_of::<bool>("debug", &args);
    let cli_verbose = *value_of::<bool>("cli-verbose", &args);
    let disable_logging = *value_of::<bool>("quiet", &args);
    if !disable_logging {
        init_logging(debug, cli_verbose);
    }

    match args.remove_subcommand() {
        Some((cmd, args)) => {
            let cli_config = match CliConfig::new(args) {
                Ok(config) => config,
                Err(err) => {
                    ceprintln!("<red,bold>ERROR:</> <red>{}</>", err);
                    return Ok(ExitCode::FAILURE);
                }
            };
            if cli::exec(&cmd, cli_config).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        _ => {
            cli::cli().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
