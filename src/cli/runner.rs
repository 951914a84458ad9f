//! Command-line definition and dispatch

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use crate::cli::commands::config::{config_show, ConfigShowOptions};
use crate::cli::commands::run::{execute_run, RunOptions};
use crate::cli::error::{CliError, CliResult};

/// Build the `lrk` command tree
pub fn build_cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_name("PATH")
        .value_parser(clap::value_parser!(PathBuf))
        .help("TOML configuration file (default: ~/.lrk/config.toml)");

    let env_arg = Arg::new("env-file")
        .long("env-file")
        .value_name("PATH")
        .value_parser(clap::value_parser!(PathBuf))
        .help(".env file to load before reading the environment");

    Command::new("lrk")
        .about("Automated literature review with staged LLM agents")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run the research workflow on a topic")
                .arg(
                    Arg::new("topic")
                        .long("topic")
                        .short('t')
                        .value_name("TOPIC")
                        .help("Research topic (read from stdin when omitted)"),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .value_parser(["sequential", "parallel"])
                        .help("Execution mode (overrides config and EXECUTION_MODE)"),
                )
                .arg(config_arg.clone())
                .arg(env_arg.clone())
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .short('o')
                        .value_name("DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Directory for the markdown report"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Use the offline provider; no API key or network for the model"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show the effective configuration")
                .arg(config_arg)
                .arg(env_arg)
                .arg(
                    Arg::new("get")
                        .long("get")
                        .value_name("KEY")
                        .help("Print a single value by dotted key, e.g. execution.mode"),
                ),
        )
}

/// Parse the process arguments and run the selected command
pub async fn run_cli() -> CliResult<()> {
    let matches = build_cli().get_matches();
    run_with_matches(&matches).await
}

/// Route already-parsed arguments to a command handler
pub async fn run_with_matches(matches: &ArgMatches) -> CliResult<()> {
    match matches.subcommand() {
        Some(("run", sub)) => {
            let options = RunOptions {
                topic: sub.get_one::<String>("topic").cloned(),
                mode: sub.get_one::<String>("mode").cloned(),
                config_path: sub.get_one::<PathBuf>("config").cloned(),
                env_file: sub.get_one::<PathBuf>("env-file").cloned(),
                output_dir: sub.get_one::<PathBuf>("output-dir").cloned(),
                dry_run: sub.get_flag("dry-run"),
            };
            execute_run(options).await.map(|_| ())
        }
        Some(("config", sub)) => config_show(ConfigShowOptions {
            config_path: sub.get_one::<PathBuf>("config").cloned(),
            env_file: sub.get_one::<PathBuf>("env-file").cloned(),
            get: sub.get_one::<String>("get").cloned(),
        }),
        Some((other, _)) => Err(CliError::InvalidInput(format!("Unknown command: {}", other))),
        None => Err(CliError::InvalidInput("No command given".to_string())),
    }
}
