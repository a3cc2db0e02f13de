mod cli;
mod commands;
mod error;
mod output;
mod wifi;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    let code = match run(cli).await {
        Ok(()) => exit_code::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    if code != exit_code::SUCCESS {
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    match &cli.command {
        // Config commands never touch the network
        Command::Config(args) => commands::config_cmd::handle(args, global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "whyfi", &mut std::io::stdout());
            Ok(())
        }

        Command::Check(args) => {
            let monitor = commands::build_monitor(commands::load_monitor_config(global)?)?;
            let result = commands::check::handle(args, &monitor, global).await;
            monitor.shutdown().await;
            result
        }

        Command::Watch(args) => {
            let mut config = commands::load_monitor_config(global)?;
            if let Some(secs) = args.interval {
                config.refresh_interval = Duration::from_secs(secs);
            }
            let monitor = commands::build_monitor(config)?;
            commands::watch::handle(args, &monitor, global).await
        }

        Command::Speedtest => {
            let monitor = commands::build_monitor(commands::load_monitor_config(global)?)?;
            let result = commands::speedtest::handle(&monitor, global).await;
            monitor.shutdown().await;
            result
        }
    }
}
