mod cli;
mod commands;
mod error;
mod output;
mod progress;
mod screenshot;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::OutputOpts;
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbosity());

    let code = match run(cli).await {
        Ok(()) => exit_code::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
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
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Completions need neither config nor network
    if let Command::Completions(args) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "camsweep", &mut std::io::stdout());
        return Ok(());
    }

    let path = cli
        .global
        .config
        .clone()
        .unwrap_or_else(camsweep_config::config_path);
    let cfg = camsweep_config::load_config_from(&path)?;
    let display = OutputOpts::resolve(&cli.global, &cfg)?;

    match cli.command {
        Command::Scan(args) => commands::scan::handle(args, &cfg, display).await,
        Command::Attack(args) => commands::attack::handle(args, &cfg, display).await,
        Command::Config(args) => commands::config_cmd::handle(args, &path, &cfg, display),
        Command::Completions(_) => Ok(()),
    }
}
