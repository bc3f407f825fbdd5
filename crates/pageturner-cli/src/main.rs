//! CLI entry point.
//!
//! Loads `.env`, parses arguments, sets up logging and dispatches to a
//! handler. Errors are printed once here and mapped to an exit code.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pageturner_cli::{Cli, CliError, Commands, handlers, outcome_exit_code};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pageturner=debug,pageturner_cli=debug,pageturner_reader=debug,pageturner_speech=debug,pageturner_screen=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let settings_file = cli.settings.as_deref();
    match &cli.command {
        Commands::Read(args) => {
            let outcome = handlers::read::execute(settings_file, args).await?;
            Ok(outcome_exit_code(&outcome))
        }
        Commands::Windows(args) => {
            handlers::windows::execute(args).await?;
            Ok(0)
        }
        Commands::Peek(args) => {
            handlers::peek::execute(settings_file, args).await?;
            Ok(0)
        }
    }
}
