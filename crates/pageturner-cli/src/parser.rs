//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Reads paginated on-screen text aloud, turning pages as it goes.
#[derive(Parser)]
#[command(name = "pageturner")]
#[command(about = "Read a document window aloud, turning pages while it speaks")]
#[command(version)]
pub struct Cli {
    /// JSON settings file layered over the built-in defaults
    #[arg(long, global = true, env = "PAGETURNER_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
