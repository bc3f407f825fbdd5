//! Command-line front end for pageturner.
//!
//! `main.rs` parses arguments and dispatches; [`bootstrap`] is the composition
//! root that picks concrete adapters; [`handlers`] hold one module per
//! subcommand.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use commands::{Commands, Engine};
pub use error::{CliError, EXIT_INTERRUPTED, outcome_exit_code};
pub use parser::Cli;
