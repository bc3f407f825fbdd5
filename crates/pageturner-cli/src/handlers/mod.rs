//! Command handlers.
//!
//! Handlers follow one pattern: build what they need through
//! [`bootstrap`](crate::bootstrap), do the work, format output for the
//! terminal. They return `anyhow::Result`; [`CliError`](crate::CliError)
//! inside the chain decides the exit code.

pub mod peek;
pub mod read;
pub mod windows;
