//! CLI error type and exit codes.

use pageturner_core::{ReadOutcome, SettingsError, SpeechError};
use pageturner_reader::ReaderError;
use pageturner_screen::CommandError;
use thiserror::Error;

/// Exit code for a session ended by Ctrl+C (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument combination the parser cannot reject on its own.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Settings file or values are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    /// No window matched the query.
    #[error("No window matches \"{0}\" (try `pageturner windows`)")]
    WindowNotFound(String),

    /// An external command could not run.
    #[error("Process error: {0}")]
    Process(#[from] CommandError),

    /// The speech engine could not be set up.
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    /// The reading session ended with a fatal error.
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

impl CliError {
    /// Map error to an exit code, following sysexits.h where one fits.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::Config(_) => 78,        // EX_CONFIG
            Self::WindowNotFound(_) => 66, // EX_NOINPUT
            Self::Process(_) => 71,       // EX_OSERR
            Self::Speech(_) | Self::Reader(ReaderError::SpeechUnavailable(_)) => 69, // EX_UNAVAILABLE
            Self::Reader(ReaderError::TargetUnavailable(_)) => 3,
        }
    }
}

/// Exit code for a session that ended without error.
pub const fn outcome_exit_code(outcome: &ReadOutcome) -> u8 {
    match outcome {
        ReadOutcome::Finished { .. } => 0,
        ReadOutcome::Stopped { .. } => EXIT_INTERRUPTED,
    }
}
