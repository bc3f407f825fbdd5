//! Reader error types.

use pageturner_core::{CaptureError, ExtractionError, SpeechError, TargetHandle};

/// Errors that end a reading session.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The target window was closed or can no longer be captured.
    #[error("Target {0} is unavailable")]
    TargetUnavailable(TargetHandle),

    /// The speech provider could not be initialized.
    #[error("Speech provider unavailable: {0}")]
    SpeechUnavailable(#[source] SpeechError),
}

/// Why a single page read produced no page.
#[derive(Debug, thiserror::Error)]
pub enum PageReadError {
    /// The target failed its liveness check.
    #[error("Target {0} is gone")]
    TargetGone(TargetHandle),

    /// The capture provider failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The text extractor failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl PageReadError {
    /// Whether the session cannot continue.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TargetGone(_) | Self::Capture(CaptureError::TargetGone(_))
        )
    }

    /// The target to report when the error is fatal.
    #[must_use]
    pub const fn gone_target(&self) -> Option<&TargetHandle> {
        match self {
            Self::TargetGone(handle) | Self::Capture(CaptureError::TargetGone(handle)) => {
                Some(handle)
            }
            _ => None,
        }
    }
}
