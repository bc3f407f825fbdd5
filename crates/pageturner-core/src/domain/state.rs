//! Reading loop state and outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of the reading loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Initializing the speech provider and checking the target.
    Init,
    /// Reading the first page.
    CaptureFirst,
    /// Starting playback of the current page.
    Speaking,
    /// Advancing the target to the next page.
    Turning,
    /// Reading the next page while the current one plays.
    CaptureNext,
    /// Waiting for the current page to finish before switching.
    Swapping,
    /// End of content reached; letting the last page finish.
    Draining,
    /// Stopped by request or fatal error.
    Stopped,
}

impl LoopState {
    /// Whether the loop has left its working cycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Draining | Self::Stopped)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CaptureFirst => "capture_first",
            Self::Speaking => "speaking",
            Self::Turning => "turning",
            Self::CaptureNext => "capture_next",
            Self::Swapping => "swapping",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// How a reading session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReadOutcome {
    /// The page stopped changing after an advance.
    Finished { pages_read: usize },
    /// The stop signal fired.
    Stopped { pages_read: usize },
}

impl ReadOutcome {
    /// Pages whose playback was started.
    #[must_use]
    pub const fn pages_read(&self) -> usize {
        match self {
            Self::Finished { pages_read } | Self::Stopped { pages_read } => *pages_read,
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}
