//! Target window lifecycle through external commands.

use std::time::Duration;

use async_trait::async_trait;
use pageturner_core::{TargetError, TargetHandle, TargetLifecycle};

use crate::command::CommandSpec;

/// Default limit for liveness checks and key presses.
pub const DEFAULT_TARGET_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks liveness and turns pages with two commands.
///
/// The liveness command succeeds (exit 0) while the window exists. The
/// advance command sends the page-turn input, by default the right arrow.
#[derive(Debug, Clone)]
pub struct CommandTarget {
    liveness: CommandSpec,
    advance: CommandSpec,
    timeout: Duration,
}

impl CommandTarget {
    pub const fn new(liveness: CommandSpec, advance: CommandSpec, timeout: Duration) -> Self {
        Self {
            liveness,
            advance,
            timeout,
        }
    }

    /// Replace the page-advance command.
    #[must_use]
    pub fn with_advance(mut self, advance: CommandSpec) -> Self {
        self.advance = advance;
        self
    }

    /// Replace the liveness command.
    #[must_use]
    pub fn with_liveness(mut self, liveness: CommandSpec) -> Self {
        self.liveness = liveness;
        self
    }

    #[must_use]
    pub const fn advance(&self) -> &CommandSpec {
        &self.advance
    }
}

impl Default for CommandTarget {
    fn default() -> Self {
        Self::new(
            CommandSpec::new("xdotool", ["getwindowname", "{window}"]),
            CommandSpec::new("xdotool", ["key", "--window", "{window}", "Right"]),
            DEFAULT_TARGET_TIMEOUT,
        )
    }
}

#[async_trait]
impl TargetLifecycle for CommandTarget {
    /// Only a liveness command that ran and exited non-zero marks the window
    /// as gone. A stalled or unrunnable command leaves that to the next
    /// capture.
    async fn is_valid(&self, target: &TargetHandle) -> bool {
        match self.liveness.for_target(target).run(None, self.timeout).await {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::warn!(
                    target_window = %target,
                    error = %e,
                    "Liveness check did not complete"
                );
                true
            }
        }
    }

    async fn advance_page(&self, target: &TargetHandle) -> Result<(), TargetError> {
        let result = self
            .advance
            .for_target(target)
            .run_checked(None, self.timeout)
            .await;
        let Err(e) = result else {
            tracing::debug!(target_window = %target, "Page advanced");
            return Ok(());
        };
        if self.is_valid(target).await {
            Err(TargetError::AdvanceFailed(e.to_string()))
        } else {
            tracing::debug!(error = %e, "Advance failed on a closed window");
            Err(TargetError::Gone(target.clone()))
        }
    }
}
