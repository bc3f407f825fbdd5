//! Target window lifecycle port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TargetHandle;

/// Errors from page-advance requests.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The target window no longer exists.
    #[error("Target {0} is no longer available")]
    Gone(TargetHandle),

    /// The advance request failed but the target may still be alive.
    #[error("Page advance failed: {0}")]
    AdvanceFailed(String),
}

/// Liveness and navigation for the window being read.
#[async_trait]
pub trait TargetLifecycle: Send + Sync {
    /// Whether the target still exists and can be captured.
    async fn is_valid(&self, target: &TargetHandle) -> bool;

    /// Move the target to its next page.
    async fn advance_page(&self, target: &TargetHandle) -> Result<(), TargetError>;
}
