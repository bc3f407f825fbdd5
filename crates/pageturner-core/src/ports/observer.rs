//! Observer port for reading loop events.

use crate::events::ReaderEvent;

/// Receives reading loop events.
///
/// `notify` is called from the loop's own task and must not block.
///
/// # Implementations
///
/// - `NoopObserver` - for tests and headless runs
/// - Channel-backed observers in the reader crate
pub trait ReaderObserver: Send + Sync {
    fn notify(&self, event: ReaderEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NoopObserver {
    pub const fn new() -> Self {
        Self
    }
}

impl ReaderObserver for NoopObserver {
    fn notify(&self, _event: ReaderEvent) {}
}
