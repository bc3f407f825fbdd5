//! Channel-backed observer.

use pageturner_core::{ReaderEvent, ReaderObserver};
use tokio::sync::mpsc;

/// Forwards reader events to an unbounded channel.
///
/// The receiving end lives with the presentation layer. Sending never
/// blocks the loop; a dropped receiver is logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ReaderEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver for its events.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReaderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReaderObserver for ChannelObserver {
    fn notify(&self, event: ReaderEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Reader event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_forwarded_in_order() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.notify(ReaderEvent::PageChanged { text: "one".into() });
        observer.notify(ReaderEvent::PageChanged { text: "two".into() });

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first, ReaderEvent::PageChanged { text: "one".into() });
        assert_eq!(second, ReaderEvent::PageChanged { text: "two".into() });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_tolerated() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.notify(ReaderEvent::PageChanged { text: "lost".into() });
    }
}
