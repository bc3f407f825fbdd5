//! Events emitted by the reading loop.
//!
//! Presentation layers subscribe through a
//! [`ReaderObserver`](crate::ports::ReaderObserver). Page and duration events
//! fire at most once per page transition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::LoopState;

/// Why a cycle produced no progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Capture or OCR produced no text.
    NoText,
    /// Capture or OCR failed.
    CaptureFailed,
    /// Synthesis failed or timed out.
    SynthesisFailed,
    /// Playback could not start.
    PlaybackFailed,
    /// The page-advance request failed.
    AdvanceFailed,
    /// Background synthesis for the next page failed.
    PrefetchFailed,
}

/// Something the reading loop wants its observer to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReaderEvent {
    /// Loop state transition.
    StateChanged { from: LoopState, to: LoopState },

    /// A new page became current.
    PageChanged { text: String },

    /// Playback length of the current page is known.
    DurationEstimated {
        #[serde(with = "duration_secs")]
        duration: Duration,
    },

    /// A transient failure was absorbed; the cycle will be retried.
    Status { kind: StatusKind, message: String },
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_serialized_as_seconds() {
        let event = ReaderEvent::DurationEstimated {
            duration: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "duration_estimated");
        assert_eq!(json["duration"], 1.5);

        let back: ReaderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_state_change_shape() {
        let event = ReaderEvent::StateChanged {
            from: LoopState::Turning,
            to: LoopState::CaptureNext,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["from"], "turning");
        assert_eq!(json["to"], "capture_next");
    }
}
