//! Page-turn timing model.
//!
//! The page is advanced while the current page is still being spoken, so that
//! capturing and recognizing the next page overlaps the tail of playback.
//! Turning too early risks reading ahead of the narration; turning too late
//! wastes the overlap.

use std::time::Duration;

/// Smallest delay before a page turn.
pub const MIN_TURN_DELAY: Duration = Duration::from_millis(100);

/// Default fraction of playback after which the page is turned.
pub const DEFAULT_ADVANCE_RATIO: f64 = 0.7;

/// Lower bound for the advance ratio.
pub const MIN_ADVANCE_RATIO: f64 = 0.05;

/// Upper bound for the advance ratio.
pub const MAX_ADVANCE_RATIO: f64 = 0.95;

/// Per-session timing configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    advance_ratio: f64,
}

impl TimingConfig {
    /// Build a config, clamping `advance_ratio` into `[0.05, 0.95]`.
    ///
    /// A non-finite ratio falls back to the default.
    #[must_use]
    pub fn new(advance_ratio: f64) -> Self {
        let advance_ratio = if advance_ratio.is_finite() {
            advance_ratio.clamp(MIN_ADVANCE_RATIO, MAX_ADVANCE_RATIO)
        } else {
            DEFAULT_ADVANCE_RATIO
        };
        Self { advance_ratio }
    }

    #[must_use]
    pub const fn advance_ratio(&self) -> f64 {
        self.advance_ratio
    }

    /// Delay before turning the page for a clip of `duration`.
    #[must_use]
    pub fn turn_delay(&self, duration: Duration) -> Duration {
        turn_delay(duration, self.advance_ratio)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADVANCE_RATIO)
    }
}

/// `clamp(duration * ratio, 100ms, duration)`.
///
/// The upper bound wins when the clip is shorter than the minimum delay, so
/// the turn never happens after playback ends.
#[must_use]
pub fn turn_delay(duration: Duration, ratio: f64) -> Duration {
    let scaled = duration.mul_f64(ratio.max(0.0));
    scaled.max(MIN_TURN_DELAY).min(duration)
}
