//! Synthesized audio clip.

use std::sync::Arc;
use std::time::Duration;

/// Speech synthesized for one page.
///
/// Samples are interleaved `f32` PCM shared behind an `Arc`, so handing a
/// clip from the prefetch slot to playback never copies the buffer. The
/// duration is computed from the sample count at synthesis time.
#[derive(Debug, Clone)]
pub struct AudioClip {
    source_text: String,
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
}

impl AudioClip {
    /// Create a clip from interleaved PCM samples.
    ///
    /// `sample_rate` and `channels` of zero are treated as an empty clip.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(
        source_text: impl Into<String>,
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        let duration = if sample_rate == 0 || channels == 0 {
            Duration::ZERO
        } else {
            let frames = samples.len() as f64 / f64::from(channels);
            Duration::from_secs_f64(frames / f64::from(sample_rate))
        };
        Self {
            source_text: source_text.into(),
            samples: samples.into(),
            sample_rate,
            channels,
            duration,
        }
    }

    /// Text this clip speaks.
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Playback length.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Interleaved PCM samples.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Whether the clip speaks `text`.
    #[must_use]
    pub fn speaks(&self, text: &str) -> bool {
        self.source_text == text
    }
}
