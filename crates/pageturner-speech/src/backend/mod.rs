//! Engine-agnostic TTS backend interface.
//!
//! [`EngineSpeechProvider`](crate::provider::EngineSpeechProvider) holds a
//! `Box<dyn TtsBackend>` so engines can be swapped without touching playback
//! or the reading loop.

pub mod alltalk;
#[cfg(feature = "sherpa")]
pub mod sherpa_tts;

use std::time::Duration;

use pageturner_core::SpeechError;

// ── Shared types ───────────────────────────────────────────────────

/// Audio produced by a backend.
#[derive(Debug, Clone, Default)]
pub struct TtsAudio {
    /// Interleaved PCM f32 samples.
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g. 24 000 for Kokoro and XTTS).
    pub sample_rate: u32,

    /// Interleaved channel count.
    pub channels: u16,
}

impl TtsAudio {
    /// Playback length of the samples.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        #[allow(clippy::cast_precision_loss)]
        let frames = self.samples.len() as f64 / f64::from(self.channels);
        Duration::from_secs_f64(frames / f64::from(self.sample_rate))
    }

    /// Append another buffer with the same format.
    ///
    /// An empty `self` adopts the format of `other`.
    pub fn append(&mut self, other: Self) -> Result<(), SpeechError> {
        if self.samples.is_empty() && self.sample_rate == 0 {
            *self = other;
            return Ok(());
        }
        if other.sample_rate != self.sample_rate || other.channels != self.channels {
            return Err(SpeechError::Decode(format!(
                "chunk format mismatch: {} Hz x{} vs {} Hz x{}",
                other.sample_rate, other.channels, self.sample_rate, self.channels
            )));
        }
        self.samples.extend(other.samples);
        Ok(())
    }
}

// ── TTS Backend Trait ──────────────────────────────────────────────

/// Backend-agnostic text-to-speech engine.
///
/// Implementations must be `Send + Sync` so the provider can hold them
/// across `.await` points behind a `tokio::sync::RwLock`.
#[async_trait::async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize text to audio. Long text is chunked by the backend.
    async fn synthesize(&self, text: &str) -> Result<TtsAudio, SpeechError>;

    /// Change the active voice.
    fn set_voice(&mut self, voice_id: &str);

    /// Set the speaking rate multiplier (0.5–2.0).
    fn set_speed(&mut self, speed: f32);

    /// Current voice ID.
    fn voice(&self) -> &str;

    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Check that the engine can synthesize right now.
    async fn health_check(&self) -> Result<(), SpeechError>;
}
