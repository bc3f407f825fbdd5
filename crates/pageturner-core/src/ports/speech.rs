//! Speech port: synthesis and playback behind one contract.
//!
//! # Design Rules
//!
//! - No backend types in any signature; clips carry plain PCM.
//! - Playback is non-blocking. Completion is observed through a
//!   [`PlaybackHandle`], which the provider resolves through the paired
//!   [`PlaybackCompletion`].
//! - Implementations must tolerate `synthesize` being called concurrently
//!   with playback (prefetch runs while the current page plays).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::AudioClip;

// ── Voice parameters ─────────────────────────────────────────────────────────

/// Lowest accepted speaking rate multiplier.
pub const MIN_SPEECH_RATE: f32 = 0.5;

/// Highest accepted speaking rate multiplier.
pub const MAX_SPEECH_RATE: f32 = 2.0;

/// Voice settings handed to the speech provider unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParameters {
    /// Backend-specific voice identifier. `None` keeps the backend default.
    pub voice: Option<String>,
    /// Speaking rate multiplier (0.5–2.0).
    pub rate: f32,
    /// Output volume (1–100).
    pub volume: u8,
}

impl VoiceParameters {
    /// Rate clamped into the accepted range.
    #[must_use]
    pub fn effective_rate(&self) -> f32 {
        self.rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE)
    }

    /// Volume as a linear gain in `(0.0, 1.0]`.
    #[must_use]
    pub fn gain(&self) -> f32 {
        f32::from(self.volume.clamp(1, 100)) / 100.0
    }
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            voice: None,
            rate: 1.0,
            volume: 100,
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Errors from a speech provider.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// `initialize` has not been called or failed.
    #[error("Speech provider is not initialized")]
    NotInitialized,

    /// The synthesis engine or server is not reachable.
    #[error("Speech engine unavailable: {0}")]
    Unavailable(String),

    /// Synthesis failed for this text.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// Synthesis did not finish in time.
    #[error("Speech synthesis timed out after {0:?}")]
    Timeout(Duration),

    /// Audio could not be decoded.
    #[error("Audio decode failed: {0}")]
    Decode(String),

    /// The output device could not be opened or rejected the clip.
    #[error("Audio output failed: {0}")]
    Output(String),

    /// The operation was cancelled.
    #[error("Speech operation cancelled")]
    Cancelled,
}

// ── Playback handle ──────────────────────────────────────────────────────────

/// Observer side of one playback.
///
/// Clones observe the same playback. A handle whose completion side was
/// dropped counts as finished, so waiting can never hang on a dead provider.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    id: u64,
    done: watch::Receiver<bool>,
}

/// Provider side of one playback; resolves the paired handle.
#[derive(Debug)]
pub struct PlaybackCompletion {
    id: u64,
    done: watch::Sender<bool>,
}

impl PlaybackHandle {
    /// Create a handle and its completion side.
    #[must_use]
    pub fn pair(id: u64) -> (Self, PlaybackCompletion) {
        let (tx, rx) = watch::channel(false);
        (Self { id, done: rx }, PlaybackCompletion { id, done: tx })
    }

    /// Provider-assigned playback id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Whether rendering has finished or was stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        *self.done.borrow() || self.done.has_changed().is_err()
    }

    /// Suspend until rendering has finished or was stopped.
    pub async fn finished(&self) {
        let mut done = self.done.clone();
        // Err means the completion side was dropped, which also ends playback.
        let _ = done.wait_for(|finished| *finished).await;
    }
}

impl PlaybackCompletion {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Mark the playback as finished. Idempotent.
    pub fn complete(&self) {
        self.done.send_replace(true);
    }
}

// ── Port ─────────────────────────────────────────────────────────────────────

/// Synthesizes and plays speech.
///
/// Several backends (local neural model, remote HTTP server) implement this
/// trait; the reader never depends on a concrete one.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Prepare the engine and output device with the session's voice.
    async fn initialize(&self, voice: &VoiceParameters) -> Result<(), SpeechError>;

    /// Synthesize `text` into a clip with a known duration.
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SpeechError>;

    /// Start rendering `clip` and return immediately.
    async fn play_non_blocking(&self, clip: &AudioClip) -> Result<PlaybackHandle, SpeechError>;

    /// Suspend until the playback behind `handle` completes.
    async fn await_playback(&self, handle: &PlaybackHandle) -> Result<(), SpeechError> {
        handle.finished().await;
        Ok(())
    }

    /// Stop the playback behind `handle` if it is still rendering.
    async fn cancel(&self, handle: &PlaybackHandle);

    /// Release engine and output resources.
    async fn cleanup(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_defaults() {
        let voice = VoiceParameters::default();
        assert!(voice.voice.is_none());
        assert!((voice.gain() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rate_and_volume_clamped() {
        let voice = VoiceParameters {
            voice: None,
            rate: 4.0,
            volume: 0,
        };
        assert!((voice.effective_rate() - MAX_SPEECH_RATE).abs() < f32::EPSILON);
        assert!((voice.gain() - 0.01).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_handle_resolves_on_complete() {
        let (handle, completion) = PlaybackHandle::pair(7);
        assert_eq!(handle.id(), 7);
        assert!(!handle.is_finished());

        completion.complete();
        handle.finished().await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_dropped_completion_counts_as_finished() {
        let (handle, completion) = PlaybackHandle::pair(1);
        drop(completion);
        assert!(handle.is_finished());
        handle.finished().await;
    }
}
