//! Playback controller: one clip on the output at a time.

use std::sync::Arc;

use pageturner_core::{AudioClip, PlaybackHandle, SpeechError, SpeechProvider};
use tokio_util::sync::CancellationToken;

/// Wraps the speech provider's play / wait / cancel primitives and tracks
/// the currently playing clip.
pub struct PlaybackController {
    speech: Arc<dyn SpeechProvider>,
    active: Option<PlaybackHandle>,
}

impl PlaybackController {
    pub fn new(speech: Arc<dyn SpeechProvider>) -> Self {
        Self {
            speech,
            active: None,
        }
    }

    /// Start rendering `clip` without waiting for it.
    ///
    /// Any previous playback that has not finished is stopped first, so two
    /// clips never render together.
    pub async fn play(&mut self, clip: &AudioClip) -> Result<PlaybackHandle, SpeechError> {
        if let Some(previous) = self.active.take() {
            if !previous.is_finished() {
                tracing::warn!(
                    playback_id = previous.id(),
                    "Stopping unfinished playback before starting the next clip"
                );
                self.speech.cancel(&previous).await;
            }
        }

        let handle = self.speech.play_non_blocking(clip).await?;
        tracing::debug!(
            playback_id = handle.id(),
            duration_ms = clip.duration().as_millis(),
            "Playback started"
        );
        self.active = Some(handle.clone());
        Ok(handle)
    }

    /// Wait for the active playback to complete.
    ///
    /// Returns `false` if `stop` fired first; the playback is left running
    /// for [`stop`](Self::stop) to end. No timeout applies.
    pub async fn wait(&mut self, stop: &CancellationToken) -> bool {
        let Some(handle) = self.active.clone() else {
            return true;
        };
        let speech = Arc::clone(&self.speech);

        let completed = tokio::select! {
            biased;
            () = stop.cancelled() => None,
            result = speech.await_playback(&handle) => Some(result),
        };

        match completed {
            None => false,
            Some(result) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Playback ended with an error");
                }
                self.active = None;
                true
            }
        }
    }

    /// Stop the active playback, if any.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            if !handle.is_finished() {
                tracing::debug!(playback_id = handle.id(), "Stopping playback");
            }
            self.speech.cancel(&handle).await;
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }
}
