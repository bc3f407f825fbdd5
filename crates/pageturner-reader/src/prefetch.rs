//! One-slot prefetch cache for the next page's audio.
//!
//! While page N plays, the loop submits page N+1's text here and synthesis
//! runs on a background task. When page N+1 becomes current the loop takes
//! the finished clip instead of synthesizing on the hot path.
//!
//! The slot is owned by the loop. The background task only ever sends its
//! own result through a oneshot channel; replacing or clearing the slot is
//! the loop's decision.

use std::sync::Arc;
use std::time::Duration;

use pageturner_core::{AudioClip, SpeechError, SpeechProvider};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of waiting on an in-flight prefetch.
#[derive(Debug)]
pub enum PendingWait {
    /// Synthesis for the requested text finished; the slot is now empty.
    Ready(AudioClip),
    /// Synthesis for the requested text failed; the slot is now empty.
    Failed(SpeechError),
    /// Nothing is pending for the requested text.
    NotPending,
    /// The stop signal fired while waiting.
    Stopped,
}

enum Outcome {
    Running(oneshot::Receiver<Result<AudioClip, SpeechError>>),
    Ready(AudioClip),
    Failed(SpeechError),
}

struct Pending {
    text: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    outcome: Outcome,
}

impl Pending {
    /// Move a delivered result out of the channel.
    fn poll(&mut self) {
        let Outcome::Running(rx) = &mut self.outcome else {
            return;
        };
        self.outcome = match rx.try_recv() {
            Ok(Ok(clip)) => Outcome::Ready(clip),
            Ok(Err(e)) => Outcome::Failed(e),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => Outcome::Failed(SpeechError::Cancelled),
        };
    }
}

/// Holds at most one pending (text, audio) pair.
pub struct PrefetchSlot {
    speech: Arc<dyn SpeechProvider>,
    synthesis_timeout: Duration,
    pending: Option<Pending>,
}

impl PrefetchSlot {
    pub fn new(speech: Arc<dyn SpeechProvider>, synthesis_timeout: Duration) -> Self {
        Self {
            speech,
            synthesis_timeout,
            pending: None,
        }
    }

    /// Start background synthesis for `text`.
    ///
    /// No-op while a job for the same text is running or finished. A job for
    /// a different text is cancelled first; a failed job for the same text
    /// is replaced by a fresh attempt.
    pub fn submit(&mut self, text: &str) {
        if let Some(pending) = self.pending.as_mut() {
            pending.poll();
            if pending.text == text && !matches!(pending.outcome, Outcome::Failed(_)) {
                tracing::debug!("Prefetch already pending for this page");
                return;
            }
        }
        self.cancel();

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let speech = Arc::clone(&self.speech);
        let token = cancel.clone();
        let owned = text.to_owned();
        let timeout = self.synthesis_timeout;

        let task = tokio::spawn(async move {
            let synth = tokio::time::timeout(timeout, speech.synthesize(&owned));
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!("Prefetch synthesis cancelled");
                }
                result = synth => {
                    let result = result.unwrap_or(Err(SpeechError::Timeout(timeout)));
                    // The slot may have been replaced; a dropped receiver is fine.
                    let _ = tx.send(result);
                }
            }
        });

        tracing::debug!(chars = text.len(), "Prefetch submitted");
        self.pending = Some(Pending {
            text: text.to_owned(),
            cancel,
            task,
            outcome: Outcome::Running(rx),
        });
    }

    /// Take the finished clip if it was synthesized for exactly `text`.
    pub fn consume_if_matches(&mut self, text: &str) -> Option<AudioClip> {
        let pending = self.pending.as_mut()?;
        pending.poll();
        if pending.text != text || !matches!(pending.outcome, Outcome::Ready(_)) {
            return None;
        }
        match self.pending.take()?.outcome {
            Outcome::Ready(clip) => Some(clip),
            Outcome::Running(_) | Outcome::Failed(_) => None,
        }
    }

    /// Wait for a job already running for `text` instead of starting another.
    ///
    /// Cancellable through `stop`. Leaves the slot empty unless the result
    /// is [`PendingWait::NotPending`] or [`PendingWait::Stopped`].
    pub async fn wait_pending(&mut self, text: &str, stop: &CancellationToken) -> PendingWait {
        let Some(pending) = self.pending.as_mut().filter(|p| p.text == text) else {
            return PendingWait::NotPending;
        };

        if let Outcome::Running(rx) = &mut pending.outcome {
            let received = tokio::select! {
                biased;
                () = stop.cancelled() => return PendingWait::Stopped,
                received = rx => received,
            };
            pending.outcome = match received {
                Ok(Ok(clip)) => Outcome::Ready(clip),
                Ok(Err(e)) => Outcome::Failed(e),
                Err(_) => Outcome::Failed(SpeechError::Cancelled),
            };
        }

        match self.pending.take().map(|p| p.outcome) {
            Some(Outcome::Ready(clip)) => PendingWait::Ready(clip),
            Some(Outcome::Failed(e)) => PendingWait::Failed(e),
            Some(Outcome::Running(_)) | None => PendingWait::NotPending,
        }
    }

    /// Cancel any in-flight job and empty the slot.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            if matches!(pending.outcome, Outcome::Running(_)) {
                tracing::debug!("Cancelled in-flight prefetch");
            }
            pending.task.abort();
        }
    }

    /// Text currently held by the slot.
    #[must_use]
    pub fn pending_text(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.text.as_str())
    }

    /// Whether a finished clip is waiting in the slot.
    pub fn is_ready(&mut self) -> bool {
        self.pending.as_mut().is_some_and(|p| {
            p.poll();
            matches!(p.outcome, Outcome::Ready(_))
        })
    }
}

impl Drop for PrefetchSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
