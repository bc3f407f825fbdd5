//! The pipelined reading loop.
//!
//! ```text
//! Init → CaptureFirst → Speaking → (turn delay) → Turning → CaptureNext
//!                          ▲                                   │
//!                          └──────────── Swapping ◄────────────┤
//!                                                              └→ Draining
//! ```
//!
//! Page N is spoken while the target is advanced and page N+1 is captured
//! and synthesized in the background. Page N+1 starts only once page N has
//! finished. Identical text after an advance means the content is exhausted.
//!
//! Every suspension point races the stop token. Transient failures are
//! reported to the observer and retried after a backoff; only a vanished
//! target or a speech provider that cannot start ends the session with an
//! error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pageturner_core::{
    AudioClip, LoopState, Page, ReadOutcome, ReaderEvent, ReaderSettings, SpeechError,
    StatusKind, TargetError, TimingConfig,
};
use tokio_util::sync::CancellationToken;

use crate::capture::CapturePipeline;
use crate::context::ReaderContext;
use crate::error::ReaderError;
use crate::playback::PlaybackController;
use crate::prefetch::{PendingWait, PrefetchSlot};

/// Drives one reading session.
pub struct ReadingLoop {
    ctx: ReaderContext,
    settings: ReaderSettings,
    timing: TimingConfig,
    pipeline: CapturePipeline,
    state: LoopState,
}

/// Per-run resources, dropped when `run` returns.
struct Session {
    prefetch: PrefetchSlot,
    playback: PlaybackController,
    pages_read: usize,
}

impl Session {
    const fn stopped(&self) -> ReadOutcome {
        ReadOutcome::Stopped {
            pages_read: self.pages_read,
        }
    }
}

/// What obtaining a clip for the current page produced.
enum ClipResult {
    Clip(AudioClip),
    Failed(SpeechError),
    Stopped,
}

impl ReadingLoop {
    pub fn new(ctx: ReaderContext, settings: ReaderSettings) -> Self {
        let pipeline = CapturePipeline::new(&ctx, settings.effective_crop());
        let timing = settings.timing();
        Self {
            ctx,
            settings,
            timing,
            pipeline,
            state: LoopState::Init,
        }
    }

    /// Current loop state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub const fn timing(&self) -> TimingConfig {
        self.timing
    }

    /// Read until the content ends, `stop` fires, or a fatal error occurs.
    ///
    /// On every exit in-flight synthesis is cancelled and the speech provider
    /// is cleaned up. After end of content the loop rests in
    /// [`LoopState::Draining`]; otherwise in [`LoopState::Stopped`].
    pub async fn run(&mut self, stop: CancellationToken) -> Result<ReadOutcome, ReaderError> {
        tracing::info!(
            target_window = %self.ctx.target(),
            advance_ratio = self.timing.advance_ratio(),
            "Reading session started"
        );

        let speech = Arc::clone(self.ctx.speech());
        let mut session = Session {
            prefetch: PrefetchSlot::new(Arc::clone(&speech), self.settings.synthesis_timeout()),
            playback: PlaybackController::new(Arc::clone(&speech)),
            pages_read: 0,
        };

        let result = self.drive(&mut session, &stop).await;

        session.prefetch.cancel();
        if !matches!(result, Ok(ReadOutcome::Finished { .. })) {
            session.playback.stop().await;
            self.set_state(LoopState::Stopped);
        }
        speech.cleanup().await;

        match &result {
            Ok(outcome) => tracing::info!(
                pages_read = outcome.pages_read(),
                finished = outcome.is_finished(),
                "Reading session ended"
            ),
            Err(e) => tracing::error!(error = %e, "Reading session failed"),
        }
        result
    }

    async fn drive(
        &mut self,
        session: &mut Session,
        stop: &CancellationToken,
    ) -> Result<ReadOutcome, ReaderError> {
        self.set_state(LoopState::Init);
        let voice = self.settings.voice_parameters();
        let speech = Arc::clone(self.ctx.speech());
        match until_stopped(stop, speech.initialize(&voice)).await {
            None => return Ok(session.stopped()),
            Some(Err(e)) => return Err(ReaderError::SpeechUnavailable(e)),
            Some(Ok(())) => {}
        }

        let lifecycle = Arc::clone(self.ctx.lifecycle());
        match until_stopped(stop, lifecycle.is_valid(self.ctx.target())).await {
            None => return Ok(session.stopped()),
            Some(false) => return Err(ReaderError::TargetUnavailable(self.ctx.target().clone())),
            Some(true) => {}
        }

        self.set_state(LoopState::CaptureFirst);
        let Some(mut current) = self.capture_until_page(stop).await? else {
            return Ok(session.stopped());
        };
        self.emit(ReaderEvent::PageChanged {
            text: current.text().to_owned(),
        });

        loop {
            self.set_state(LoopState::Speaking);
            let Some(duration) = self.speak(&current, session, stop).await else {
                return Ok(session.stopped());
            };

            let delay = self.timing.turn_delay(duration);
            tracing::debug!(
                duration_ms = duration.as_millis(),
                delay_ms = delay.as_millis(),
                "Waiting to turn page"
            );
            if !sleep_or_stop(stop, delay).await {
                return Ok(session.stopped());
            }

            self.set_state(LoopState::Turning);
            if !self.turn_page(stop).await? {
                return Ok(session.stopped());
            }

            self.set_state(LoopState::CaptureNext);
            let Some(next) = self.capture_until_page(stop).await? else {
                return Ok(session.stopped());
            };

            if next.same_content(&current) {
                tracing::info!("Page unchanged after advance, reached end of content");
                self.set_state(LoopState::Draining);
                if !session.playback.wait(stop).await {
                    return Ok(session.stopped());
                }
                return Ok(ReadOutcome::Finished {
                    pages_read: session.pages_read,
                });
            }
            session.prefetch.submit(next.text());

            self.set_state(LoopState::Swapping);
            if !session.playback.wait(stop).await {
                return Ok(session.stopped());
            }
            current = next;
            self.emit(ReaderEvent::PageChanged {
                text: current.text().to_owned(),
            });

            if stop.is_cancelled() {
                return Ok(session.stopped());
            }
        }
    }

    // ── States ─────────────────────────────────────────────────────

    /// Read pages until one has text. `Ok(None)` means stopped.
    async fn capture_until_page(
        &self,
        stop: &CancellationToken,
    ) -> Result<Option<Page>, ReaderError> {
        loop {
            let backoff = match until_stopped(stop, self.pipeline.read_page()).await {
                None => return Ok(None),
                Some(Ok(Some(page))) => return Ok(Some(page)),
                Some(Ok(None)) => {
                    self.report(StatusKind::NoText, "No text on the page yet");
                    self.settings.blank_backoff()
                }
                Some(Err(e)) => {
                    if let Some(target) = e.gone_target() {
                        return Err(ReaderError::TargetUnavailable(target.clone()));
                    }
                    self.report(StatusKind::CaptureFailed, &e.to_string());
                    self.settings.retry_backoff()
                }
            };
            if !sleep_or_stop(stop, backoff).await {
                return Ok(None);
            }
        }
    }

    /// Start playback of `page`. Returns its duration, or `None` if stopped.
    async fn speak(
        &self,
        page: &Page,
        session: &mut Session,
        stop: &CancellationToken,
    ) -> Option<Duration> {
        let mut held: Option<AudioClip> = None;
        loop {
            let clip = match held.take() {
                Some(clip) => clip,
                None => match self.obtain_clip(page.text(), session, stop).await {
                    ClipResult::Clip(clip) => clip,
                    ClipResult::Stopped => return None,
                    ClipResult::Failed(e) => {
                        self.report(StatusKind::SynthesisFailed, &e.to_string());
                        if !sleep_or_stop(stop, self.settings.retry_backoff()).await {
                            return None;
                        }
                        continue;
                    }
                },
            };

            if stop.is_cancelled() {
                return None;
            }

            match session.playback.play(&clip).await {
                Ok(_) => {
                    session.pages_read += 1;
                    self.emit(ReaderEvent::DurationEstimated {
                        duration: clip.duration(),
                    });
                    return Some(clip.duration());
                }
                Err(e) => {
                    self.report(StatusKind::PlaybackFailed, &e.to_string());
                    held = Some(clip);
                    if !sleep_or_stop(stop, self.settings.retry_backoff()).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Prefetched clip if one matches, else the running prefetch, else
    /// synchronous synthesis.
    async fn obtain_clip(
        &self,
        text: &str,
        session: &mut Session,
        stop: &CancellationToken,
    ) -> ClipResult {
        if let Some(clip) = session.prefetch.consume_if_matches(text) {
            tracing::debug!("Using prefetched audio");
            return ClipResult::Clip(clip);
        }

        match session.prefetch.wait_pending(text, stop).await {
            PendingWait::Ready(clip) => {
                tracing::debug!("Using prefetched audio after waiting");
                return ClipResult::Clip(clip);
            }
            PendingWait::Failed(e) => {
                self.report(StatusKind::PrefetchFailed, &e.to_string());
            }
            PendingWait::Stopped => return ClipResult::Stopped,
            PendingWait::NotPending => {}
        }

        let speech = Arc::clone(self.ctx.speech());
        let timeout = self.settings.synthesis_timeout();
        let synth = tokio::time::timeout(timeout, speech.synthesize(text));
        match until_stopped(stop, synth).await {
            None => ClipResult::Stopped,
            Some(Ok(Ok(clip))) => ClipResult::Clip(clip),
            Some(Ok(Err(e))) => ClipResult::Failed(e),
            Some(Err(_elapsed)) => ClipResult::Failed(SpeechError::Timeout(timeout)),
        }
    }

    /// Advance the target and let it settle. `Ok(false)` means stopped.
    async fn turn_page(&self, stop: &CancellationToken) -> Result<bool, ReaderError> {
        let lifecycle = Arc::clone(self.ctx.lifecycle());
        loop {
            match until_stopped(stop, lifecycle.advance_page(self.ctx.target())).await {
                None => return Ok(false),
                Some(Ok(())) => break,
                Some(Err(TargetError::Gone(target))) => {
                    return Err(ReaderError::TargetUnavailable(target));
                }
                Some(Err(e)) => {
                    self.report(StatusKind::AdvanceFailed, &e.to_string());
                    if !sleep_or_stop(stop, self.settings.retry_backoff()).await {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(sleep_or_stop(stop, self.settings.settle_interval()).await)
    }

    // ── Events ─────────────────────────────────────────────────────

    fn set_state(&mut self, new_state: LoopState) {
        if self.state != new_state {
            tracing::debug!(old = %self.state, new = %new_state, "Reader state transition");
            let from = self.state;
            self.state = new_state;
            self.emit(ReaderEvent::StateChanged { from, to: new_state });
        }
    }

    fn report(&self, kind: StatusKind, message: &str) {
        tracing::warn!(?kind, state = %self.state, "{message}");
        self.emit(ReaderEvent::Status {
            kind,
            message: message.to_owned(),
        });
    }

    fn emit(&self, event: ReaderEvent) {
        self.ctx.observer().notify(event);
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Run `fut` unless `stop` fires first.
async fn until_stopped<F: Future>(stop: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = stop.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Sleep for `duration`. Returns `false` if `stop` fired first.
async fn sleep_or_stop(stop: &CancellationToken, duration: Duration) -> bool {
    until_stopped(stop, tokio::time::sleep(duration)).await.is_some()
}
