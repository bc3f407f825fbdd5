//! Per-session collaborator bundle.

use std::sync::Arc;

use pageturner_core::{
    CaptureProvider, NoopObserver, ReaderObserver, SpeechProvider, TargetHandle, TargetLifecycle,
    TextExtractor,
};

/// Everything a reading session talks to.
///
/// Built once per session by the composition root and handed to
/// [`ReadingLoop`](crate::ReadingLoop). Collaborators are shared trait
/// objects so the background prefetch task can hold the speech provider.
#[derive(Clone)]
pub struct ReaderContext {
    target: TargetHandle,
    capture: Arc<dyn CaptureProvider>,
    extractor: Arc<dyn TextExtractor>,
    speech: Arc<dyn SpeechProvider>,
    lifecycle: Arc<dyn TargetLifecycle>,
    observer: Arc<dyn ReaderObserver>,
}

impl ReaderContext {
    pub fn new(
        target: TargetHandle,
        capture: Arc<dyn CaptureProvider>,
        extractor: Arc<dyn TextExtractor>,
        speech: Arc<dyn SpeechProvider>,
        lifecycle: Arc<dyn TargetLifecycle>,
    ) -> Self {
        Self {
            target,
            capture,
            extractor,
            speech,
            lifecycle,
            observer: Arc::new(NoopObserver::new()),
        }
    }

    /// Attach an observer for state, page and status events.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ReaderObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub const fn target(&self) -> &TargetHandle {
        &self.target
    }

    #[must_use]
    pub fn capture(&self) -> &Arc<dyn CaptureProvider> {
        &self.capture
    }

    #[must_use]
    pub fn extractor(&self) -> &Arc<dyn TextExtractor> {
        &self.extractor
    }

    #[must_use]
    pub fn speech(&self) -> &Arc<dyn SpeechProvider> {
        &self.speech
    }

    #[must_use]
    pub fn lifecycle(&self) -> &Arc<dyn TargetLifecycle> {
        &self.lifecycle
    }

    #[must_use]
    pub fn observer(&self) -> &Arc<dyn ReaderObserver> {
        &self.observer
    }
}

impl std::fmt::Debug for ReaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderContext")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
