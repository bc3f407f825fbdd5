//! Scripted collaborators for reading loop tests.
//!
//! All mocks run on tokio's clock, so tests use `start_paused = true` and
//! assert on exact virtual timestamps.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pageturner_core::{
    AudioClip, CaptureError, CaptureProvider, CropInsets, ExtractionError, LoopState,
    PlaybackCompletion, PlaybackHandle, RasterImage, ReaderEvent, ReaderSettings, SpeechError,
    SpeechProvider, StatusKind, TargetError, TargetHandle, TargetLifecycle, TextExtractor,
    VoiceParameters,
};
use pageturner_reader::{ChannelObserver, ReaderContext, ReadingLoop};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

// ── Mock backends ──────────────────────────────────────────────────

/// Returns `blanks` blank captures, then a one-pixel image forever.
pub struct ScriptedCapture {
    blanks_left: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedCapture {
    pub fn new(blanks: usize) -> Arc<Self> {
        Arc::new(Self {
            blanks_left: AtomicUsize::new(blanks),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureProvider for ScriptedCapture {
    async fn capture(
        &self,
        _target: &TargetHandle,
        _crop: &CropInsets,
    ) -> Result<Option<RasterImage>, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .blanks_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(None);
        }
        Ok(RasterImage::from_rgba(1, 1, vec![0, 0, 0, 255]))
    }
}

/// Returns scripted page texts in order, then repeats the last one, the way
/// a reader app keeps showing its final page.
pub struct ScriptedExtractor {
    pages: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    delays: HashMap<usize, Duration>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: Mutex::new(pages.iter().map(|p| (*p).to_string()).collect()),
            last: Mutex::new(None),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the `call`-th extraction (0-based) take `delay`.
    pub fn with_delay(mut self, call: usize, delay: Duration) -> Self {
        self.delays.insert(call, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for ScriptedExtractor {
    async fn extract(&self, _image: &RasterImage) -> Result<Option<String>, ExtractionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&call) {
            tokio::time::sleep(*delay).await;
        }
        let next = self.pages.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(text) = next {
            *last = Some(text);
        }
        Ok(last.clone())
    }
}

/// Records page advances; can fail or disappear on cue.
pub struct MockTarget {
    valid: AtomicBool,
    gone_after_advances: Option<usize>,
    advance_failures: AtomicUsize,
    advances: Mutex<Vec<Instant>>,
}

impl MockTarget {
    pub fn new() -> Self {
        Self {
            valid: AtomicBool::new(true),
            gone_after_advances: None,
            advance_failures: AtomicUsize::new(0),
            advances: Mutex::new(Vec::new()),
        }
    }

    pub fn invalid() -> Self {
        let target = Self::new();
        target.valid.store(false, Ordering::SeqCst);
        target
    }

    pub fn gone_after(mut self, advances: usize) -> Self {
        self.gone_after_advances = Some(advances);
        self
    }

    pub fn failing_advances(self, count: usize) -> Self {
        self.advance_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn advances(&self) -> Vec<Instant> {
        self.advances.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetLifecycle for MockTarget {
    async fn is_valid(&self, _target: &TargetHandle) -> bool {
        let advanced = self.advances.lock().unwrap().len();
        self.valid.load(Ordering::SeqCst) && self.gone_after_advances.is_none_or(|n| advanced < n)
    }

    async fn advance_page(&self, _target: &TargetHandle) -> Result<(), TargetError> {
        if self
            .advance_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TargetError::AdvanceFailed("key event rejected".into()));
        }
        self.advances.lock().unwrap().push(Instant::now());
        Ok(())
    }
}

/// One playback as seen by the output.
#[derive(Debug, Clone)]
pub struct PlayRecord {
    pub id: u64,
    pub text: String,
    pub started: Instant,
    pub ended: Option<Instant>,
    pub cancelled: bool,
}

/// Speech provider whose clips last exactly as long as configured and whose
/// playback runs on tokio timers.
pub struct MockSpeech {
    durations: HashMap<String, Duration>,
    default_duration: Duration,
    latency: Duration,
    latencies: HashMap<String, Duration>,
    fail_init: bool,
    failures: Mutex<HashMap<String, usize>>,
    synth_log: Mutex<Vec<(String, Instant)>>,
    synth_done: Mutex<Vec<(String, Instant)>>,
    plays: Arc<Mutex<Vec<PlayRecord>>>,
    live: Arc<Mutex<HashMap<u64, PlaybackCompletion>>>,
    next_id: AtomicU64,
    initialized: AtomicBool,
    cleaned_up: AtomicBool,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self {
            durations: HashMap::new(),
            default_duration: Duration::from_secs(1),
            latency: Duration::ZERO,
            latencies: HashMap::new(),
            fail_init: false,
            failures: Mutex::new(HashMap::new()),
            synth_log: Mutex::new(Vec::new()),
            synth_done: Mutex::new(Vec::new()),
            plays: Arc::new(Mutex::new(Vec::new())),
            live: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            cleaned_up: AtomicBool::new(false),
        }
    }

    pub fn with_duration(mut self, text: &str, secs: f64) -> Self {
        self.durations
            .insert(text.to_string(), Duration::from_secs_f64(secs));
        self
    }

    pub fn with_default_duration(mut self, secs: f64) -> Self {
        self.default_duration = Duration::from_secs_f64(secs);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every synthesis of `text` take `latency`.
    pub fn with_latency_for(mut self, text: &str, latency: Duration) -> Self {
        self.latencies.insert(text.to_string(), latency);
        self
    }

    /// Fail the first `times` syntheses of `text`.
    pub fn failing(self, text: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(text.to_string(), times);
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn synth_calls(&self) -> Vec<(String, Instant)> {
        self.synth_log.lock().unwrap().clone()
    }

    /// Syntheses that ran to the end, with their finish time.
    pub fn synth_completions(&self) -> Vec<(String, Instant)> {
        self.synth_done.lock().unwrap().clone()
    }

    pub fn synth_count(&self, text: &str) -> usize {
        self.synth_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == text)
            .count()
    }

    pub fn plays(&self) -> Vec<PlayRecord> {
        self.plays.lock().unwrap().clone()
    }

    pub fn cleaned_up(&self) -> bool {
        self.cleaned_up.load(Ordering::SeqCst)
    }

    fn clip_for(&self, text: &str) -> AudioClip {
        let duration = self
            .durations
            .get(text)
            .copied()
            .unwrap_or(self.default_duration);
        // 1 kHz mono keeps durations exact to the millisecond.
        let samples = usize::try_from(duration.as_millis()).unwrap();
        AudioClip::from_samples(text, vec![0.0; samples], 1000, 1)
    }

    fn finish(
        plays: &Mutex<Vec<PlayRecord>>,
        live: &Mutex<HashMap<u64, PlaybackCompletion>>,
        id: u64,
        cancelled: bool,
    ) -> bool {
        let Some(completion) = live.lock().unwrap().remove(&id) else {
            return false;
        };
        if let Some(record) = plays.lock().unwrap().iter_mut().find(|r| r.id == id) {
            record.ended = Some(Instant::now());
            record.cancelled = cancelled;
        }
        completion.complete();
        true
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    async fn initialize(&self, _voice: &VoiceParameters) -> Result<(), SpeechError> {
        if self.fail_init {
            return Err(SpeechError::Unavailable("server not reachable".into()));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn synthesize(&self, text: &str) -> Result<AudioClip, SpeechError> {
        self.synth_log
            .lock()
            .unwrap()
            .push((text.to_string(), Instant::now()));
        let latency = self.latencies.get(text).copied().unwrap_or(self.latency);
        tokio::time::sleep(latency).await;
        self.synth_done
            .lock()
            .unwrap()
            .push((text.to_string(), Instant::now()));

        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(text) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    true
                }
                _ => false,
            }
        };
        if should_fail {
            return Err(SpeechError::Synthesis("engine returned no audio".into()));
        }
        Ok(self.clip_for(text))
    }

    async fn play_non_blocking(&self, clip: &AudioClip) -> Result<PlaybackHandle, SpeechError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(SpeechError::NotInitialized);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (handle, completion) = PlaybackHandle::pair(id);

        self.plays.lock().unwrap().push(PlayRecord {
            id,
            text: clip.source_text().to_string(),
            started: Instant::now(),
            ended: None,
            cancelled: false,
        });
        self.live.lock().unwrap().insert(id, completion);

        let plays = Arc::clone(&self.plays);
        let live = Arc::clone(&self.live);
        let duration = clip.duration();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            MockSpeech::finish(&plays, &live, id, false);
        });
        Ok(handle)
    }

    async fn cancel(&self, handle: &PlaybackHandle) {
        MockSpeech::finish(&self.plays, &self.live, handle.id(), true);
    }

    async fn cleanup(&self) {
        self.cleaned_up.store(true, Ordering::SeqCst);
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Collaborators of one test session.
pub struct Rig {
    pub capture: Arc<ScriptedCapture>,
    pub extractor: Arc<ScriptedExtractor>,
    pub speech: Arc<MockSpeech>,
    pub target: Arc<MockTarget>,
}

impl Rig {
    pub fn new(
        capture: Arc<ScriptedCapture>,
        extractor: ScriptedExtractor,
        speech: MockSpeech,
        target: MockTarget,
    ) -> Self {
        Self {
            capture,
            extractor: Arc::new(extractor),
            speech: Arc::new(speech),
            target: Arc::new(target),
        }
    }

    /// Build a reading loop wired to this rig and an event receiver.
    pub fn reader(
        &self,
        settings: ReaderSettings,
    ) -> (ReadingLoop, UnboundedReceiver<ReaderEvent>) {
        let (observer, events) = ChannelObserver::new();
        let ctx = ReaderContext::new(
            TargetHandle::new("0x0280000a"),
            self.capture.clone(),
            self.extractor.clone(),
            self.speech.clone(),
            self.target.clone(),
        )
        .with_observer(Arc::new(observer));
        (ReadingLoop::new(ctx, settings), events)
    }
}

/// Defaults with the advance ratio set.
pub fn settings(ratio: f64) -> ReaderSettings {
    ReaderSettings {
        advance_ratio: Some(ratio),
        ..ReaderSettings::with_defaults()
    }
}

/// Drain all pending events from the event receiver and return them.
pub fn drain_events(rx: &mut UnboundedReceiver<ReaderEvent>) -> Vec<ReaderEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// Target states of every transition, in order.
pub fn states_from(events: &[ReaderEvent]) -> Vec<LoopState> {
    events
        .iter()
        .filter_map(|e| match e {
            ReaderEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

/// Status kinds reported, in order.
pub fn statuses_from(events: &[ReaderEvent]) -> Vec<StatusKind> {
    events
        .iter()
        .filter_map(|e| match e {
            ReaderEvent::Status { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

/// Assert two instants are within a couple of timer ticks.
pub fn assert_near(actual: Duration, expected: Duration) {
    let diff = actual.abs_diff(expected);
    assert!(
        diff <= Duration::from_millis(5),
        "expected ~{expected:?}, got {actual:?}"
    );
}
