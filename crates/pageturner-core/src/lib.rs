//! Core domain types, timing model and ports for pageturner.
//!
//! pageturner reads paginated on-screen text aloud: it captures a window,
//! recognizes the text, speaks it, and turns the page while the audio is
//! still playing. This crate holds everything the reading loop and its
//! adapters share; it has no process, image or audio dependencies.

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;
pub mod timing;

// Re-export commonly used types for convenience
pub use domain::{
    AudioClip, CropInsets, CropRegion, LoopState, Page, RasterImage, ReadOutcome, TargetHandle,
    normalize_text,
};
pub use events::{ReaderEvent, StatusKind};
pub use ports::{
    CaptureError, CaptureProvider, ExtractionError, NoopObserver, PlaybackCompletion,
    PlaybackHandle, ReaderObserver, SpeechError, SpeechProvider, TargetError, TargetLifecycle,
    TextExtractor, VoiceParameters,
};
pub use settings::{ReaderSettings, ReaderSettingsUpdate, SettingsError, validate_settings};
pub use timing::{DEFAULT_ADVANCE_RATIO, MIN_TURN_DELAY, TimingConfig, turn_delay};
