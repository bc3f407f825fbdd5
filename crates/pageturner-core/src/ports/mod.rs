//! Port definitions (trait abstractions) for the reader's collaborators.
//!
//! Ports define the interfaces the reading loop expects from the outside
//! world. They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process, image-library or audio-library types in any signature
//! - "Nothing there" is `Ok(None)`, never an error
//! - Every trait is `Send + Sync` so collaborators can be shared via `Arc`

pub mod capture;
pub mod observer;
pub mod speech;
pub mod target;

pub use capture::{CaptureError, CaptureProvider, ExtractionError, TextExtractor};
pub use observer::{NoopObserver, ReaderObserver};
pub use speech::{
    MAX_SPEECH_RATE, MIN_SPEECH_RATE, PlaybackCompletion, PlaybackHandle, SpeechError,
    SpeechProvider, VoiceParameters,
};
pub use target::{TargetError, TargetLifecycle};
