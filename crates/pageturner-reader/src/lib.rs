//! Pipelined reading loop for pageturner.
//!
//! The loop overlaps capture, recognition and synthesis of the next page with
//! playback of the current one. Collaborators are injected through a
//! [`ReaderContext`]; the crate never talks to a screen, OCR engine or audio
//! device directly.

pub mod capture;
pub mod context;
pub mod error;
pub mod observer;
pub mod playback;
pub mod prefetch;
pub mod reading_loop;

pub use capture::CapturePipeline;
pub use context::ReaderContext;
pub use error::{PageReadError, ReaderError};
pub use observer::ChannelObserver;
pub use playback::PlaybackController;
pub use prefetch::{PendingWait, PrefetchSlot};
pub use reading_loop::ReadingLoop;
