//! Domain types shared by the reader, its adapters and the CLI.

mod audio;
mod capture;
mod page;
mod state;

pub use audio::AudioClip;
pub use capture::{CropInsets, CropRegion, RasterImage, TargetHandle};
pub use page::{Page, normalize_text};
pub use state::{LoopState, ReadOutcome};
