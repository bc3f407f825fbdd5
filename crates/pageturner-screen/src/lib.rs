//! Screen adapters for pageturner.
//!
//! Implements the capture, text-extraction and target-lifecycle ports by
//! shelling out: a screenshot command that writes PNG, the `tesseract` CLI,
//! and key-press / liveness commands. Every command line accepts a
//! `{window}` placeholder for the target id.

pub mod capture;
pub mod command;
pub mod ocr;
pub mod target;
pub mod window;

pub use capture::{CommandCapture, DEFAULT_CAPTURE_COMMAND};
pub use command::{CommandError, CommandSpec, WINDOW_PLACEHOLDER};
pub use ocr::{TesseractConfig, TesseractExtractor};
pub use target::CommandTarget;
pub use window::{WindowInfo, find_window, list_windows, parse_wmctrl};
