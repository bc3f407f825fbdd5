//! Screen capture and text extraction ports.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CropInsets, RasterImage, TargetHandle};

/// Errors from a capture provider.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The target window no longer exists.
    #[error("Capture target {0} is gone")]
    TargetGone(TargetHandle),

    /// The capture did not finish in time.
    #[error("Capture timed out")]
    Timeout,

    /// Any other capture failure.
    #[error("Capture failed: {0}")]
    Failed(String),
}

/// Errors from a text extractor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The OCR engine did not answer in time.
    #[error("Text extraction timed out")]
    Timeout,

    /// Any other OCR failure.
    #[error("Text extraction failed: {0}")]
    Failed(String),
}

/// Grabs the visible contents of a target window.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Capture `target`, trimmed by `crop`.
    ///
    /// `Ok(None)` means the capture produced nothing usable (blank or fully
    /// cropped away). That is not an error.
    async fn capture(
        &self,
        target: &TargetHandle,
        crop: &CropInsets,
    ) -> Result<Option<RasterImage>, CaptureError>;
}

/// Turns an image into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// `Ok(None)` means no text was recognized.
    async fn extract(&self, image: &RasterImage) -> Result<Option<String>, ExtractionError>;
}
