//! Capture pipeline: one "read the current page" operation.
//!
//! Wraps the liveness check, the capture provider and the text extractor.
//! The three outcomes stay distinct: `Ok(Some(page))`, `Ok(None)` for
//! "nothing on screen", and `Err` for a failure (fatal only when the target
//! is gone). Comparing against the previous page is left to the loop.

use std::sync::Arc;

use pageturner_core::{
    CaptureProvider, CropInsets, Page, TargetHandle, TargetLifecycle, TextExtractor,
};

use crate::context::ReaderContext;
use crate::error::PageReadError;

/// Reads and normalizes the page currently shown by the target.
pub struct CapturePipeline {
    target: TargetHandle,
    crop: CropInsets,
    capture: Arc<dyn CaptureProvider>,
    extractor: Arc<dyn TextExtractor>,
    lifecycle: Arc<dyn TargetLifecycle>,
}

impl CapturePipeline {
    pub fn new(ctx: &ReaderContext, crop: CropInsets) -> Self {
        Self {
            target: ctx.target().clone(),
            crop,
            capture: Arc::clone(ctx.capture()),
            extractor: Arc::clone(ctx.extractor()),
            lifecycle: Arc::clone(ctx.lifecycle()),
        }
    }

    #[must_use]
    pub const fn crop(&self) -> CropInsets {
        self.crop
    }

    /// Capture, recognize and normalize the current page.
    pub async fn read_page(&self) -> Result<Option<Page>, PageReadError> {
        if !self.lifecycle.is_valid(&self.target).await {
            return Err(PageReadError::TargetGone(self.target.clone()));
        }

        let Some(image) = self.capture.capture(&self.target, &self.crop).await? else {
            tracing::debug!(target_window = %self.target, "Capture was blank");
            return Ok(None);
        };

        let Some(raw) = self.extractor.extract(&image).await? else {
            tracing::debug!(target_window = %self.target, "No text recognized");
            return Ok(None);
        };

        let page = Page::from_extracted(&raw);
        if let Some(ref page) = page {
            tracing::debug!(chars = page.text().len(), "Page read");
        }
        Ok(page)
    }
}
