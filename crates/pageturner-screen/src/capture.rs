//! Window capture through a screenshot command that writes PNG to stdout.

use std::time::Duration;

use async_trait::async_trait;
use image::imageops;
use pageturner_core::{CaptureError, CaptureProvider, CropInsets, RasterImage, TargetHandle};

use crate::command::{CommandError, CommandSpec};

/// ImageMagick's `import` grabbing one X11 window.
pub const DEFAULT_CAPTURE_COMMAND: &str = "import -window {window} png:-";

/// Default limit for one screenshot.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Captures a window by running a screenshot command.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    command: CommandSpec,
    timeout: Duration,
}

impl CommandCapture {
    pub const fn new(command: CommandSpec, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    #[must_use]
    pub const fn command(&self) -> &CommandSpec {
        &self.command
    }
}

impl Default for CommandCapture {
    fn default() -> Self {
        Self::new(
            CommandSpec::new("import", ["-window", "{window}", "png:-"]),
            DEFAULT_CAPTURE_TIMEOUT,
        )
    }
}

#[async_trait]
impl CaptureProvider for CommandCapture {
    async fn capture(
        &self,
        target: &TargetHandle,
        crop: &CropInsets,
    ) -> Result<Option<RasterImage>, CaptureError> {
        let png = self
            .command
            .for_target(target)
            .run_checked(None, self.timeout)
            .await
            .map_err(|e| match e {
                CommandError::Timeout { .. } => CaptureError::Timeout,
                other => CaptureError::Failed(other.to_string()),
            })?;

        let crop = *crop;
        tokio::task::spawn_blocking(move || decode_and_crop(&png, &crop))
            .await
            .map_err(|e| CaptureError::Failed(format!("decode task failed: {e}")))?
    }
}

/// Decode an encoded screenshot and trim it by `crop`.
///
/// `Ok(None)` when the insets consume the image or what is left is a single
/// flat color.
pub fn decode_and_crop(
    bytes: &[u8],
    crop: &CropInsets,
) -> Result<Option<RasterImage>, CaptureError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let full = image::load_from_memory(bytes)
        .map_err(|e| CaptureError::Failed(format!("invalid screenshot: {e}")))?
        .to_rgba8();

    let Some(region) = crop.region(full.width(), full.height()) else {
        tracing::debug!(
            width = full.width(),
            height = full.height(),
            "Crop insets cover the whole capture"
        );
        return Ok(None);
    };

    let cropped =
        imageops::crop_imm(&full, region.x, region.y, region.width, region.height).to_image();
    let raster = RasterImage::from_rgba(cropped.width(), cropped.height(), cropped.into_raw())
        .ok_or_else(|| CaptureError::Failed("cropped buffer size mismatch".to_string()))?;

    if raster.is_uniform() {
        tracing::debug!("Capture is a single flat color");
        return Ok(None);
    }
    Ok(Some(raster))
}
