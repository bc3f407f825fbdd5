//! Text extraction with the Tesseract command line.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use pageturner_core::{ExtractionError, RasterImage, TextExtractor};
use tokio::sync::Mutex;

use crate::command::{CommandError, CommandSpec};

/// Default limit for one recognition.
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// Tesseract invocation settings.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Path or name of the `tesseract` binary.
    pub program: String,
    /// Language pack(s), e.g. `"eng"` or `"eng+deu"`.
    pub language: String,
    /// Page segmentation mode (`--psm`).
    pub page_segmentation: u8,
    pub timeout: Duration,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            program: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation: 3,
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

/// Runs `tesseract stdin stdout` on each image.
///
/// Recognitions are serialized: Tesseract is CPU-heavy and runs
/// multi-threaded on its own.
pub struct TesseractExtractor {
    command: CommandSpec,
    timeout: Duration,
    lock: Mutex<()>,
}

impl TesseractExtractor {
    pub fn new(config: &TesseractConfig) -> Self {
        let psm = config.page_segmentation.to_string();
        Self {
            command: CommandSpec::new(
                config.program.clone(),
                [
                    "stdin",
                    "stdout",
                    "-l",
                    config.language.as_str(),
                    "--psm",
                    psm.as_str(),
                ],
            ),
            timeout: config.timeout,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn command(&self) -> &CommandSpec {
        &self.command
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract(&self, image: &RasterImage) -> Result<Option<String>, ExtractionError> {
        let raster = image.clone();
        let png = tokio::task::spawn_blocking(move || encode_png(raster))
            .await
            .map_err(|e| ExtractionError::Failed(format!("encode task failed: {e}")))??;

        let _guard = self.lock.lock().await;
        let stdout = self
            .command
            .run_checked(Some(png), self.timeout)
            .await
            .map_err(|e| match e {
                CommandError::Timeout { .. } => ExtractionError::Timeout,
                other => ExtractionError::Failed(other.to_string()),
            })?;

        let text = String::from_utf8_lossy(&stdout).trim().to_string();
        tracing::debug!(chars = text.len(), "OCR finished");
        Ok((!text.is_empty()).then_some(text))
    }
}

/// Encode a raster as PNG for the OCR engine's stdin.
fn encode_png(raster: RasterImage) -> Result<Vec<u8>, ExtractionError> {
    let (width, height) = (raster.width(), raster.height());
    let image = RgbaImage::from_raw(width, height, raster.into_pixels())
        .ok_or_else(|| ExtractionError::Failed("raster size mismatch".to_string()))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ExtractionError::Failed(format!("PNG encode failed: {e}")))?;
    Ok(png)
}
