//! `pageturner peek`: capture and recognize the current page once.
//!
//! Useful for tuning crop insets and OCR flags before a reading session.

use std::path::Path;

use anyhow::{Context, Result};
use pageturner_core::{CaptureProvider, Page, TextExtractor};

use crate::bootstrap;
use crate::commands::PeekArgs;

/// Execute the peek command.
///
/// Prints the normalized page text, or a notice when the page is blank.
pub async fn execute(settings_file: Option<&Path>, args: &PeekArgs) -> Result<()> {
    let settings = bootstrap::load_settings(settings_file, &args.settings_update())?;
    let screen = bootstrap::build_screen(&args.screen)?;
    let (target, label) = bootstrap::resolve_target(&args.target).await?;
    let crop = settings.effective_crop();

    tracing::debug!(window = %label, ?crop, "Peeking");
    let image = screen
        .capture
        .capture(&target, &crop)
        .await
        .with_context(|| format!("capturing {label}"))?;
    let Some(image) = image else {
        println!("(blank capture: nothing left inside the crop insets)");
        return Ok(());
    };

    let text = screen
        .extractor
        .extract(&image)
        .await
        .context("recognizing text")?;
    match text.as_deref().and_then(Page::from_extracted) {
        Some(page) => println!("{}", page.text()),
        None => println!("(no text recognized)"),
    }
    Ok(())
}
