//! Terminal formatting for reader events and window lists.

use pageturner_core::{ReaderEvent, StatusKind};
use pageturner_screen::WindowInfo;

/// Characters of page text shown in progress lines.
const PREVIEW_CHARS: usize = 60;

/// Truncate a string to `max_len` characters, ending in "..." when cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

const fn status_label(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::NoText => "no text",
        StatusKind::CaptureFailed => "capture failed",
        StatusKind::SynthesisFailed => "synthesis failed",
        StatusKind::PlaybackFailed => "playback failed",
        StatusKind::AdvanceFailed => "page turn failed",
        StatusKind::PrefetchFailed => "prefetch failed",
    }
}

/// One terminal line for an event, or `None` for events only worth a log.
pub fn describe_event(event: &ReaderEvent, page: usize) -> Option<String> {
    match event {
        ReaderEvent::PageChanged { text } => {
            let first_line = text.lines().next().unwrap_or_default();
            Some(format!(
                "Page {page}: {}",
                truncate_string(first_line, PREVIEW_CHARS)
            ))
        }
        ReaderEvent::DurationEstimated { duration } => {
            Some(format!("  {:.1}s of speech", duration.as_secs_f64()))
        }
        ReaderEvent::Status { kind, message } => {
            Some(format!("  [{}] {message}", status_label(*kind)))
        }
        ReaderEvent::StateChanged { .. } => None,
    }
}

/// Window list as aligned text.
pub fn format_windows(windows: &[WindowInfo]) -> String {
    let width = windows.iter().map(|w| w.id.len()).max().unwrap_or(2).max(2);
    let mut out = format!("{:<width$}  TITLE\n", "ID");
    for window in windows {
        out.push_str(&format!("{:<width$}  {}\n", window.id, window.title));
    }
    out
}
