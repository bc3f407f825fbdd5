//! Window discovery: list top-level windows and resolve one by title.

use std::time::Duration;

use pageturner_core::TargetHandle;
use serde::Serialize;

use crate::command::{CommandError, CommandSpec};

/// Characters of the query compared in the prefix fallback.
pub const TITLE_PREFIX_CHARS: usize = 20;

/// One top-level window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    /// Window manager id, e.g. `0x03a00003`.
    pub id: String,
    pub title: String,
}

impl WindowInfo {
    #[must_use]
    pub fn handle(&self) -> TargetHandle {
        TargetHandle::new(self.id.clone())
    }
}

/// Default window listing: `wmctrl -l`.
#[must_use]
pub fn default_list_command() -> CommandSpec {
    CommandSpec::new("wmctrl", ["-l"])
}

/// Run `command` and parse its `wmctrl -l` style output.
///
/// Windows without a title are skipped.
pub async fn list_windows(
    command: &CommandSpec,
    timeout: Duration,
) -> Result<Vec<WindowInfo>, CommandError> {
    let stdout = command.run_checked(None, timeout).await?;
    Ok(parse_wmctrl(&String::from_utf8_lossy(&stdout)))
}

/// Parse `wmctrl -l` lines: `<id> <desktop> <host> <title...>`.
#[must_use]
pub fn parse_wmctrl(output: &str) -> Vec<WindowInfo> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<WindowInfo> {
    let mut rest = line.trim();
    let mut fields = [""; 3];
    for field in &mut fields {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some(WindowInfo {
        id: fields[0].to_string(),
        title: title.to_string(),
    })
}

/// Resolve `query` against `windows`.
///
/// A case-insensitive substring match wins (first one listed). Otherwise the
/// first [`TITLE_PREFIX_CHARS`] characters of the query are compared with
/// each title's start, and a match counts only if it is unique.
#[must_use]
pub fn find_window<'a>(windows: &'a [WindowInfo], query: &str) -> Option<&'a WindowInfo> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    if let Some(found) = windows
        .iter()
        .find(|w| w.title.to_lowercase().contains(&query))
    {
        return Some(found);
    }

    let prefix: String = query.chars().take(TITLE_PREFIX_CHARS).collect();
    let mut matches = windows
        .iter()
        .filter(|w| w.title.to_lowercase().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
