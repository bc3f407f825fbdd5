//! Page domain type and text normalization.
//!
//! A [`Page`] is the normalized text of one capture cycle. Its fingerprint is
//! the normalized text itself, so two captures of the same on-screen content
//! compare equal even when the OCR engine emits different whitespace or quote
//! glyphs.

use serde::{Deserialize, Serialize};

/// One on-screen text capture, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    text: String,
}

impl Page {
    /// Build a page from raw extracted text.
    ///
    /// Returns `None` when nothing readable is left after normalization.
    pub fn from_extracted(raw: &str) -> Option<Self> {
        let text = normalize_text(raw);
        if text.is_empty() {
            return None;
        }
        Some(Self { text })
    }

    /// The normalized text to be spoken.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identity used for end-of-content detection.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.text
    }

    /// Whether this page shows the same content as `other`.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.fingerprint() == other.fingerprint()
    }

    /// Consume the page, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Normalize OCR output for speech and comparison.
///
/// - typographic double and single quotes become ASCII quotes
/// - words hyphenated across a line break (`exam-\nple`) are rejoined
/// - runs of whitespace collapse to a single space, ends are trimmed
pub fn normalize_text(raw: &str) -> String {
    let quoted: String = raw
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect();

    let joined = rejoin_hyphenated(&quoted);
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a hyphen that ends a line, along with the line break, when it
/// splits a word.
///
/// Only joins when a letter precedes the hyphen and a lowercase letter
/// starts the next line, so dashes used as punctuation survive. A hyphen
/// followed by a plain space (`pre- and post-war`) is never touched.
fn rejoin_hyphenated(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '-' && i > 0 && chars[i - 1].is_alphabetic() {
            if let Some(next) = line_break_continuation(&chars, i + 1) {
                if chars[next].is_lowercase() {
                    i = next;
                    continue;
                }
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Index of the first character after `start` when what lies between is
/// blank and contains a newline.
fn line_break_continuation(chars: &[char], start: usize) -> Option<usize> {
    let mut saw_newline = false;
    let mut j = start;
    while let Some(&c) = chars.get(j) {
        if c == '\n' {
            saw_newline = true;
        } else if !c.is_whitespace() {
            break;
        }
        j += 1;
    }
    (saw_newline && j < chars.len()).then_some(j)
}
