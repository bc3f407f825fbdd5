//! Text preprocessing for speech engines.
//!
//! OCR output carries stray quotes, dash runs and symbols that neural TTS
//! engines either read aloud or choke on. [`clean_text`] normalizes those,
//! [`split_into_chunks`] cuts long pages at sentence boundaries, and
//! [`expand_contractions`] spells out contractions for engines that
//! mispronounce them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Default maximum characters per chunk sent to a server backend.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1800;

/// Punctuation kept by [`clean_text`] besides letters, digits and spaces.
const KEPT_PUNCTUATION: &str = ".,;:!?-'\"$\u{2018}\u{2019}\u{201C}\u{201D}\u{2026}\u{3001}\u{3002}\u{FF01}\u{FF0C}\u{FF1A}\u{FF1B}\u{FF1F}";

/// Full-width terminators that end a sentence without trailing space.
const CJK_TERMINATORS: [char; 4] = ['\u{3002}', '\u{FF01}', '\u{FF1A}', '\u{FF1F}'];

// ── Cleaning ───────────────────────────────────────────────────────

/// Normalize text for synthesis.
///
/// - spaced dashes (` - `, ` – `) become a plain space
/// - `%` is spoken as "percent"
/// - `. '` is tightened to `.'`
/// - apostrophes not attached to a word are dropped
/// - double quotes become single quotes
/// - symbols outside letters, digits and common punctuation are removed
/// - a dangling `- ` or `--` becomes a pause (`; `)
#[must_use]
pub fn clean_text(text: &str) -> String {
    let cleaned = text
        .replace(" - ", " ")
        .replace(" \u{2013} ", " ")
        .replace('%', " percent")
        .replace(". '", ".'");
    let cleaned = drop_detached_apostrophes(&cleaned).replace('"', "'");
    let cleaned: String = cleaned
        .chars()
        .filter(|&c| c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(c))
        .collect();
    cleaned.replace("- ", "; ").replace("--", "; ")
}

/// Remove runs of `'` that have no word character on either side.
fn drop_detached_apostrophes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\'' {
            result.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i] == '\'' {
            i += 1;
        }
        let before = start.checked_sub(1).map(|j| chars[j]);
        let after = chars.get(i).copied();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            result.extend(&chars[start..i]);
        }
    }
    result
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ── Chunking ───────────────────────────────────────────────────────

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentences are grouped greedily. A single sentence longer than the limit
/// is broken at word boundaries.
#[must_use]
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();

        if !current.is_empty() && current_len + 1 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if len > max_chars {
            chunks.extend(split_long_sentence(&sentence, max_chars));
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&sentence);
        current_len += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split text into sentences.
///
/// A sentence ends at `.` `!` `?` `:` or `]`, optionally followed by closing
/// quotes, when whitespace follows. Full-width terminators end a sentence
/// immediately.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);
        i += 1;

        if CJK_TERMINATORS.contains(&c) {
            push_trimmed(&mut sentences, &mut current);
            continue;
        }
        if matches!(c, '.' | '!' | '?' | ':' | ']') {
            while i < chars.len() && is_closing_quote(chars[i]) {
                current.push(chars[i]);
                i += 1;
            }
            if chars.get(i).is_some_and(|n| n.is_whitespace()) {
                push_trimmed(&mut sentences, &mut current);
            }
        }
    }
    push_trimmed(&mut sentences, &mut current);
    sentences
}

const fn is_closing_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '\u{2019}' | '\u{201D}')
}

fn push_trimmed(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Break an over-long sentence at word boundaries.
fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in sentence.split_whitespace() {
        let len = word.chars().count();
        if !current.is_empty() && current_len + 1 + len > max_chars {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += len;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

// ── Contractions ───────────────────────────────────────────────────

const CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "am not"),
    ("aren't", "are not"),
    ("can't've", "cannot have"),
    ("can't", "cannot"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'll", "he will"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how'll", "how will"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'll", "i will"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it would"),
    ("it'll", "it will"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("shouldn't", "should not"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wasn't", "was not"),
    ("we'd", "we would"),
    ("we'll", "we will"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what's", "what is"),
    ("won't", "will not"),
    ("wouldn't", "would not"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
];

static KNOWN_CONTRACTION: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = CONTRACTIONS
        .iter()
        .map(|(from, _)| regex::escape(from))
        .collect();
    Regex::new(&format!(r"(?i)\b({})\b", alternatives.join("|")))
        .unwrap_or_else(|e| unreachable!("contraction table is a valid pattern: {e}"))
});

/// Generic suffix rules applied after the known table, in order.
static SUFFIX_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(\w+)'s\b", "$1 is"),
        (r"(\w+)'re\b", "$1 are"),
        (r"(\w+)'ve\b", "$1 have"),
        (r"(\w+)'ll\b", "$1 will"),
        (r"(\w+)'d\b", "$1 would"),
        (r"(\w+)n't\b", "$1 not"),
        (r"(\w+)'m\b", "$1 am"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let re = Regex::new(pattern)
            .unwrap_or_else(|e| unreachable!("suffix rule {pattern} is valid: {e}"));
        (re, replacement)
    })
    .collect()
});

/// Spell out English contractions (`can't` → `cannot`, `we're` → `we are`).
///
/// Possessive `'s` is read as "is"; engines that need this accept the
/// occasional wrong expansion over a garbled contraction.
#[must_use]
pub fn expand_contractions(text: &str) -> String {
    let expanded = KNOWN_CONTRACTION.replace_all(text, |caps: &Captures<'_>| {
        let matched = caps[0].to_lowercase();
        CONTRACTIONS
            .iter()
            .find(|(from, _)| *from == matched)
            .map_or_else(|| caps[0].to_string(), |(_, to)| (*to).to_string())
    });

    SUFFIX_RULES
        .iter()
        .fold(expanded.into_owned(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}
