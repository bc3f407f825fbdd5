//! Subcommands and their argument groups.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use pageturner_core::{CropInsets, ReaderSettingsUpdate};
use pageturner_speech::backend::alltalk::DEFAULT_ALLTALK_URL;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Read a window aloud until the text stops changing or Ctrl+C
    Read(ReadArgs),

    /// List windows that can be read
    Windows(WindowsArgs),

    /// Capture and recognize the current page once, then print the text
    Peek(PeekArgs),
}

/// Arguments for `pageturner read`.
#[derive(Args)]
pub struct ReadArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub screen: ScreenArgs,

    #[command(flatten)]
    pub speech: SpeechArgs,

    #[command(flatten)]
    pub reader: ReaderArgs,
}

impl ReadArgs {
    /// Settings given on the command line, as an update over file values.
    pub fn settings_update(&self) -> ReaderSettingsUpdate {
        ReaderSettingsUpdate {
            crop: self.screen.crop,
            advance_ratio: self.reader.advance_ratio,
            settle_ms: self.reader.settle_ms,
            retry_backoff_ms: self.reader.retry_backoff_ms,
            blank_backoff_ms: self.reader.blank_backoff_ms,
            synthesis_timeout_secs: self.reader.synthesis_timeout_secs,
            voice: self.speech.voice.clone(),
            speech_rate: self.speech.rate,
            volume: self.speech.volume,
        }
    }
}

/// Arguments for `pageturner windows`.
#[derive(Args)]
pub struct WindowsArgs {
    /// Only show windows whose title contains this text
    pub filter: Option<String>,

    /// Command that lists windows in `wmctrl -l` format
    #[arg(long, env = "PAGETURNER_LIST_COMMAND")]
    pub list_command: Option<String>,

    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `pageturner peek`.
#[derive(Args)]
pub struct PeekArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub screen: ScreenArgs,
}

impl PeekArgs {
    pub fn settings_update(&self) -> ReaderSettingsUpdate {
        ReaderSettingsUpdate {
            crop: self.screen.crop,
            ..ReaderSettingsUpdate::default()
        }
    }
}

/// Which window to read.
#[derive(Args)]
pub struct TargetArgs {
    /// Window title, or part of it
    #[arg(env = "PAGETURNER_WINDOW", conflicts_with = "window_id")]
    pub query: Option<String>,

    /// Window id as reported by the window manager (e.g. 0x03a00003)
    #[arg(long)]
    pub window_id: Option<String>,

    /// Command that lists windows in `wmctrl -l` format
    #[arg(long, env = "PAGETURNER_LIST_COMMAND")]
    pub list_command: Option<String>,
}

/// Capture, OCR and page-turn commands.
///
/// Command lines may contain `{window}`, replaced with the window id.
#[derive(Args)]
pub struct ScreenArgs {
    /// Pixels trimmed from the capture as LEFT,TOP,RIGHT,BOTTOM
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropInsets>,

    /// Screenshot command writing PNG to stdout
    #[arg(long, env = "PAGETURNER_CAPTURE_COMMAND")]
    pub capture_command: Option<String>,

    /// Command that turns the page
    #[arg(long, env = "PAGETURNER_ADVANCE_COMMAND")]
    pub advance_command: Option<String>,

    /// Command that succeeds while the window exists
    #[arg(long, env = "PAGETURNER_LIVENESS_COMMAND")]
    pub liveness_command: Option<String>,

    /// Tesseract binary
    #[arg(long, env = "PAGETURNER_TESSERACT", default_value = "tesseract")]
    pub tesseract: String,

    /// OCR language pack(s), e.g. "eng" or "eng+deu"
    #[arg(long, env = "PAGETURNER_OCR_LANG", default_value = "eng")]
    pub ocr_lang: String,

    /// Tesseract page segmentation mode
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=13))]
    pub psm: u8,
}

/// Speech engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// AllTalk HTTP server
    Alltalk,
    /// Local Kokoro model (requires the `sherpa` feature)
    Kokoro,
}

/// Speech engine and voice.
#[derive(Args)]
pub struct SpeechArgs {
    /// Speech engine
    #[arg(long, value_enum, env = "PAGETURNER_ENGINE", default_value = "alltalk")]
    pub engine: Engine,

    /// AllTalk server address
    #[arg(long, env = "ALLTALK_URL", default_value = DEFAULT_ALLTALK_URL)]
    pub server_url: String,

    /// Language code sent to AllTalk
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Directory holding the Kokoro model files
    #[arg(long, env = "PAGETURNER_KOKORO_DIR")]
    pub kokoro_dir: Option<PathBuf>,

    /// Voice name (AllTalk sample file or Kokoro voice)
    #[arg(long, env = "PAGETURNER_VOICE")]
    pub voice: Option<String>,

    /// Speaking rate multiplier (0.5-2.0)
    #[arg(long)]
    pub rate: Option<f32>,

    /// Output volume (1-100)
    #[arg(long)]
    pub volume: Option<u8>,

    /// Spell out contractions before synthesis
    #[arg(long)]
    pub expand_contractions: bool,
}

/// Pacing of the reading loop.
#[derive(Args)]
pub struct ReaderArgs {
    /// Fraction of playback after which the page is turned (0.05-0.95)
    #[arg(long)]
    pub advance_ratio: Option<f64>,

    /// Wait after turning before capturing, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Wait before retrying a failed cycle, in milliseconds
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,

    /// Wait before re-capturing a blank page, in milliseconds
    #[arg(long)]
    pub blank_backoff_ms: Option<u64>,

    /// Upper bound on one synthesis, in seconds
    #[arg(long)]
    pub synthesis_timeout_secs: Option<u64>,
}

/// Parse `LEFT,TOP,RIGHT,BOTTOM`.
fn parse_crop(value: &str) -> Result<CropInsets, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid inset: {e}"))?;
    match parts.as_slice() {
        &[left, top, right, bottom] => Ok(CropInsets::new(left, top, right, bottom)),
        _ => Err(format!(
            "expected 4 comma-separated values, got {}",
            parts.len()
        )),
    }
}
