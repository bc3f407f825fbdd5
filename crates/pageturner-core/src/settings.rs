//! Reader settings and validation.
//!
//! Pure domain types; the CLI layers file, environment and flag values on top
//! of [`ReaderSettings::with_defaults`] through [`ReaderSettingsUpdate`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::CropInsets;
use crate::ports::{MAX_SPEECH_RATE, MIN_SPEECH_RATE, VoiceParameters};
use crate::timing::{DEFAULT_ADVANCE_RATIO, MAX_ADVANCE_RATIO, MIN_ADVANCE_RATIO, TimingConfig};

/// Default wait after a page advance before capturing.
pub const DEFAULT_SETTLE_MS: u64 = 200;

/// Default wait before retrying after a failed cycle.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Default wait before re-capturing after a blank page.
pub const DEFAULT_BLANK_BACKOFF_MS: u64 = 500;

/// Smallest accepted retry or blank backoff.
pub const MIN_BACKOFF_MS: u64 = 50;

/// Default bound on one synthesis call.
pub const DEFAULT_SYNTHESIS_TIMEOUT_SECS: u64 = 120;

/// Reading session settings.
///
/// All fields are optional so partial files and updates merge cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderSettings {
    /// Pixels trimmed from each edge of the captured window.
    pub crop: Option<CropInsets>,

    /// Fraction of playback after which the page is turned (0.05–0.95).
    pub advance_ratio: Option<f64>,

    /// Wait after a page advance before capturing, in milliseconds.
    pub settle_ms: Option<u64>,

    /// Wait before retrying a failed cycle, in milliseconds.
    pub retry_backoff_ms: Option<u64>,

    /// Wait before re-capturing a blank page, in milliseconds.
    pub blank_backoff_ms: Option<u64>,

    /// Upper bound on one synthesis call, in seconds.
    pub synthesis_timeout_secs: Option<u64>,

    /// Backend voice identifier.
    pub voice: Option<String>,

    /// Speaking rate multiplier (0.5–2.0).
    pub speech_rate: Option<f32>,

    /// Output volume (1–100).
    pub volume: Option<u8>,
}

impl ReaderSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            crop: Some(CropInsets::new(75, 110, 20, 50)),
            advance_ratio: Some(DEFAULT_ADVANCE_RATIO),
            settle_ms: Some(DEFAULT_SETTLE_MS),
            retry_backoff_ms: Some(DEFAULT_RETRY_BACKOFF_MS),
            blank_backoff_ms: Some(DEFAULT_BLANK_BACKOFF_MS),
            synthesis_timeout_secs: Some(DEFAULT_SYNTHESIS_TIMEOUT_SECS),
            voice: None,
            speech_rate: Some(1.0),
            volume: Some(100),
        }
    }

    /// Load settings from a JSON file. Missing fields stay `None`.
    pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Effective crop (with default fallback).
    #[must_use]
    pub fn effective_crop(&self) -> CropInsets {
        self.crop.unwrap_or_default()
    }

    /// Timing configuration with the ratio clamped.
    #[must_use]
    pub fn timing(&self) -> TimingConfig {
        TimingConfig::new(self.advance_ratio.unwrap_or(DEFAULT_ADVANCE_RATIO))
    }

    #[must_use]
    pub const fn settle_interval(&self) -> Duration {
        Duration::from_millis(match self.settle_ms {
            Some(ms) => ms,
            None => DEFAULT_SETTLE_MS,
        })
    }

    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(match self.retry_backoff_ms {
            Some(ms) => ms,
            None => DEFAULT_RETRY_BACKOFF_MS,
        })
    }

    #[must_use]
    pub const fn blank_backoff(&self) -> Duration {
        Duration::from_millis(match self.blank_backoff_ms {
            Some(ms) => ms,
            None => DEFAULT_BLANK_BACKOFF_MS,
        })
    }

    #[must_use]
    pub const fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(match self.synthesis_timeout_secs {
            Some(secs) => secs,
            None => DEFAULT_SYNTHESIS_TIMEOUT_SECS,
        })
    }

    /// Voice parameters passed through to the speech provider.
    #[must_use]
    pub fn voice_parameters(&self) -> VoiceParameters {
        let defaults = VoiceParameters::default();
        VoiceParameters {
            voice: self.voice.clone(),
            rate: self.speech_rate.unwrap_or(defaults.rate),
            volume: self.volume.unwrap_or(defaults.volume),
        }
    }

    /// Merge an update into these settings, only touching fields that are `Some`.
    pub fn merge(&mut self, other: &ReaderSettingsUpdate) {
        if let Some(crop) = other.crop {
            self.crop = Some(crop);
        }
        if let Some(ratio) = other.advance_ratio {
            self.advance_ratio = Some(ratio);
        }
        if let Some(ms) = other.settle_ms {
            self.settle_ms = Some(ms);
        }
        if let Some(ms) = other.retry_backoff_ms {
            self.retry_backoff_ms = Some(ms);
        }
        if let Some(ms) = other.blank_backoff_ms {
            self.blank_backoff_ms = Some(ms);
        }
        if let Some(secs) = other.synthesis_timeout_secs {
            self.synthesis_timeout_secs = Some(secs);
        }
        if let Some(ref voice) = other.voice {
            self.voice = Some(voice.clone());
        }
        if let Some(rate) = other.speech_rate {
            self.speech_rate = Some(rate);
        }
        if let Some(volume) = other.volume {
            self.volume = Some(volume);
        }
    }

    /// Overlay every field that `other` sets.
    pub fn overlay(&mut self, other: &Self) {
        self.merge(&ReaderSettingsUpdate {
            crop: other.crop,
            advance_ratio: other.advance_ratio,
            settle_ms: other.settle_ms,
            retry_backoff_ms: other.retry_backoff_ms,
            blank_backoff_ms: other.blank_backoff_ms,
            synthesis_timeout_secs: other.synthesis_timeout_secs,
            voice: other.voice.clone(),
            speech_rate: other.speech_rate,
            volume: other.volume,
        });
    }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderSettingsUpdate {
    pub crop: Option<CropInsets>,
    pub advance_ratio: Option<f64>,
    pub settle_ms: Option<u64>,
    pub retry_backoff_ms: Option<u64>,
    pub blank_backoff_ms: Option<u64>,
    pub synthesis_timeout_secs: Option<u64>,
    pub voice: Option<String>,
    pub speech_rate: Option<f32>,
    pub volume: Option<u8>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Advance ratio must be between 0.05 and 0.95, got {0}")]
    InvalidAdvanceRatio(f64),

    #[error("Speech rate must be between 0.5 and 2.0, got {0}")]
    InvalidSpeechRate(f32),

    #[error("Volume must be between 1 and 100, got {0}")]
    InvalidVolume(u8),

    #[error("Settle interval must be at most 10000 ms, got {0}")]
    InvalidSettle(u64),

    #[error("{name} must be at least 50 ms, got {value}")]
    InvalidBackoff { name: &'static str, value: u64 },

    #[error("Synthesis timeout must be at least 1 second")]
    ZeroSynthesisTimeout,

    #[error("Voice name cannot be empty")]
    EmptyVoice,

    #[error("Failed to read settings file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse settings file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Validate settings values.
///
/// Out-of-range values are rejected here rather than silently clamped, so a
/// typo in a settings file is reported instead of ignored.
pub fn validate_settings(settings: &ReaderSettings) -> Result<(), SettingsError> {
    if let Some(ratio) = settings.advance_ratio {
        if !(MIN_ADVANCE_RATIO..=MAX_ADVANCE_RATIO).contains(&ratio) {
            return Err(SettingsError::InvalidAdvanceRatio(ratio));
        }
    }

    if let Some(rate) = settings.speech_rate {
        if !(MIN_SPEECH_RATE..=MAX_SPEECH_RATE).contains(&rate) {
            return Err(SettingsError::InvalidSpeechRate(rate));
        }
    }

    if let Some(volume) = settings.volume {
        if !(1..=100).contains(&volume) {
            return Err(SettingsError::InvalidVolume(volume));
        }
    }

    if let Some(settle) = settings.settle_ms {
        if settle > 10_000 {
            return Err(SettingsError::InvalidSettle(settle));
        }
    }

    for (name, backoff) in [
        ("Retry backoff", settings.retry_backoff_ms),
        ("Blank backoff", settings.blank_backoff_ms),
    ] {
        if let Some(value) = backoff.filter(|ms| *ms < MIN_BACKOFF_MS) {
            return Err(SettingsError::InvalidBackoff { name, value });
        }
    }

    if settings.synthesis_timeout_secs == Some(0) {
        return Err(SettingsError::ZeroSynthesisTimeout);
    }

    if settings
        .voice
        .as_ref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(SettingsError::EmptyVoice);
    }

    Ok(())
}
