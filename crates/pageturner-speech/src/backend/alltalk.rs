//! AllTalk TTS backend: synthesis on a local AllTalk HTTP server.
//!
//! Each chunk is generated with `POST /api/tts-generate`, which writes a WAV
//! on the server and answers with its URL; the WAV is then fetched and
//! decoded. Chunks of one page are concatenated into a single buffer.

use std::time::Duration;

use pageturner_core::SpeechError;
use serde::{Deserialize, Serialize};

use crate::backend::{TtsAudio, TtsBackend};
use crate::text_utils::{DEFAULT_MAX_CHUNK_CHARS, clean_text, split_into_chunks};
use crate::wav::decode_wav;

/// Default AllTalk server address.
pub const DEFAULT_ALLTALK_URL: &str = "http://127.0.0.1:7851";

/// Statuses AllTalk versions report for a successful generation.
const SUCCESS_STATUSES: [&str; 3] = ["success", "generate-success", "generate_success"];

/// Configuration for the AllTalk backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllTalkConfig {
    /// Server base URL without trailing slash.
    pub server_url: String,

    /// Voice sample file known to the server (e.g. `"female_06.wav"`).
    pub voice: String,

    /// Language code passed to the server.
    pub language: String,

    /// Maximum characters per generation request.
    pub max_chunk_chars: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AllTalkConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_ALLTALK_URL.to_string(),
            voice: "female_06.wav".to_string(),
            language: "en".to_string(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            request_timeout_secs: 60,
        }
    }
}

impl AllTalkConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url.trim_end_matches('/'))
    }
}

/// Body of a `/api/tts-generate` response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    output_file_url: Option<String>,
}

/// AllTalk HTTP backend.
pub struct AllTalkBackend {
    client: reqwest::Client,
    config: AllTalkConfig,
    /// Stored for logs; AllTalk's generate endpoint has no rate control.
    speed: f32,
}

impl AllTalkBackend {
    /// Create a backend for `config`. Does not contact the server.
    pub fn new(config: AllTalkConfig) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SpeechError::Unavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            speed: 1.0,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AllTalkConfig {
        &self.config
    }

    /// Generate one chunk and return the WAV bytes.
    async fn generate_chunk(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let form = [
            ("text_input", text),
            ("text_filtering", "standard"),
            ("character_voice_gen", self.config.voice.as_str()),
            ("language", self.config.language.as_str()),
            ("output_file_name", "pageturner"),
            ("output_file_timestamp", "true"),
            ("narrator_enabled", "false"),
            ("rvccharacter_voice_gen", "Disabled"),
            ("autoplay", "false"),
        ];

        let response = self
            .client
            .post(self.config.endpoint("/api/tts-generate"))
            .form(&form[..])
            .send()
            .await
            .map_err(|e| self.request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Synthesis(format!(
                "AllTalk returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("invalid AllTalk response: {e}")))?;

        let status = body.status.to_lowercase();
        if !SUCCESS_STATUSES.contains(&status.as_str()) {
            return Err(SpeechError::Synthesis(format!(
                "AllTalk generation failed with status '{}'",
                body.status
            )));
        }
        let Some(url) = body.output_file_url else {
            return Err(SpeechError::Synthesis(
                "AllTalk response has no output_file_url".to_string(),
            ));
        };

        let audio = self
            .client
            .get(self.config.endpoint(&url))
            .send()
            .await
            .map_err(|e| self.request_error(&e))?;
        if !audio.status().is_success() {
            return Err(SpeechError::Synthesis(format!(
                "AllTalk audio download returned {}",
                audio.status()
            )));
        }
        let bytes = audio
            .bytes()
            .await
            .map_err(|e| self.request_error(&e))?;
        Ok(bytes.to_vec())
    }

    fn request_error(&self, e: &reqwest::Error) -> SpeechError {
        if e.is_timeout() {
            SpeechError::Timeout(self.config.request_timeout())
        } else if e.is_connect() {
            SpeechError::Unavailable(format!("AllTalk at {}: {e}", self.config.server_url))
        } else {
            SpeechError::Synthesis(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl TtsBackend for AllTalkBackend {
    async fn synthesize(&self, text: &str) -> Result<TtsAudio, SpeechError> {
        let cleaned = clean_text(&text.replace(['\n', '\r'], " "));
        let chunks = split_into_chunks(&cleaned, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(SpeechError::Synthesis("nothing to speak".to_string()));
        }

        tracing::debug!(
            chunks = chunks.len(),
            chars = cleaned.len(),
            voice = %self.config.voice,
            speed = self.speed,
            "Synthesizing speech (AllTalk)"
        );

        let mut audio = TtsAudio::default();
        for (index, chunk) in chunks.iter().enumerate() {
            let wav = self.generate_chunk(chunk).await?;
            audio.append(decode_wav(&wav)?)?;
            tracing::debug!(chunk = index, "AllTalk chunk generated");
        }

        tracing::debug!(
            duration_ms = audio.duration().as_millis(),
            "Speech synthesized (AllTalk)"
        );
        Ok(audio)
    }

    fn set_voice(&mut self, voice_id: &str) {
        self.config.voice = voice_id.to_string();
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(0.5, 2.0);
    }

    fn voice(&self) -> &str {
        &self.config.voice
    }

    fn name(&self) -> &'static str {
        "alltalk"
    }

    async fn health_check(&self) -> Result<(), SpeechError> {
        let response = self
            .client
            .get(self.config.endpoint("/api/ready"))
            .send()
            .await
            .map_err(|e| {
                SpeechError::Unavailable(format!("AllTalk at {}: {e}", self.config.server_url))
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(SpeechError::Unavailable(format!(
                "AllTalk not ready: {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = AllTalkConfig {
            server_url: "http://localhost:7851/".to_string(),
            ..AllTalkConfig::default()
        };
        assert_eq!(
            config.endpoint("/api/ready"),
            "http://localhost:7851/api/ready"
        );
    }

    #[test]
    fn test_generate_response_tolerates_missing_fields() {
        let body: GenerateResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(body.status, "error");
        assert!(body.output_file_url.is_none());
    }

    #[test]
    fn test_set_speed_clamps() {
        let mut backend = AllTalkBackend::new(AllTalkConfig::default()).unwrap();
        backend.set_speed(5.0);
        assert!((backend.speed - 2.0).abs() < f32::EPSILON);
        backend.set_voice("male_01.wav");
        assert_eq!(backend.voice(), "male_01.wav");
    }
}
