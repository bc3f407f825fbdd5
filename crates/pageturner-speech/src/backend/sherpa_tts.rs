//! Local Kokoro TTS through sherpa-onnx.
//!
//! `KokoroTts::create` takes `&mut self` while [`TtsBackend`] uses `&self`,
//! so the engine sits behind an `Arc<Mutex<…>>` and inference runs on the
//! blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use pageturner_core::SpeechError;
use sherpa_rs::tts::{KokoroTts, KokoroTtsConfig};

use crate::backend::{TtsAudio, TtsBackend};

/// Kokoro voices in the `kokoro-en-v0_19` model, indexed by speaker id.
const KOKORO_VOICES: [&str; 11] = [
    "af",
    "af_bella",
    "af_nicole",
    "af_sarah",
    "af_sky",
    "am_adam",
    "am_michael",
    "bf_emma",
    "bf_isabella",
    "bm_george",
    "bm_lewis",
];

/// Default Kokoro voice.
pub const DEFAULT_KOKORO_VOICE: &str = "af_sarah";

/// Kokoro backend running in-process.
pub struct SherpaTtsBackend {
    engine: Arc<Mutex<KokoroTts>>,
    voice_id: String,
    speaker_id: i32,
    speed: f32,
}

impl SherpaTtsBackend {
    /// Load the model from a directory holding `model.onnx`, `voices.bin`,
    /// `tokens.txt` and `espeak-ng-data/`.
    pub fn load(model_dir: &Path, voice: &str, speed: f32) -> Result<Self, SpeechError> {
        let model = model_dir.join("model.onnx");
        let voices = model_dir.join("voices.bin");
        let tokens = model_dir.join("tokens.txt");
        let data_dir = model_dir.join("espeak-ng-data");

        for path in [&model, &voices, &tokens] {
            if !path.exists() {
                return Err(SpeechError::Unavailable(format!(
                    "Kokoro model file missing: {}",
                    path.display()
                )));
            }
        }

        tracing::info!(
            dir = %model_dir.display(),
            voice,
            speed,
            "Loading Kokoro TTS model"
        );

        let engine = KokoroTts::new(KokoroTtsConfig {
            model: path_to_string(&model)?,
            voices: path_to_string(&voices)?,
            tokens: path_to_string(&tokens)?,
            data_dir: path_to_string(&data_dir)?,
            length_scale: 1.0,
            ..Default::default()
        });

        let (voice_id, speaker_id) = resolve_voice(voice)
            .unwrap_or_else(|| (DEFAULT_KOKORO_VOICE.to_string(), default_speaker()));

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            voice_id,
            speaker_id,
            speed: speed.clamp(0.5, 2.0),
        })
    }
}

#[async_trait::async_trait]
impl TtsBackend for SherpaTtsBackend {
    async fn synthesize(&self, text: &str) -> Result<TtsAudio, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::Synthesis("nothing to speak".to_string()));
        }

        tracing::debug!(
            text_len = text.len(),
            voice = %self.voice_id,
            "Synthesizing speech (Kokoro)"
        );

        let engine = Arc::clone(&self.engine);
        let sid = self.speaker_id;
        let speed = self.speed;
        let text = text.to_string();

        let audio = tokio::task::spawn_blocking(move || {
            let mut guard = engine
                .lock()
                .map_err(|e| SpeechError::Synthesis(format!("TTS engine lock poisoned: {e}")))?;
            guard
                .create(&text, sid, speed)
                .map_err(|e| SpeechError::Synthesis(e.to_string()))
        })
        .await
        .map_err(|e| SpeechError::Synthesis(format!("synthesis task failed: {e}")))??;

        Ok(TtsAudio {
            samples: audio.samples,
            sample_rate: audio.sample_rate,
            channels: 1,
        })
    }

    fn set_voice(&mut self, voice_id: &str) {
        if let Some((voice, sid)) = resolve_voice(voice_id) {
            self.voice_id = voice;
            self.speaker_id = sid;
        } else {
            tracing::warn!(voice = %voice_id, "Unknown Kokoro voice, keeping current");
        }
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(0.5, 2.0);
    }

    fn voice(&self) -> &str {
        &self.voice_id
    }

    fn name(&self) -> &'static str {
        "kokoro"
    }

    async fn health_check(&self) -> Result<(), SpeechError> {
        Ok(())
    }
}

fn resolve_voice(voice_id: &str) -> Option<(String, i32)> {
    KOKORO_VOICES
        .iter()
        .position(|v| *v == voice_id)
        .and_then(|i| i32::try_from(i).ok())
        .map(|sid| (voice_id.to_string(), sid))
}

fn default_speaker() -> i32 {
    resolve_voice(DEFAULT_KOKORO_VOICE).map_or(0, |(_, sid)| sid)
}

fn path_to_string(path: &Path) -> Result<String, SpeechError> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| SpeechError::Unavailable(format!("Invalid UTF-8 path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_voice() {
        assert_eq!(resolve_voice("af_sarah"), Some(("af_sarah".to_string(), 3)));
        assert_eq!(resolve_voice("bm_lewis").map(|(_, sid)| sid), Some(10));
        assert!(resolve_voice("nobody").is_none());
        assert_eq!(default_speaker(), 3);
    }
}
