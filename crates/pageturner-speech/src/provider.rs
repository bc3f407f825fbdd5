//! [`SpeechProvider`] on top of a [`TtsBackend`] and an [`AudioDevice`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use async_trait::async_trait;
use pageturner_core::{
    AudioClip, PlaybackHandle, SpeechError, SpeechProvider, VoiceParameters,
};
use tokio::sync::{Mutex, RwLock};

use crate::backend::TtsBackend;
use crate::output::{AudioDevice, AudioOutput, PlayRequest};
use crate::text_utils::expand_contractions;

/// Opens the output device during `initialize`.
pub type DeviceOpener = Arc<dyn Fn() -> Result<Arc<dyn AudioDevice>, SpeechError> + Send + Sync>;

/// Speech provider combining a synthesis backend with an output device.
///
/// The backend sits behind a `tokio::sync::RwLock`: synthesis (including
/// prefetch running alongside playback) takes a read lock, voice changes in
/// `initialize` take the write lock.
pub struct EngineSpeechProvider {
    backend: RwLock<Box<dyn TtsBackend>>,
    open_device: DeviceOpener,
    device: Mutex<Option<Arc<dyn AudioDevice>>>,
    volume: AtomicU8,
    expand_contractions: bool,
    next_id: AtomicU64,
}

impl EngineSpeechProvider {
    /// Provider playing through the default rodio output device.
    pub fn new(backend: Box<dyn TtsBackend>) -> Self {
        Self::with_device_opener(
            backend,
            Arc::new(|| AudioOutput::spawn().map(|out| Arc::new(out) as Arc<dyn AudioDevice>)),
        )
    }

    /// Provider playing through whatever `open_device` returns.
    pub fn with_device_opener(backend: Box<dyn TtsBackend>, open_device: DeviceOpener) -> Self {
        Self {
            backend: RwLock::new(backend),
            open_device,
            device: Mutex::new(None),
            volume: AtomicU8::new(100),
            expand_contractions: false,
            next_id: AtomicU64::new(1),
        }
    }

    /// Spell out contractions before synthesis.
    #[must_use]
    pub const fn expanding_contractions(mut self, enabled: bool) -> Self {
        self.expand_contractions = enabled;
        self
    }

    fn gain(&self) -> f32 {
        VoiceParameters {
            volume: self.volume.load(Ordering::SeqCst),
            ..VoiceParameters::default()
        }
        .gain()
    }

    async fn device(&self) -> Result<Arc<dyn AudioDevice>, SpeechError> {
        self.device
            .lock()
            .await
            .clone()
            .ok_or(SpeechError::NotInitialized)
    }
}

#[async_trait]
impl SpeechProvider for EngineSpeechProvider {
    async fn initialize(&self, voice: &VoiceParameters) -> Result<(), SpeechError> {
        {
            let mut backend = self.backend.write().await;
            if let Some(id) = &voice.voice {
                backend.set_voice(id);
            }
            backend.set_speed(voice.effective_rate());
        }
        self.volume.store(voice.volume.clamp(1, 100), Ordering::SeqCst);

        let backend = self.backend.read().await;
        backend.health_check().await.map_err(|e| match e {
            SpeechError::Unavailable(_) => e,
            other => SpeechError::Unavailable(other.to_string()),
        })?;

        let mut device = self.device.lock().await;
        if device.is_none() {
            let open = Arc::clone(&self.open_device);
            let opened = tokio::task::spawn_blocking(move || open())
                .await
                .map_err(|e| SpeechError::Output(format!("device open task failed: {e}")))??;
            *device = Some(opened);
        }

        tracing::info!(
            engine = backend.name(),
            voice = backend.voice(),
            rate = voice.effective_rate(),
            volume = voice.volume,
            "Speech provider initialized"
        );
        Ok(())
    }

    async fn synthesize(&self, text: &str) -> Result<AudioClip, SpeechError> {
        let prepared = if self.expand_contractions {
            expand_contractions(text)
        } else {
            text.to_string()
        };

        let audio = self.backend.read().await.synthesize(&prepared).await?;
        if audio.samples.is_empty() {
            return Err(SpeechError::Synthesis("engine returned no audio".to_string()));
        }
        Ok(AudioClip::from_samples(
            text,
            audio.samples,
            audio.sample_rate,
            audio.channels,
        ))
    }

    async fn play_non_blocking(&self, clip: &AudioClip) -> Result<PlaybackHandle, SpeechError> {
        let device = self.device().await?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (handle, completion) = PlaybackHandle::pair(id);

        device.play(PlayRequest {
            samples: clip.samples().to_vec(),
            sample_rate: clip.sample_rate(),
            channels: clip.channels(),
            volume: self.gain(),
            completion,
        })?;
        tracing::debug!(
            id,
            duration_ms = clip.duration().as_millis(),
            "Clip playing"
        );
        Ok(handle)
    }

    async fn cancel(&self, handle: &PlaybackHandle) {
        if let Ok(device) = self.device().await {
            device.stop(handle.id());
        }
    }

    async fn cleanup(&self) {
        let Some(device) = self.device.lock().await.take() else {
            return;
        };
        device.stop_all();
        // Joining the output thread blocks briefly.
        if let Err(e) = tokio::task::spawn_blocking(move || drop(device)).await {
            tracing::warn!(error = %e, "Audio output shutdown failed");
        }
        tracing::debug!("Speech provider cleaned up");
    }
}
