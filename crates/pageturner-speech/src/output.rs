//! Dedicated audio output thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so the stream lives on
//! one OS thread for its whole life and [`AudioOutput`] proxies commands to it
//! over a channel. One sink plays at a time; starting a clip stops the
//! previous one.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use pageturner_core::{PlaybackCompletion, SpeechError};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

// ── Device seam ────────────────────────────────────────────────────

/// One clip to render.
pub struct PlayRequest {
    /// Interleaved PCM samples.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Linear gain in `(0.0, 1.0]`.
    pub volume: f32,
    /// Resolved when rendering ends or is stopped.
    pub completion: PlaybackCompletion,
}

/// Something that renders PCM and reports completion.
///
/// Methods are synchronous and return quickly; rendering happens elsewhere.
pub trait AudioDevice: Send + Sync {
    /// Start rendering, stopping whatever played before.
    fn play(&self, request: PlayRequest) -> Result<(), SpeechError>;

    /// Stop playback `id` if it is the one rendering.
    fn stop(&self, id: u64);

    /// Stop any playback.
    fn stop_all(&self);
}

// ── Commands ───────────────────────────────────────────────────────

enum OutputCommand {
    Play {
        request: PlayRequest,
        reply: mpsc::Sender<Result<(), SpeechError>>,
    },
    Stop {
        id: u64,
    },
    StopAll,
    Shutdown,
}

/// The clip currently owned by the output thread.
struct Playing {
    id: u64,
    sink: Arc<Sink>,
    completion: Arc<PlaybackCompletion>,
}

impl Playing {
    fn stop(self) {
        self.sink.stop();
        self.completion.complete();
        tracing::debug!(id = self.id, "Playback stopped");
    }
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the audio output thread.
pub struct AudioOutput {
    cmd_tx: mpsc::Sender<OutputCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioOutput {
    /// Spawn the output thread and open the default output device.
    ///
    /// Blocks until the device is open; call from a blocking context.
    pub fn spawn() -> Result<Self, SpeechError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<OutputCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), SpeechError>>();

        let thread = thread::Builder::new()
            .name("pageturner-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| SpeechError::Output(format!("failed to spawn audio thread: {e}")))?;

        init_rx
            .recv()
            .map_err(|_| SpeechError::Output("audio thread died during init".to_string()))??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: OutputCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::warn!("Audio thread is gone, command dropped");
        }
    }

    // ── Audio thread event loop ────────────────────────────────────

    fn run(cmd_rx: &mpsc::Receiver<OutputCommand>, init_tx: &mpsc::Sender<Result<(), SpeechError>>) {
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(SpeechError::Output(e.to_string())));
                return;
            }
        };
        if init_tx.send(Ok(())).is_err() {
            return;
        }
        tracing::info!("Audio output opened on default device");

        let mut current: Option<Playing> = None;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                OutputCommand::Play { request, reply } => {
                    if let Some(previous) = current.take() {
                        previous.stop();
                    }
                    let result = Sink::try_new(&handle)
                        .map_err(|e| SpeechError::Output(e.to_string()))
                        .map(|sink| start(sink, request));
                    let _ = reply.send(result.map(|playing| {
                        current = Some(playing);
                    }));
                }
                OutputCommand::Stop { id } => {
                    if current.as_ref().is_some_and(|p| p.id == id) {
                        if let Some(playing) = current.take() {
                            playing.stop();
                        }
                    }
                }
                OutputCommand::StopAll => {
                    if let Some(playing) = current.take() {
                        playing.stop();
                    }
                }
                OutputCommand::Shutdown => break,
            }
        }

        if let Some(playing) = current.take() {
            playing.stop();
        }
        tracing::debug!("Audio thread shutting down");
    }
}

/// Queue the request on `sink` and watch it drain on a helper thread.
fn start(sink: Sink, request: PlayRequest) -> Playing {
    let PlayRequest {
        samples,
        sample_rate,
        channels,
        volume,
        completion,
    } = request;
    let id = completion.id();

    sink.set_volume(volume.clamp(0.0, 1.0));
    sink.append(SamplesBuffer::new(channels, sample_rate, samples));

    let sink = Arc::new(sink);
    let completion = Arc::new(completion);

    let watched_sink = Arc::clone(&sink);
    let watched_completion = Arc::clone(&completion);
    // Returns when the queue drains or the sink is stopped.
    thread::spawn(move || {
        watched_sink.sleep_until_end();
        watched_completion.complete();
    });

    tracing::debug!(id, sample_rate, channels, volume, "Playback started");
    Playing {
        id,
        sink,
        completion,
    }
}

impl AudioDevice for AudioOutput {
    fn play(&self, request: PlayRequest) -> Result<(), SpeechError> {
        let (reply, rx) = mpsc::channel();
        self.cmd_tx
            .send(OutputCommand::Play { request, reply })
            .map_err(|_| SpeechError::Output("audio thread is gone".to_string()))?;
        rx.recv()
            .map_err(|_| SpeechError::Output("audio thread is gone".to_string()))?
    }

    fn stop(&self, id: u64) {
        self.send(OutputCommand::Stop { id });
    }

    fn stop_all(&self) {
        self.send(OutputCommand::StopAll);
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
