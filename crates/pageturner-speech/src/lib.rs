//! Speech providers for pageturner.
//!
//! [`EngineSpeechProvider`] implements the core `SpeechProvider` port on top
//! of any [`TtsBackend`] plus a dedicated rodio output thread. Two backends
//! ship here:
//!
//! | Feature  | Backend                              | Where it runs          |
//! |----------|--------------------------------------|------------------------|
//! | always   | [`AllTalkBackend`]                   | AllTalk HTTP server    |
//! | `sherpa` | [`SherpaTtsBackend`](backend::sherpa_tts::SherpaTtsBackend) | in-process (Kokoro) |

pub mod backend;
pub mod output;
pub mod provider;
pub mod text_utils;
pub mod wav;

pub use backend::alltalk::{AllTalkBackend, AllTalkConfig};
pub use backend::{TtsAudio, TtsBackend};
pub use output::AudioOutput;
pub use provider::EngineSpeechProvider;
