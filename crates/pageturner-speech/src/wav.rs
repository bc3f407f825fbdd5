//! WAV decoding for server-generated audio.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use pageturner_core::SpeechError;

use crate::backend::TtsAudio;

/// Decode a complete WAV file into interleaved f32 samples.
///
/// Integer PCM of any bit depth is scaled into `[-1.0, 1.0]`.
#[allow(clippy::cast_precision_loss)]
pub fn decode_wav(bytes: &[u8]) -> Result<TtsAudio, SpeechError> {
    let reader =
        WavReader::new(Cursor::new(bytes)).map_err(|e| SpeechError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SpeechError::Decode(e.to_string()))?,
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample)?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SpeechError::Decode(e.to_string()))?
        }
    };

    tracing::debug!(
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "Decoded WAV"
    );

    Ok(TtsAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

#[allow(clippy::cast_precision_loss)]
fn int_scale(bits: u16) -> Result<f32, SpeechError> {
    match bits {
        1..=32 => Ok((1_i64 << (bits - 1)) as f32),
        _ => Err(SpeechError::Decode(format!("unsupported bit depth {bits}"))),
    }
}
