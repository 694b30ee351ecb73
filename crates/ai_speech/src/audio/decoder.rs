//! Decoding of synthesized speech to PCM

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::audio::wav;
use crate::error::SpeechError;
use crate::types::{AudioData, AudioFormat, DecodedAudio};

/// Turns encoded audio into interleaved float PCM
pub trait AudioDecoder: Send + Sync {
    /// Decode according to the declared format
    fn decode(&self, audio: &AudioData) -> Result<DecodedAudio, SpeechError>;
}

/// Decoder backed by symphonia, with WAV read through hound
///
/// Keeps the source sample rate and channel layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    /// Create a decoder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn decode_compressed(data: &[u8], format: AudioFormat) -> Result<DecodedAudio, SpeechError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(format.extension());
        hint.mime_type(format.mime_type());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| SpeechError::Decode(format!("{format} probe: {e}")))?;

        let mut reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SpeechError::Decode("no audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
        let mut channels = codec_params
            .channels
            .map_or(0, |c| u16::try_from(c.count()).unwrap_or(u16::MAX));

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| SpeechError::Decode(format!("codec: {e}")))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(SpeechError::Decode(format!("packet: {e}"))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(error = %e, "Skipping corrupt audio frame");
                    continue;
                }
                Err(e) => return Err(SpeechError::Decode(format!("decode: {e}"))),
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }
            // Some streams only reveal their layout on the first frame
            sample_rate = spec.rate;
            channels = u16::try_from(spec.channels.count()).unwrap_or(u16::MAX);

            let mut buffer = SampleBuffer::<f32>::new(frames as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        if samples.is_empty() || sample_rate == 0 || channels == 0 {
            return Err(SpeechError::Decode(format!(
                "no audio samples decoded from {format}"
            )));
        }

        debug!(
            format = %format,
            samples = samples.len(),
            sample_rate,
            channels,
            "Decoded synthesized audio"
        );

        Ok(DecodedAudio::new(samples, sample_rate, channels))
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, audio: &AudioData) -> Result<DecodedAudio, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::Decode("audio payload is empty".to_string()));
        }

        match audio.format() {
            AudioFormat::Wav => wav::decode_wav(audio.data())
                .map_err(|e| SpeechError::Decode(e.to_string())),
            format @ (AudioFormat::Mp3 | AudioFormat::Ogg | AudioFormat::Aac) => {
                Self::decode_compressed(audio.data(), format)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_goes_through_hound() {
        let bytes = wav::encode_wav(&[0.1, 0.2, 0.3, 0.4], 24_000, 2).unwrap();
        let decoded = SymphoniaDecoder::new()
            .decode(&AudioData::new(bytes, AudioFormat::Wav))
            .unwrap();

        assert_eq!(decoded.sample_rate(), 24_000);
        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.frames(), 2);
    }

    #[test]
    fn empty_payload_is_decode_error() {
        let result = SymphoniaDecoder::new().decode(&AudioData::new(Vec::new(), AudioFormat::Mp3));
        assert!(matches!(result, Err(SpeechError::Decode(_))));
    }

    #[test]
    fn garbage_mp3_is_decode_error() {
        let result = SymphoniaDecoder::new()
            .decode(&AudioData::new(vec![0x42; 512], AudioFormat::Mp3));
        assert!(matches!(result, Err(SpeechError::Decode(_))));
    }

    #[test]
    fn corrupt_wav_is_decode_error() {
        let result =
            SymphoniaDecoder::new().decode(&AudioData::new(b"RIFF....".to_vec(), AudioFormat::Wav));
        assert!(matches!(result, Err(SpeechError::Decode(_))));
    }
}
