//! 16-bit PCM WAV encoding and decoding

use std::io::Cursor;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use domain::SpeechSample;

use crate::error::SpeechError;
use crate::types::DecodedAudio;

/// Size of the canonical RIFF/WAVE header
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

/// Convert a float sample to 16-bit PCM
///
/// Rounds `s * 32767` and clips to the `i16` range.
#[must_use]
pub fn quantize(sample: f32) -> i16 {
    // NaN saturates to 0 in the cast
    (sample * f32::from(i16::MAX))
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Encode interleaved float PCM as a 44-byte-header WAV
///
/// Layout: `RIFF`, size, `WAVE`, `fmt ` chunk of 16 bytes (PCM, channels,
/// rate, byte rate, block align, 16 bits), then `data` and the samples in
/// little-endian order.
pub fn encode_wav(pcm: &[f32], sample_rate: u32, channels: u16) -> Result<Bytes, SpeechError> {
    if channels == 0 || sample_rate == 0 {
        return Err(SpeechError::InvalidAudio(format!(
            "cannot encode {channels} channel(s) at {sample_rate} Hz"
        )));
    }

    let data_len = pcm
        .len()
        .checked_mul(usize::from(BYTES_PER_SAMPLE))
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| SpeechError::InvalidAudio("capture too long for WAV".to_string()))?;

    let block_align = channels * BYTES_PER_SAMPLE;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| SpeechError::InvalidAudio(format!("sample rate {sample_rate} too high")))?;

    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN + pcm.len() * 2);
    buf.put_slice(b"RIFF");
    buf.put_u32_le(36 + data_len);
    buf.put_slice(b"WAVE");
    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1);
    buf.put_u16_le(channels);
    buf.put_u32_le(sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(block_align);
    buf.put_u16_le(BITS_PER_SAMPLE);
    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    for &sample in pcm {
        buf.put_i16_le(quantize(sample));
    }

    Ok(buf.freeze())
}

/// Encode a captured sample
pub fn encode_sample(sample: &SpeechSample) -> Result<Bytes, SpeechError> {
    encode_wav(sample.pcm(), sample.sample_rate(), sample.channels())
}

/// Format details read from a WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    /// Interleaved channels
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Total samples across all channels
    pub samples: u32,
}

impl WavInfo {
    /// Frames (samples per channel)
    #[must_use]
    pub fn frames(&self) -> u32 {
        self.samples / u32::from(self.channels.max(1))
    }

    /// Duration in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        u64::from(self.frames()) * 1000 / u64::from(self.sample_rate)
    }
}

fn open_reader(bytes: &[u8]) -> Result<WavReader<Cursor<&[u8]>>, SpeechError> {
    WavReader::new(Cursor::new(bytes))
        .map_err(|e| SpeechError::InvalidAudio(format!("not a readable WAV: {e}")))
}

/// Read the header of an in-memory WAV
pub fn inspect_wav(bytes: &[u8]) -> Result<WavInfo, SpeechError> {
    let reader = open_reader(bytes)?;
    let spec = reader.spec();
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        samples: reader.len(),
    })
}

fn read_samples<R: std::io::Read>(mut reader: WavReader<R>) -> Result<DecodedAudio, SpeechError> {
    let spec = reader.spec();
    debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "Reading WAV samples"
    );

    let read_err = |e: hound::Error| SpeechError::InvalidAudio(format!("failed to read sample: {e}"));

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| f32::from(v) / f32::from(i8::MAX)))
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_607.0))
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, bits) => {
            return Err(SpeechError::InvalidAudio(format!(
                "unsupported bit depth: {bits}"
            )));
        }
    };

    Ok(DecodedAudio::new(samples, spec.sample_rate, spec.channels))
}

/// Decode an in-memory WAV to float PCM
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, SpeechError> {
    read_samples(open_reader(bytes)?)
}

/// Read a WAV file from disk
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<DecodedAudio, SpeechError> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|e| {
        SpeechError::InvalidAudio(format!("failed to open {}: {e}", path.display()))
    })?;
    read_samples(reader)
}

/// Write decoded audio to disk as 16-bit PCM
pub fn write_wav_file(path: impl AsRef<Path>, audio: &DecodedAudio) -> Result<(), SpeechError> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let write_err = |e: hound::Error| {
        SpeechError::InvalidAudio(format!("failed to write {}: {e}", path.display()))
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for &sample in audio.samples() {
        writer.write_sample(quantize(sample)).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)?;

    debug!(path = %path.display(), frames = audio.frames(), "Wrote WAV file");
    Ok(())
}
