//! Speech sample value object
//!
//! Raw interleaved PCM handed over by the capture device.

use crate::errors::DomainError;

/// Interleaved floating point PCM captured from a microphone
///
/// Samples are expected in `[-1.0, 1.0]`; values outside are clipped when
/// encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSample {
    channels: u16,
    sample_rate: u32,
    pcm: Vec<f32>,
}

impl SpeechSample {
    /// Create a sample buffer
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSpeechSample` when `channels` or
    /// `sample_rate` is zero, or when the sample count is not a multiple of
    /// the channel count.
    pub fn new(channels: u16, sample_rate: u32, pcm: Vec<f32>) -> Result<Self, DomainError> {
        if channels == 0 {
            return Err(DomainError::InvalidSpeechSample(
                "channel count must be greater than 0".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(DomainError::InvalidSpeechSample(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        if pcm.len() % usize::from(channels) != 0 {
            return Err(DomainError::InvalidSpeechSample(format!(
                "{} samples do not divide into {channels} channels",
                pcm.len()
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
            pcm,
        })
    }

    /// Number of interleaved channels
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples
    #[must_use]
    pub fn pcm(&self) -> &[f32] {
        &self.pcm
    }

    /// Total sample count across all channels
    #[must_use]
    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    /// True when nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Duration of the capture in milliseconds
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn duration_ms(&self) -> u64 {
        let frames = (self.pcm.len() / usize::from(self.channels)) as u64;
        frames * 1000 / u64::from(self.sample_rate)
    }

    /// Consume the buffer, returning the raw samples
    #[must_use]
    pub fn into_pcm(self) -> Vec<f32> {
        self.pcm
    }
}
