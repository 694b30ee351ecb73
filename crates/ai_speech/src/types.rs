//! Types for speech processing
//!
//! Contains data structures for audio data, formats, transcriptions and
//! decoded audio.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3
    Mp3,
    /// OGG container (Vorbis)
    Ogg,
    /// AAC, raw ADTS or in an MP4 container
    Aac,
    /// 16-bit PCM WAV
    Wav,
}

impl AudioFormat {
    /// Get the MIME type for this audio format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Aac => "audio/aac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension for this audio format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Aac => "aac",
            Self::Wav => "wav",
        }
    }

    /// Parse audio format from MIME type
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        // "audio/ogg; codecs=vorbis" and friends
        let base_mime = mime.split(';').next().unwrap_or(mime).trim();

        match base_mime {
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/ogg" | "application/ogg" => Some(Self::Ogg),
            "audio/aac" | "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some(Self::Aac),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            _ => None,
        }
    }

    /// Parse audio format from a file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "ogg" | "oga" => Some(Self::Ogg),
            "aac" | "m4a" | "mp4" => Some(Self::Aac),
            "wav" | "wave" => Some(Self::Wav),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoded audio bytes with their declared format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Bytes,
    format: AudioFormat,
}

impl AudioData {
    /// Create new audio data
    #[must_use]
    pub fn new(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    /// Get the raw audio bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw audio bytes
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Get the audio format
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Get the size of the audio data in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the audio data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the MIME type for this audio
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Generate a filename with appropriate extension
    #[must_use]
    pub fn filename(&self, base: &str) -> String {
        format!("{}.{}", base, self.format.extension())
    }
}

/// Result of speech-to-text transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Transcribed text
    pub text: String,
    /// Language code the service reported or was asked for
    pub language: Option<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: Option<f32>,
}

impl Transcription {
    /// Create a transcription with only text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            confidence: None,
        }
    }

    /// Set the language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the confidence
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Why a capture produced no transcript
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoSpeechReason {
    /// The device returned no samples
    EmptyCapture,
    /// Too few samples rose above the volume threshold
    BelowThreshold {
        /// Fraction of samples above the threshold
        valid_ratio: f32,
    },
    /// The service heard nothing it could transcribe
    EmptyTranscript,
}

/// Outcome of a recognition attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// Speech was recognised
    Transcript(Transcription),
    /// Nothing to transcribe; not an error
    NoSpeech(NoSpeechReason),
}

impl Recognition {
    /// Wrap a transcription, mapping blank text to `NoSpeech`
    #[must_use]
    pub fn from_transcription(transcription: Transcription) -> Self {
        if transcription.text.trim().is_empty() {
            Self::NoSpeech(NoSpeechReason::EmptyTranscript)
        } else {
            Self::Transcript(transcription)
        }
    }

    /// Transcript text, if speech was recognised
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Transcript(t) => Some(&t.text),
            Self::NoSpeech(_) => None,
        }
    }

    /// Check if speech was recognised
    #[must_use]
    pub const fn is_speech(&self) -> bool {
        matches!(self, Self::Transcript(_))
    }
}

/// Decoded interleaved PCM ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedAudio {
    /// Create decoded audio
    #[must_use]
    pub const fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Interleaved samples in `[-1.0, 1.0]`
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Playback duration in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64).saturating_mul(1000) / u64::from(self.sample_rate)
    }
}
