//! Energy gate deciding whether a capture holds speech

/// Amplitude a sample must exceed to count as voiced
pub const DEFAULT_VOLUME_THRESHOLD: f32 = 0.001;

/// Fraction of voiced samples above which a capture is speech
pub const SPEECH_RATIO: f32 = 0.01;

/// Result of measuring a capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceActivity {
    /// Fraction of samples whose magnitude exceeded the threshold
    pub valid_ratio: f32,
    /// `valid_ratio > SPEECH_RATIO`
    pub is_speech: bool,
}

/// Volume-threshold voice activity detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyGate {
    volume_threshold: f32,
}

impl Default for EnergyGate {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_THRESHOLD)
    }
}

impl EnergyGate {
    /// Gate with the given amplitude threshold
    #[must_use]
    pub const fn new(volume_threshold: f32) -> Self {
        Self { volume_threshold }
    }

    /// The amplitude threshold
    #[must_use]
    pub const fn volume_threshold(&self) -> f32 {
        self.volume_threshold
    }

    /// Measure a capture; an empty one is never speech
    #[must_use]
    pub fn measure(&self, pcm: &[f32]) -> VoiceActivity {
        if pcm.is_empty() {
            return VoiceActivity {
                valid_ratio: 0.0,
                is_speech: false,
            };
        }

        let voiced = pcm
            .iter()
            .filter(|s| s.abs() > self.volume_threshold)
            .count();
        let valid_ratio = voiced as f32 / pcm.len() as f32;

        VoiceActivity {
            valid_ratio,
            is_speech: valid_ratio > SPEECH_RATIO,
        }
    }

    /// Shorthand for `measure(pcm).is_speech`
    #[must_use]
    pub fn is_speech(&self, pcm: &[f32]) -> bool {
        self.measure(pcm).is_speech
    }
}
