//! Capture session: microphone to recognised text
//!
//! [`CaptureSession`] drives a [`CaptureDevice`] through one utterance:
//! start, wait for the final buffer to flush, gate on voice energy, encode
//! WAV and hand it to the recogniser. Silence never reaches the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use domain::SpeechSample;

use crate::audio::{EnergyGate, encode_sample};
use crate::config::SttConfig;
use crate::error::SpeechError;
use crate::ports::{CaptureDevice, SpeechToText};
use crate::types::{AudioData, AudioFormat, NoSpeechReason, Recognition};

/// One microphone bound to one recogniser
pub struct CaptureSession {
    device: Arc<dyn CaptureDevice>,
    stt: Arc<dyn SpeechToText>,
    gate: EnergyGate,
    flush_delay: Duration,
    device_name: Option<String>,
    listening: AtomicBool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("stt", &self.stt.provider_name())
            .field("gate", &self.gate)
            .field("flush_delay", &self.flush_delay)
            .field("device_name", &self.device_name)
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Bind a device and recogniser using the gate and flush settings of `config`
    #[must_use]
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        stt: Arc<dyn SpeechToText>,
        config: &SttConfig,
    ) -> Self {
        Self {
            device,
            stt,
            gate: EnergyGate::new(config.volume_threshold),
            flush_delay: Duration::from_millis(config.flush_delay_ms),
            device_name: config.device.clone(),
            listening: AtomicBool::new(false),
        }
    }

    /// Whether this session has a capture running
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    /// Start capturing; a no-op when this session is already listening
    ///
    /// # Errors
    ///
    /// `SpeechError::DeviceBusy` when another owner holds the device.
    #[instrument(skip(self), fields(device = ?self.device_name))]
    pub fn start_capture(&self) -> Result<(), SpeechError> {
        if self.is_listening() {
            debug!("Capture already running");
            return Ok(());
        }

        self.device.start(self.device_name.as_deref())?;
        self.listening.store(true, Ordering::Release);
        info!("Capture started");
        Ok(())
    }

    /// Stop capturing and recognise what was said
    ///
    /// Waits the flush delay before stopping the device. Captures that are
    /// empty or below the voice gate yield `Recognition::NoSpeech` without
    /// calling the recogniser.
    ///
    /// # Errors
    ///
    /// `SpeechError::Capture` when no capture is running, otherwise device
    /// or recognition failures.
    #[instrument(skip(self), fields(stt = self.stt.provider_name()))]
    pub async fn stop_capture(&self) -> Result<Recognition, SpeechError> {
        if !self.is_listening() {
            return Err(SpeechError::Capture("no capture is running".to_string()));
        }

        tokio::time::sleep(self.flush_delay).await;
        let sample = self.release_device()?;

        if sample.is_empty() {
            debug!("Capture was empty");
            return Ok(Recognition::NoSpeech(NoSpeechReason::EmptyCapture));
        }

        let activity = self.gate.measure(sample.pcm());
        if !activity.is_speech {
            info!(valid_ratio = activity.valid_ratio, "No speech detected");
            return Ok(Recognition::NoSpeech(NoSpeechReason::BelowThreshold {
                valid_ratio: activity.valid_ratio,
            }));
        }

        debug!(
            valid_ratio = activity.valid_ratio,
            duration_ms = sample.duration_ms(),
            "Speech detected, transcribing"
        );
        let wav = encode_sample(&sample)?;
        self.stt.transcribe(AudioData::new(wav, AudioFormat::Wav)).await
    }

    /// Stop capturing and discard the samples
    pub fn cancel_capture(&self) {
        if !self.is_listening() {
            return;
        }
        if let Err(e) = self.release_device() {
            warn!(error = %e, "Failed to stop capture device");
        }
    }

    fn release_device(&self) -> Result<SpeechSample, SpeechError> {
        // The session stops listening even when the device reports an error
        self.listening.store(false, Ordering::Release);
        self.device.stop()
    }
}

/// Capture device that plays back a preloaded sample
///
/// Useful for feeding recorded WAV files through the pipeline and for tests.
/// Each `stop` hands over the loaded sample and leaves the device empty.
#[derive(Debug)]
pub struct ReplayCaptureDevice {
    source: Mutex<Option<SpeechSample>>,
    capturing: AtomicBool,
}

impl ReplayCaptureDevice {
    /// Device with `sample` ready to be captured
    #[must_use]
    pub fn new(sample: SpeechSample) -> Self {
        Self {
            source: Mutex::new(Some(sample)),
            capturing: AtomicBool::new(false),
        }
    }

    /// Device with nothing loaded
    #[must_use]
    pub fn empty() -> Self {
        Self {
            source: Mutex::new(None),
            capturing: AtomicBool::new(false),
        }
    }

    /// Replace the sample handed over by the next `stop`
    pub fn load(&self, sample: SpeechSample) {
        *self.source.lock() = Some(sample);
    }
}

impl CaptureDevice for ReplayCaptureDevice {
    fn start(&self, device: Option<&str>) -> Result<(), SpeechError> {
        if self
            .capturing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SpeechError::DeviceBusy(
                device.unwrap_or("default").to_string(),
            ));
        }
        Ok(())
    }

    fn stop(&self) -> Result<SpeechSample, SpeechError> {
        if !self.capturing.swap(false, Ordering::AcqRel) {
            return Err(SpeechError::Capture("device is not capturing".to_string()));
        }

        match self.source.lock().take() {
            Some(sample) => Ok(sample),
            None => SpeechSample::new(1, 16_000, Vec::new())
                .map_err(|e| SpeechError::Capture(e.to_string())),
        }
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }
}
