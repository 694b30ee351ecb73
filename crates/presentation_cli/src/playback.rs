//! Playback sink that writes each reply to a numbered WAV file

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ai_speech::DecodedAudio;
use ai_speech::audio::write_wav_file;
use application::{PlaybackError, PlaybackSink};
use async_trait::async_trait;
use tracing::info;

/// Writes `reply-001.wav`, `reply-002.wav`, ... into a directory
#[derive(Debug)]
pub struct WavDirectorySink {
    dir: PathBuf,
    written: AtomicUsize,
}

impl WavDirectorySink {
    /// Create the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: AtomicUsize::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        let n = self.written.fetch_add(1, Ordering::Relaxed) + 1;
        self.dir.join(format!("reply-{n:03}.wav"))
    }
}

#[async_trait]
impl PlaybackSink for WavDirectorySink {
    async fn play(&self, audio: Arc<DecodedAudio>) -> Result<(), PlaybackError> {
        let path = self.next_path();
        let target = path.clone();
        let duration_ms = audio.duration_ms();

        tokio::task::spawn_blocking(move || write_wav_file(&target, &audio))
            .await
            .map_err(|e| PlaybackError(format!("writer task failed: {e}")))?
            .map_err(|e| PlaybackError(e.to_string()))?;

        info!(path = %path.display(), duration_ms, "Reply written");
        Ok(())
    }
}
