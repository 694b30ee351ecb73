//! Text-to-speech with decoding and a bounded cache
//!
//! Repeated phrases ("Sorry, could you repeat that?") are served from memory
//! without touching the network or the decoder.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use infrastructure::{CacheStats, ResponseCache};

use crate::audio::AudioDecoder;
use crate::config::TtsConfig;
use crate::error::SpeechError;
use crate::ports::{SpeechSynthesizer, TextToSpeech};
use crate::types::DecodedAudio;

/// [`TextToSpeech`] built from a vendor synthesizer and a decoder
pub struct CachedTextToSpeech {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    decoder: Arc<dyn AudioDecoder>,
    cache: ResponseCache<Arc<DecodedAudio>>,
}

impl std::fmt::Debug for CachedTextToSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedTextToSpeech")
            .field("synthesizer", &self.synthesizer.provider_name())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CachedTextToSpeech {
    /// Wrap a synthesizer, caching as configured by `enable_cache` and `max_cache_size`
    #[must_use]
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        decoder: Arc<dyn AudioDecoder>,
        config: &TtsConfig,
    ) -> Self {
        let cache = match NonZeroUsize::new(config.max_cache_size) {
            Some(capacity) if config.enable_cache => ResponseCache::new(capacity),
            _ => ResponseCache::disabled(),
        };
        Self {
            synthesizer,
            decoder,
            cache,
        }
    }

    /// Cache counters
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn decode(&self, audio: crate::types::AudioData) -> Result<DecodedAudio, SpeechError> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&audio))
            .await
            .map_err(|e| SpeechError::Decode(format!("decoder task failed: {e}")))?
    }
}

#[async_trait]
impl TextToSpeech for CachedTextToSpeech {
    #[instrument(skip(self, text), fields(provider = self.synthesizer.provider_name(), text_len = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Arc<DecodedAudio>, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::Validation(
                "text to synthesize must not be empty".to_string(),
            ));
        }

        if let Some(hit) = self.cache.get(text) {
            debug!("Serving synthesized audio from cache");
            return Ok(hit);
        }

        let encoded = self.synthesizer.synthesize_raw(text).await?;
        let decoded = Arc::new(self.decode(encoded).await?);

        if let Some(evicted) = self.cache.put(text, Arc::clone(&decoded)) {
            debug!(evicted_len = evicted.len(), "Evicted cached audio");
        }
        debug!(
            duration_ms = decoded.duration_ms(),
            sample_rate = decoded.sample_rate(),
            "Synthesized audio ready"
        );
        Ok(decoded)
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}
