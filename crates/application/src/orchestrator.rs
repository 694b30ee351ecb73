//! Interaction orchestrator
//!
//! Sequences one conversational exchange through
//! `Idle -> Capturing -> Transcribing -> Generating -> Synthesizing -> Idle`.
//! At most one traversal runs at a time; requests arriving while busy are
//! rejected and logged, never queued. Every traversal is tagged with a
//! generation number and [`close`](InteractionOrchestrator::close) bumps it,
//! so results of a traversal that outlived a close are discarded instead of
//! reaching a later stage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use ai_core::LanguageModel;
use ai_speech::{DecodedAudio, NoSpeechReason, Recognition, TextToSpeech};
use domain::{ConversationHistory, ConversationMessage, PipelineState};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ports::{PlaybackSink, SpeechInput};

/// Why a request did not start a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The pipeline is in a state that does not accept the request
    Busy(PipelineState),
    /// The orchestrator is closed
    Closed,
    /// No speech input is attached
    NoInput,
}

/// Result of [`InteractionOrchestrator::begin_capture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStart {
    /// The device is recording
    Started,
    /// Nothing happened
    Rejected(Rejection),
}

/// A completed exchange
#[derive(Debug, Clone)]
pub struct Turn {
    /// What the user said or typed
    pub transcript: String,
    /// The model's reply
    pub reply: String,
    /// Synthesized reply, `None` in text-only mode
    pub audio: Option<Arc<DecodedAudio>>,
}

/// How a traversal ended, when it did not fail
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// All stages ran
    Completed(Turn),
    /// The capture held no speech; the model was not called
    NoSpeech(NoSpeechReason),
    /// The utterance was blank; the model was not called
    Empty,
    /// The request was refused without side effects
    Rejected(Rejection),
    /// The orchestrator was closed while this traversal was in flight
    Discarded,
}

impl TurnOutcome {
    /// The completed turn, if any
    #[must_use]
    pub const fn turn(&self) -> Option<&Turn> {
        match self {
            Self::Completed(turn) => Some(turn),
            _ => None,
        }
    }
}

/// Drives capture, recognition, generation and synthesis for one conversation
pub struct InteractionOrchestrator {
    config: PipelineConfig,
    model: Arc<dyn LanguageModel>,
    input: Option<Arc<dyn SpeechInput>>,
    tts: Option<Arc<dyn TextToSpeech>>,
    playback: Option<Arc<dyn PlaybackSink>>,
    history: Mutex<ConversationHistory>,
    // Generation and closed flag are only written under this lock
    state: Mutex<PipelineState>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl std::fmt::Debug for InteractionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionOrchestrator")
            .field("config", &self.config)
            .field("model", &self.model.model_name())
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl InteractionOrchestrator {
    /// Create a text-only orchestrator around a language model
    ///
    /// Attach speech input, synthesis and playback with the `with_*` methods.
    pub fn new(config: PipelineConfig, model: Arc<dyn LanguageModel>) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Configuration)?;
        let history = config.new_history()?;

        info!(
            model = model.model_name(),
            max_turns = config.max_turns,
            synthesize_replies = config.synthesize_replies,
            "Initialized interaction orchestrator"
        );

        Ok(Self {
            config,
            model,
            input: None,
            tts: None,
            playback: None,
            history: Mutex::new(history),
            state: Mutex::new(PipelineState::Idle),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Attach a microphone-side input
    #[must_use]
    pub fn with_input(mut self, input: Arc<dyn SpeechInput>) -> Self {
        self.input = Some(input);
        self
    }

    /// Attach a synthesizer
    #[must_use]
    pub fn with_tts(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    /// Attach a playback sink for synthesized replies
    #[must_use]
    pub fn with_playback(mut self, playback: Arc<dyn PlaybackSink>) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Current pipeline state
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    /// Generation of the most recent traversal or close
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether [`close`](Self::close) was called without a later [`open`](Self::open)
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Read-only copy of the conversation
    #[must_use]
    pub fn transcript(&self) -> Vec<ConversationMessage> {
        self.history.lock().snapshot()
    }

    /// Forget every exchange, keeping the system prompt
    ///
    /// # Errors
    ///
    /// Returns `Rejection::Busy` unless the pipeline is `Idle`.
    pub fn reset_conversation(&self) -> Result<(), Rejection> {
        let state = self.state.lock();
        if *state != PipelineState::Idle {
            return Err(Rejection::Busy(*state));
        }
        self.history.lock().clear();
        debug!("Conversation reset");
        Ok(())
    }

    /// Replace the system prompt in place
    ///
    /// # Errors
    ///
    /// Returns `Rejection::Busy` unless the pipeline is `Idle`.
    pub fn set_system_prompt(&self, prompt: impl Into<String>) -> Result<(), Rejection> {
        let state = self.state.lock();
        if *state != PipelineState::Idle {
            return Err(Rejection::Busy(*state));
        }
        self.history.lock().set_system_prompt(prompt);
        Ok(())
    }

    /// Re-arm a closed orchestrator
    pub fn open(&self) {
        let _state = self.state.lock();
        self.closed.store(false, Ordering::Release);
        info!("Orchestrator opened");
    }

    /// Abandon any in-flight traversal and refuse new requests
    ///
    /// Forces `Idle`, stops a running capture and clears the synthesis cache.
    /// Network calls already in flight are not cancelled; their results are
    /// discarded.
    pub fn close(&self) {
        let abandoned = {
            let mut state = self.state.lock();
            self.closed.store(true, Ordering::Release);
            self.generation.fetch_add(1, Ordering::AcqRel);
            std::mem::replace(&mut *state, PipelineState::Idle)
        };

        if let Some(input) = &self.input {
            input.cancel_capture();
        }
        if let Some(tts) = &self.tts {
            tts.clear_cache();
        }
        info!(abandoned = %abandoned, generation = self.generation(), "Orchestrator closed");
    }

    /// Start recording an utterance
    ///
    /// Only accepted in `Idle`; otherwise a logged no-op.
    ///
    /// # Errors
    ///
    /// `PipelineError::Capture` when the device refuses to start, e.g.
    /// because another owner holds it. The state returns to `Idle`.
    #[instrument(skip(self))]
    pub fn begin_capture(&self) -> Result<CaptureStart, PipelineError> {
        let Some(input) = self.input.as_ref() else {
            warn!("Capture requested without a speech input");
            return Ok(CaptureStart::Rejected(Rejection::NoInput));
        };

        let generation = match self.start_traversal(PipelineState::Capturing) {
            Ok(generation) => generation,
            Err(rejection) => {
                warn!(?rejection, "Capture request rejected");
                return Ok(CaptureStart::Rejected(rejection));
            },
        };

        if let Err(e) = input.start_capture() {
            self.advance(generation, PipelineState::Idle);
            warn!(error = %e, "Capture could not start");
            return Err(PipelineError::Capture(e));
        }

        info!(generation, "Capture started");
        Ok(CaptureStart::Started)
    }

    /// Stop recording and run the rest of the pipeline
    ///
    /// Only accepted in `Capturing`. Silence ends the traversal with
    /// `TurnOutcome::NoSpeech` without calling the model.
    ///
    /// # Errors
    ///
    /// The failing stage's error; the state returns to `Idle`.
    #[instrument(skip(self))]
    pub async fn end_capture(&self) -> Result<TurnOutcome, PipelineError> {
        let Some(input) = self.input.clone() else {
            warn!("End of capture requested without a speech input");
            return Ok(TurnOutcome::Rejected(Rejection::NoInput));
        };

        let generation = {
            let mut state = self.state.lock();
            if *state != PipelineState::Capturing {
                warn!(state = %*state, "End of capture rejected");
                return Ok(TurnOutcome::Rejected(Rejection::Busy(*state)));
            }
            *state = PipelineState::Transcribing;
            self.generation()
        };

        let recognition = match input.stop_capture().await {
            Ok(recognition) => recognition,
            Err(e) => return self.fail(generation, PipelineError::Transcription(e)),
        };

        match recognition {
            Recognition::NoSpeech(reason) => {
                if !self.advance(generation, PipelineState::Idle) {
                    return Ok(TurnOutcome::Discarded);
                }
                info!(?reason, "No speech in capture");
                Ok(TurnOutcome::NoSpeech(reason))
            },
            Recognition::Transcript(transcription) => {
                if !self.advance(generation, PipelineState::Generating) {
                    return Ok(TurnOutcome::Discarded);
                }
                debug!(
                    text_len = transcription.text.len(),
                    confidence = ?transcription.confidence,
                    "Transcription received"
                );
                self.run_turn(generation, transcription.text).await
            },
        }
    }

    /// Run a typed utterance through generation and synthesis
    ///
    /// Only accepted in `Idle`; otherwise a logged no-op. Blank text ends
    /// with `TurnOutcome::Empty` without calling the model.
    ///
    /// # Errors
    ///
    /// The failing stage's error; the state returns to `Idle`.
    #[instrument(skip(self, transcript), fields(text_len = transcript.len()))]
    pub async fn submit_user_utterance(
        &self,
        transcript: &str,
    ) -> Result<TurnOutcome, PipelineError> {
        let generation = match self.start_traversal(PipelineState::Generating) {
            Ok(generation) => generation,
            Err(rejection) => {
                warn!(?rejection, "Utterance rejected");
                return Ok(TurnOutcome::Rejected(rejection));
            },
        };
        self.run_turn(generation, transcript.to_string()).await
    }

    /// Claim the pipeline from `Idle` for a new traversal
    fn start_traversal(&self, first: PipelineState) -> Result<u64, Rejection> {
        let mut state = self.state.lock();
        if self.is_closed() {
            return Err(Rejection::Closed);
        }
        if *state != PipelineState::Idle {
            return Err(Rejection::Busy(*state));
        }
        *state = first;
        Ok(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Move to `next` if `generation` is still current
    fn advance(&self, generation: u64, next: PipelineState) -> bool {
        let mut state = self.state.lock();
        if self.generation() != generation {
            return false;
        }
        debug!(from = %*state, to = %next, "Pipeline state change");
        *state = next;
        true
    }

    fn fail(&self, generation: u64, error: PipelineError) -> Result<TurnOutcome, PipelineError> {
        if self.advance(generation, PipelineState::Idle) {
            warn!(error = %error, stage = ?error.failed_in(), "Pipeline stage failed");
            Err(error)
        } else {
            debug!(error = %error, "Dropping error of an abandoned traversal");
            Ok(TurnOutcome::Discarded)
        }
    }

    async fn run_turn(
        &self,
        generation: u64,
        transcript: String,
    ) -> Result<TurnOutcome, PipelineError> {
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            if !self.advance(generation, PipelineState::Idle) {
                return Ok(TurnOutcome::Discarded);
            }
            debug!("Blank utterance, skipping generation");
            return Ok(TurnOutcome::Empty);
        }

        // The model works on a copy so an abandoned traversal leaves the
        // conversation untouched
        let mut history = self.history.lock().clone();
        let result = self.model.converse(&mut history, &transcript).await;
        {
            let _state = self.state.lock();
            if self.generation() != generation {
                debug!("Dropping reply of an abandoned traversal");
                return Ok(TurnOutcome::Discarded);
            }
            // Kept on failure too: the user turn stays recorded
            *self.history.lock() = history;
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => return self.fail(generation, PipelineError::Generation(e)),
        };
        info!(reply_len = reply.len(), "Reply generated");

        let audio = match (&self.tts, self.config.synthesize_replies) {
            (Some(tts), true) => {
                if !self.advance(generation, PipelineState::Synthesizing) {
                    return Ok(TurnOutcome::Discarded);
                }
                let audio = match tts.synthesize(&reply).await {
                    Ok(audio) => audio,
                    Err(e) => return self.fail(generation, PipelineError::Synthesis(e)),
                };
                if self.generation() != generation {
                    return Ok(TurnOutcome::Discarded);
                }
                if let Some(playback) = &self.playback
                    && let Err(e) = playback.play(Arc::clone(&audio)).await
                {
                    return self.fail(generation, e.into());
                }
                Some(audio)
            },
            _ => None,
        };

        if !self.advance(generation, PipelineState::Idle) {
            return Ok(TurnOutcome::Discarded);
        }
        Ok(TurnOutcome::Completed(Turn {
            transcript,
            reply,
            audio,
        }))
    }
}
