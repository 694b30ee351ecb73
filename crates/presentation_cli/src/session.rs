//! Wiring of providers into an orchestrator, and the two ways of talking to it

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_core::{LanguageModel, build_language_model};
use ai_speech::audio::read_wav_file;
use ai_speech::{
    CaptureSession, ReplayCaptureDevice, build_speech_to_text, build_text_to_speech,
};
use anyhow::Context;
use application::{CaptureStart, InteractionOrchestrator, TurnOutcome};
use domain::SpeechSample;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::playback::WavDirectorySink;

/// Orchestrator with a language model and, when enabled, synthesis
///
/// Replies are written to `reply_dir` when one is given.
pub fn text_pipeline(
    config: &AppConfig,
    reply_dir: Option<&Path>,
) -> anyhow::Result<InteractionOrchestrator> {
    let model: Arc<dyn LanguageModel> = Arc::from(
        build_language_model(config.inference.clone())
            .context("failed to set up the language model")?,
    );
    let mut orchestrator = InteractionOrchestrator::new(config.pipeline.clone(), model)?;

    if config.pipeline.synthesize_replies {
        let tts = build_text_to_speech(&config.speech.tts)
            .context("failed to set up speech synthesis")?;
        orchestrator = orchestrator.with_tts(tts);

        if let Some(dir) = reply_dir {
            let sink = WavDirectorySink::new(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
            info!(dir = %sink.dir().display(), "Writing replies to disk");
            orchestrator = orchestrator.with_playback(Arc::new(sink));
        }
    }
    Ok(orchestrator)
}

/// [`text_pipeline`] plus recognition of samples fed through `device`
pub fn voice_pipeline(
    config: &AppConfig,
    device: Arc<ReplayCaptureDevice>,
    reply_dir: Option<&Path>,
) -> anyhow::Result<InteractionOrchestrator> {
    let stt = build_speech_to_text(&config.speech.stt)
        .context("failed to set up speech recognition")?;
    let session = CaptureSession::new(device, stt, &config.speech.stt);
    Ok(text_pipeline(config, reply_dir)?.with_input(Arc::new(session)))
}

/// Send one message and print the reply
pub async fn chat_once(orchestrator: &InteractionOrchestrator, message: &str) -> anyhow::Result<()> {
    let outcome = orchestrator.submit_user_utterance(message).await?;
    report(&outcome);
    Ok(())
}

/// Read messages from stdin until EOF or `/quit`
///
/// A failed turn is printed and the loop continues; the pipeline is back in
/// `Idle` after every error.
pub async fn chat_loop(orchestrator: &InteractionOrchestrator) -> anyhow::Result<()> {
    println!("💬 Type a message. /reset clears the conversation, /quit leaves.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => match orchestrator.reset_conversation() {
                Ok(()) => println!("🧹 Conversation cleared"),
                Err(reason) => println!("⏳ Reset rejected ({reason:?})"),
            },
            "" => {},
            message => {
                if let Err(e) = chat_once(orchestrator, message).await {
                    eprintln!("❌ {e:#}");
                }
            },
        }
    }

    orchestrator.close();
    Ok(())
}

/// Run each WAV file as one spoken turn of the same conversation
pub async fn converse_files(
    config: &AppConfig,
    inputs: &[PathBuf],
    reply_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let device = Arc::new(ReplayCaptureDevice::empty());
    let orchestrator = voice_pipeline(config, Arc::clone(&device), reply_dir)?;

    for input in inputs {
        let audio =
            read_wav_file(input).with_context(|| format!("cannot read {}", input.display()))?;
        debug!(
            path = %input.display(),
            sample_rate = audio.sample_rate(),
            channels = audio.channels(),
            duration_ms = audio.duration_ms(),
            "Loaded recording"
        );
        let sample = SpeechSample::new(audio.channels(), audio.sample_rate(), audio.samples().to_vec())?;
        device.load(sample);

        println!("🎙️  {}", input.display());
        if let CaptureStart::Rejected(reason) = orchestrator.begin_capture()? {
            anyhow::bail!("capture was rejected: {reason:?}");
        }
        let outcome = orchestrator.end_capture().await?;
        report(&outcome);
    }

    orchestrator.close();
    Ok(())
}

fn report(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Completed(turn) => {
            println!("🗣️  {}", turn.transcript);
            println!("🤖 {}", turn.reply);
            if let Some(audio) = &turn.audio {
                println!("🔊 {} ms of reply audio", audio.duration_ms());
            }
        },
        TurnOutcome::NoSpeech(reason) => println!("🔇 No speech detected ({reason:?})"),
        TurnOutcome::Empty => {},
        TurnOutcome::Rejected(reason) => println!("⏳ Request rejected ({reason:?})"),
        TurnOutcome::Discarded => println!("🗑️  Turn discarded"),
    }
}
