//! Value objects

mod pipeline_state;
mod speech_sample;

pub use pipeline_state::PipelineState;
pub use speech_sample::SpeechSample;
