//! Local audio processing: WAV codec, voice gate and decoder

pub mod decoder;
pub mod vad;
pub mod wav;

pub use decoder::{AudioDecoder, SymphoniaDecoder};
pub use vad::{EnergyGate, VoiceActivity};
pub use wav::{
    WavInfo, decode_wav, encode_sample, encode_wav, inspect_wav, read_wav_file, write_wav_file,
};
