//! Hearth speech crate - voice capture and speech synthesis controllers.
//!
//! Platform speech engines are reached through two capability traits,
//! [`SpeechInput`] and [`SpeechOutput`], so the controllers never touch a
//! global device handle and can be driven by fakes in tests.

pub mod error;
pub mod fake;
pub mod input;
pub mod output;
pub mod say;
pub mod state;

pub use error::SpeechError;
pub use fake::{RecordingSpeechOutput, ScriptedCapture, ScriptedSpeechInput, UnsupportedSpeechInput};
pub use input::{CaptureOptions, SpeechInput, SpeechInputController};
pub use output::{select_voice, SpeechOutput, SpeechOutputController, Utterance, VoiceInfo};
pub use say::SayCommandOutput;
pub use state::CaptureState;
