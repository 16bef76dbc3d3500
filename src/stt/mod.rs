//! Speech-to-text backends.

pub mod backend;
pub mod google;
pub mod whisper;

pub use backend::{MockBackend, SttBackend, Transcription, extract_utterance};
pub use google::GoogleSpeechBackend;
pub use whisper::WhisperBackend;
