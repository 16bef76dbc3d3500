//! Default configuration constants for catchword.
//!
//! Shared across configuration types so the documented defaults live in one
//! place. None of these values carry a correctness claim — they are the
//! reference behavior's values, kept configurable.

/// Working sample rate in Hz for in-memory processing and local transcription.
///
/// 16kHz mono is the standard for speech recognition; all decoded buffers are
/// converted to this rate before transcription.
pub const SAMPLE_RATE: u32 = 16000;

/// Default fuzzy-match acceptance threshold (0–100).
///
/// A candidate scoring exactly at the threshold is accepted; one point below
/// is rejected.
pub const MATCH_THRESHOLD: u8 = 80;

/// Default leading silence padding in milliseconds.
pub const PAD_LEADING_MS: u32 = 500;

/// Default trailing silence padding in milliseconds.
pub const PAD_TRAILING_MS: u32 = 500;

/// Peak amplitude target for level normalization, as a fraction of i16 range.
///
/// 0.95 leaves ~0.45 dB of headroom so the rescaled waveform never clips.
pub const NORMALIZE_PEAK: f32 = 0.95;

/// Default per-call timeout for the external filter engine, in seconds.
pub const FILTER_TIMEOUT_SECS: u64 = 60;

/// Default per-call timeout for a transcription backend, in seconds.
///
/// Timeout is treated identically to backend failure: empty text for that
/// one (variant, backend) pairing, plus a logged warning.
pub const STT_TIMEOUT_SECS: u64 = 120;

/// Default concurrency limit for transcription calls.
///
/// Transcription is network/IO-bound; this bounds in-flight requests so
/// external services are not hammered. Excess work queues rather than fails.
pub const TRANSCRIBE_JOBS: usize = 4;

/// Default language hint passed to transcription backends.
pub const DEFAULT_LANGUAGE: &str = "he-IL";

/// Energy threshold for utterance detection (RMS over i16 samples).
///
/// Frames below this level count as silence unless `dynamic_energy`
/// recalibrates the threshold from the ambient window.
pub const ENERGY_THRESHOLD: f32 = 300.0;

/// Seconds of trailing silence before an utterance is considered complete.
pub const PAUSE_THRESHOLD_SECS: f32 = 0.4;

/// Seconds of silence kept on either side of a detected utterance.
pub const NON_SPEAKING_SECS: f32 = 0.1;

/// Milliseconds of leading audio sampled to estimate ambient noise level
/// when `dynamic_energy` is enabled.
pub const AMBIENT_WINDOW_MS: u32 = 500;

/// Default endpoint for the network speech backend.
///
/// This is the public v2 recognize endpoint the reference client library
/// talks to; override it in config to point at a private deployment.
pub const GOOGLE_SPEECH_ENDPOINT: &str = "http://www.google.com/speech-api/v2/recognize";
