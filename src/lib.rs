//! catchword - recover a known phrase from a noisy recording
//!
//! Expands one voice recording into a set of differently-enhanced variants,
//! transcribes each variant against every enabled speech backend, and fuzzy-
//! matches the results against a fixed keyword vocabulary.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod archive;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod enhance;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod run;
pub mod server;
pub mod stt;

// Core boundary traits (engine → variants → backends → matcher)
pub use filter::{FfmpegEngine, FilterEngine, MockFilterEngine};
pub use stt::backend::{MockBackend, SttBackend, Transcription};

// Pipeline
pub use run::{Orchestrator, RunOutcome, RunPhase};

// Matching
pub use matcher::{KeywordMatcher, MatchResult};

// Error handling
pub use error::{CatchwordError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
