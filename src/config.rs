//! Configuration loading for catchword.

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub stt: SttConfig,
    pub matcher: MatcherConfig,
    pub run: RunConfig,
}

/// External filter engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or command name of the ffmpeg executable. Resolved and verified
    /// once at startup; a run is never served with an unresolved engine.
    pub ffmpeg_path: String,
    /// Per-invocation timeout in seconds.
    pub timeout_secs: u64,
}

/// Transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    /// Language hint passed to every backend (e.g. "he-IL", "en-US").
    pub language: String,
    /// Enabled backends, in report order. Known ids: "google", "whisper".
    pub backends: Vec<String>,
    /// Per-call timeout in seconds; a timeout counts as backend failure.
    pub timeout_secs: u64,
    pub google: GoogleConfig,
    pub recognizer: RecognizerSettings,
    pub whisper: WhisperSettings,
}

/// Network speech backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoogleConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Client-side recognition tuning, applied as utterance trimming before
/// audio is handed to a backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognizerSettings {
    /// RMS energy below which a frame counts as silence.
    pub energy_threshold: f32,
    /// Recalibrate the energy threshold from the ambient window.
    pub dynamic_energy: bool,
    /// Leading milliseconds sampled for the ambient noise estimate.
    pub ambient_window_ms: u32,
    /// Seconds of trailing silence before an utterance is considered complete.
    pub pause_threshold: f32,
    /// Seconds of silence retained on either side of the utterance.
    pub non_speaking_duration: f32,
}

/// Local whisper backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WhisperSettings {
    pub model_path: PathBuf,
    /// Number of inference threads (None = auto-detect).
    pub threads: Option<usize>,
}

/// Fuzzy matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    /// Keyword vocabulary; empty disables matching.
    pub vocabulary: Vec<String>,
    /// Minimum similarity score (0–100) for a match to be reported.
    pub threshold: u8,
}

/// Per-run behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Root under which timestamped run directories are created.
    pub output_dir: PathBuf,
    pub pad_leading_ms: u32,
    pub pad_trailing_ms: u32,
    /// Bounded pool size for filter invocations (0 = available CPU cores).
    pub filter_jobs: usize,
    /// Bounded pool size for transcription calls.
    pub transcribe_jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            timeout_secs: defaults::FILTER_TIMEOUT_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            backends: vec!["google".to_string()],
            timeout_secs: defaults::STT_TIMEOUT_SECS,
            google: GoogleConfig::default(),
            recognizer: RecognizerSettings::default(),
            whisper: WhisperSettings::default(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::GOOGLE_SPEECH_ENDPOINT.to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            energy_threshold: defaults::ENERGY_THRESHOLD,
            dynamic_energy: true,
            ambient_window_ms: defaults::AMBIENT_WINDOW_MS,
            pause_threshold: defaults::PAUSE_THRESHOLD_SECS,
            non_speaking_duration: defaults::NON_SPEAKING_SECS,
        }
    }
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-small.bin"),
            threads: None,
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vec::new(),
            threshold: defaults::MATCH_THRESHOLD,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            pad_leading_ms: defaults::PAD_LEADING_MS,
            pad_trailing_ms: defaults::PAD_TRAILING_MS,
            filter_jobs: 0,
            transcribe_jobs: defaults::TRANSCRIBE_JOBS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Err(crate::error::CatchwordError::ConfigFileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot work.
    fn validate(&self) -> crate::error::Result<()> {
        if self.matcher.threshold > 100 {
            return Err(crate::error::CatchwordError::ConfigInvalidValue {
                key: "matcher.threshold".to_string(),
                message: format!("{} is out of the 0-100 score range", self.matcher.threshold),
            });
        }
        if self.run.transcribe_jobs == 0 {
            return Err(crate::error::CatchwordError::ConfigInvalidValue {
                key: "run.transcribe_jobs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from a file, or return defaults if the file does
    /// not exist. Invalid TOML still errors.
    pub fn load_or_default(path: &Path) -> crate::error::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CATCHWORD_FFMPEG → engine.ffmpeg_path
    /// - CATCHWORD_LANGUAGE → stt.language
    /// - CATCHWORD_GOOGLE_KEY → stt.google.api_key
    /// - CATCHWORD_OUTPUT_DIR → run.output_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("CATCHWORD_FFMPEG")
            && !path.is_empty()
        {
            self.engine.ffmpeg_path = path;
        }

        if let Ok(language) = std::env::var("CATCHWORD_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(key) = std::env::var("CATCHWORD_GOOGLE_KEY")
            && !key.is_empty()
        {
            self.stt.google.api_key = key;
        }

        if let Ok(dir) = std::env::var("CATCHWORD_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.run.output_dir = PathBuf::from(dir);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/catchword/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("catchword")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.ffmpeg_path, "ffmpeg");
        assert_eq!(config.engine.timeout_secs, 60);
        assert_eq!(config.stt.language, "he-IL");
        assert_eq!(config.stt.backends, vec!["google".to_string()]);
        assert_eq!(config.matcher.threshold, 80);
        assert!(config.matcher.vocabulary.is_empty());
        assert_eq!(config.run.pad_leading_ms, 500);
        assert_eq!(config.run.transcribe_jobs, 4);
        assert_eq!(config.run.filter_jobs, 0);
    }

    #[test]
    fn recognizer_defaults_match_reference_client() {
        let settings = RecognizerSettings::default();
        assert_eq!(settings.energy_threshold, 300.0);
        assert!(settings.dynamic_energy);
        assert_eq!(settings.pause_threshold, 0.4);
        assert_eq!(settings.non_speaking_duration, 0.1);
        assert_eq!(settings.ambient_window_ms, 500);
    }

    #[test]
    fn load_parses_partial_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[stt]
language = "en-US"
backends = ["google", "whisper"]

[matcher]
vocabulary = ["jerusalem", "tel aviv"]
threshold = 75
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.stt.language, "en-US");
        assert_eq!(config.stt.backends.len(), 2);
        assert_eq!(config.matcher.threshold, 75);
        assert_eq!(config.matcher.vocabulary.len(), 2);
        // Untouched sections fall back to defaults
        assert_eq!(config.engine.ffmpeg_path, "ffmpeg");
        assert_eq!(config.run.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "engine = not toml").unwrap();
        file.flush().unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn load_reports_missing_file_explicitly() {
        let err = Config::load(Path::new("/nonexistent/catchword.toml")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CatchwordError::ConfigFileNotFound { .. }
        ));
    }

    #[test]
    fn load_rejects_out_of_range_threshold() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[matcher]\nthreshold = 150").unwrap();
        file.flush().unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CatchwordError::ConfigInvalidValue { .. }
        ));
    }

    #[test]
    fn load_or_default_returns_defaults_for_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/catchword.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, parsed);
    }
}
