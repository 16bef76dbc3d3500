//! Error types for catchword.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatchwordError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Filter engine errors
    #[error("Filter engine not usable at {path}: {message}")]
    EngineNotFound { path: String, message: String },

    #[error("Filter failed for variant {label}: {message}")]
    FilterFailure { label: String, message: String },

    #[error("Enhancement chain {chain} abandoned at step {step}")]
    ChainAbandoned { chain: String, step: String },

    // Source asset errors — the only fatal ones per run
    #[error("Source asset unreadable at {path}: {message}")]
    InputUnreadable { path: String, message: String },

    // Transcription backend errors
    #[error("Backend {backend} unavailable: {message}")]
    BackendUnavailable { backend: String, message: String },

    // Archive errors
    #[error("Archive operation failed: {message}")]
    Archive { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl CatchwordError {
    /// Fatal errors abort the whole run; everything else drops a single
    /// variant or (variant, backend) pairing and is absorbed at the
    /// component boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CatchwordError::InputUnreadable { .. } | CatchwordError::EngineNotFound { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CatchwordError>;
