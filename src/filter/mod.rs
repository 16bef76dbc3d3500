//! External audio-filter engine boundary.
//!
//! The engine is invoked as `<ffmpeg> -y -i <input> -af <expression> <output>`.
//! Success means exit code zero and a non-empty output file; anything else is
//! a [`CatchwordError::FilterFailure`] that the caller absorbs by dropping the
//! attempted variant. Engine failures are assumed deterministic for the same
//! input and expression, so there are no retries.

use crate::error::{CatchwordError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

/// Boundary trait over the external filter engine, so variant construction
/// can be exercised without ffmpeg installed.
#[async_trait]
pub trait FilterEngine: Send + Sync {
    /// Transform `input` into `output` according to a declarative filter
    /// expression the engine understands.
    async fn apply(&self, input: &Path, expression: &str, output: &Path) -> Result<()>;
}

/// ffmpeg-backed filter engine.
///
/// The executable location is an explicit constructor argument, resolved and
/// verified once during process initialization — never discovered or patched
/// mid-run.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    executable: PathBuf,
    timeout: Duration,
}

impl FfmpegEngine {
    /// Verify that `executable` runs and answers `-version`, then construct
    /// the engine. Called once at startup; failure means the process must not
    /// serve any run.
    pub fn resolve(executable: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let executable = executable.into();
        let probe = std::process::Command::new(&executable)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match probe {
            Ok(status) if status.success() => {
                debug!(path = %executable.display(), "filter engine resolved");
                Ok(Self {
                    executable,
                    timeout,
                })
            }
            Ok(status) => Err(CatchwordError::EngineNotFound {
                path: executable.display().to_string(),
                message: format!("probe exited with {}", status),
            }),
            Err(e) => Err(CatchwordError::EngineNotFound {
                path: executable.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn failure(output: &Path, message: String) -> CatchwordError {
        let label = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        CatchwordError::FilterFailure { label, message }
    }
}

#[async_trait]
impl FilterEngine for FfmpegEngine {
    async fn apply(&self, input: &Path, expression: &str, output: &Path) -> Result<()> {
        let mut command = tokio::process::Command::new(&self.executable);
        command
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-af")
            .arg(expression)
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        debug!(input = %input.display(), expression, "running filter engine");

        let status = tokio::time::timeout(self.timeout, async {
            command
                .status()
                .await
                .map_err(|e| Self::failure(output, format!("failed to spawn engine: {}", e)))
        })
        .await
        .map_err(|_| {
            Self::failure(
                output,
                format!("engine timed out after {:?}", self.timeout),
            )
        })??;

        if !status.success() {
            return Err(Self::failure(
                output,
                format!("engine exited with {}", status),
            ));
        }

        // ffmpeg can exit zero without producing usable output (e.g. when the
        // output path is unwritable); an absent or empty file is a failure.
        match std::fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(Self::failure(output, "engine wrote empty output".into())),
            Err(e) => Err(Self::failure(
                output,
                format!("engine produced no output: {}", e),
            )),
        }
    }
}

/// Mock filter engine for testing variant construction without ffmpeg.
///
/// Copies input to output unchanged; expressions listed via
/// [`MockFilterEngine::failing_on`] fail instead, simulating a deterministic
/// engine error for that filter.
#[derive(Debug, Clone, Default)]
pub struct MockFilterEngine {
    failing_expressions: Vec<String>,
}

impl MockFilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any `apply` whose expression contains `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing_expressions.push(fragment.to_string());
        self
    }
}

#[async_trait]
impl FilterEngine for MockFilterEngine {
    async fn apply(&self, input: &Path, expression: &str, output: &Path) -> Result<()> {
        for fragment in &self.failing_expressions {
            if expression.contains(fragment.as_str()) {
                return Err(FfmpegEngine::failure(
                    output,
                    format!("simulated failure for '{}'", fragment),
                ));
            }
        }
        std::fs::copy(input, output).map_err(|e| {
            FfmpegEngine::failure(output, format!("failed to copy asset: {}", e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_fails_for_missing_executable() {
        let err = FfmpegEngine::resolve("/nonexistent/ffmpeg-binary", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, CatchwordError::EngineNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn resolve_fails_for_non_engine_executable() {
        // `false` runs but exits non-zero on any argument
        let result = FfmpegEngine::resolve("/bin/false", Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(CatchwordError::EngineNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mock_engine_copies_input_to_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"payload").unwrap();

        let engine = MockFilterEngine::new();
        engine.apply(&input, "afftdn=nf=-25", &output).await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn mock_engine_fails_on_configured_expression() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("denoise-weak.wav");
        std::fs::write(&input, b"payload").unwrap();

        let engine = MockFilterEngine::new().failing_on("afftdn");
        let err = engine
            .apply(&input, "afftdn=nf=-25", &output)
            .await
            .unwrap_err();

        match err {
            CatchwordError::FilterFailure { label, .. } => {
                assert_eq!(label, "denoise-weak");
            }
            other => panic!("expected FilterFailure, got {:?}", other),
        }
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn mock_engine_unrelated_expressions_still_succeed() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"payload").unwrap();

        let engine = MockFilterEngine::new().failing_on("afftdn");
        engine
            .apply(&input, "highpass=f=150,lowpass=f=3500", &output)
            .await
            .unwrap();
        assert!(output.exists());
    }
}
