//! Local whisper model backend.
//!
//! Requires the `whisper` feature (and cmake at build time). Without the
//! feature a stub is compiled that reports the backend as unavailable; the
//! orchestrator absorbs that like any other backend failure, so a build
//! without whisper still runs the full pipeline on the network backend.

use crate::audio::asset::AudioAsset;
use crate::config::WhisperSettings;
use crate::error::{CatchwordError, Result};
use crate::stt::backend::{SttBackend, Transcription};
use async_trait::async_trait;

#[cfg(feature = "whisper")]
use std::sync::Mutex;
#[cfg(feature = "whisper")]
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper-backed transcriber.
///
/// The model is loaded once at construction and shared across calls; each
/// transcription gets its own inference state.
#[cfg(feature = "whisper")]
pub struct WhisperBackend {
    context: Mutex<WhisperContext>,
    settings: WhisperSettings,
}

/// Whisper backend placeholder compiled without the `whisper` feature.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperBackend {
    settings: WhisperSettings,
}

/// Reduce a BCP-47-ish hint ("he-IL") to the bare language code whisper
/// expects ("he").
fn whisper_language(hint: &str) -> &str {
    hint.split('-').next().unwrap_or(hint)
}

#[cfg(feature = "whisper")]
impl WhisperBackend {
    pub fn new(settings: WhisperSettings) -> Result<Self> {
        if !settings.model_path.exists() {
            return Err(CatchwordError::BackendUnavailable {
                backend: "whisper".to_string(),
                message: format!("model not found at {}", settings.model_path.display()),
            });
        }

        let model_path = settings.model_path.to_str().ok_or_else(|| {
            CatchwordError::BackendUnavailable {
                backend: "whisper".to_string(),
                message: "invalid UTF-8 in model path".to_string(),
            }
        })?;

        let context =
            WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
                .map_err(|e| CatchwordError::BackendUnavailable {
                    backend: "whisper".to_string(),
                    message: format!("failed to load model: {}", e),
                })?;

        Ok(Self {
            context: Mutex::new(context),
            settings,
        })
    }

    fn transcribe_samples(&self, samples: &[i16], language: &str) -> Result<Transcription> {
        let audio: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

        let context = self
            .context
            .lock()
            .map_err(|e| CatchwordError::BackendUnavailable {
                backend: "whisper".to_string(),
                message: format!("context lock poisoned: {}", e),
            })?;

        let mut state =
            context
                .create_state()
                .map_err(|e| CatchwordError::BackendUnavailable {
                    backend: "whisper".to_string(),
                    message: format!("failed to create inference state: {}", e),
                })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(whisper_language(language)));
        if let Some(threads) = self.settings.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio)
            .map_err(|e| CatchwordError::BackendUnavailable {
                backend: "whisper".to_string(),
                message: format!("inference failed: {}", e),
            })?;

        let mut text = String::new();
        let mut confidence_sum = 0.0f32;
        let mut segments = 0u32;
        for segment in state.as_iter() {
            text.push_str(&segment.to_string());
            confidence_sum += 1.0 - segment.no_speech_probability();
            segments += 1;
        }

        let confidence = if segments > 0 {
            Some((confidence_sum / segments as f32).clamp(0.0, 1.0))
        } else {
            None
        };

        Ok(Transcription::new(text.trim(), confidence))
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperBackend {
    pub fn new(settings: WhisperSettings) -> Result<Self> {
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &WhisperSettings {
        &self.settings
    }
}

#[cfg(feature = "whisper")]
#[async_trait]
impl SttBackend for WhisperBackend {
    fn id(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, asset: &AudioAsset, language: &str) -> Result<Transcription> {
        let buffer = asset
            .load()
            .map_err(|e| CatchwordError::BackendUnavailable {
                backend: "whisper".to_string(),
                message: format!("asset not decodable: {}", e),
            })?;
        let samples = buffer.to_mono_16k();
        let language = language.to_string();

        // Inference is CPU-heavy; keep it off the async worker threads.
        tokio::task::block_in_place(|| self.transcribe_samples(&samples, &language))
    }
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl SttBackend for WhisperBackend {
    fn id(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, _asset: &AudioAsset, _language: &str) -> Result<Transcription> {
        Err(CatchwordError::BackendUnavailable {
            backend: "whisper".to_string(),
            message: "built without the whisper feature (cargo build --features whisper)"
                .to_string(),
        })
    }
}
