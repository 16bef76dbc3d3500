//! Transcription backend trait and client-side recognition tuning.

use crate::audio::asset::AudioAsset;
use crate::config::RecognizerSettings;
use crate::error::{CatchwordError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// One backend's answer for one variant.
///
/// Empty text is a valid result meaning "no speech detected" — it is not an
/// error marker. Transport and backend errors surface as `Err` and are mapped
/// to empty text (plus a logged failure) by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcription {
    pub text: String,
    pub confidence: Option<f32>,
}

impl Transcription {
    pub fn new(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// "No speech understood" result.
    pub fn no_speech() -> Self {
        Self::default()
    }
}

/// A speech-to-text implementation: takes an asset, produces text.
///
/// Backends are interchangeable behind this trait; the orchestrator never
/// needs to know whether a backend is a network service or a local model.
#[async_trait]
pub trait SttBackend: Send + Sync {
    /// Stable identifier used in reports and logs (e.g. "google-speech").
    fn id(&self) -> &str;

    /// Transcribe one asset. `language` is a BCP-47-style hint ("he-IL").
    async fn transcribe(&self, asset: &AudioAsset, language: &str) -> Result<Transcription>;
}

/// Trim an audio buffer down to its detected utterance.
///
/// This is where the recognition tuning parameters act: `energy_threshold`
/// separates speech frames from silence (recalibrated from the leading
/// ambient window when `dynamic_energy` is on), `pause_threshold` ends the
/// utterance after that many seconds of trailing silence, and
/// `non_speaking_duration` keeps a little silence margin on both sides.
///
/// Returns an empty vector when no frame crosses the threshold.
pub fn extract_utterance(
    samples: &[i16],
    settings: &RecognizerSettings,
    sample_rate: u32,
) -> Vec<i16> {
    if samples.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let frame_len = (sample_rate as usize / 100).max(1); // 10ms frames
    let rms: Vec<f32> = samples
        .chunks(frame_len)
        .map(|frame| {
            let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
            (sum / frame.len() as f64).sqrt() as f32
        })
        .collect();

    let threshold = if settings.dynamic_energy {
        let ambient_frames =
            ((settings.ambient_window_ms as usize * sample_rate as usize / 1000) / frame_len)
                .clamp(1, rms.len());
        let ambient: f32 = rms[..ambient_frames].iter().sum::<f32>() / ambient_frames as f32;
        (ambient * 1.5).max(1.0)
    } else {
        settings.energy_threshold
    };

    let Some(first_voiced) = rms.iter().position(|&e| e >= threshold) else {
        return Vec::new();
    };

    // Utterance ends at the first silent run of pause_threshold seconds
    // after speech started.
    let pause_frames = ((settings.pause_threshold * 100.0) as usize).max(1);
    let mut last_voiced = first_voiced;
    let mut silent_run = 0usize;
    for (i, &e) in rms.iter().enumerate().skip(first_voiced) {
        if e >= threshold {
            last_voiced = i;
            silent_run = 0;
        } else {
            silent_run += 1;
            if silent_run >= pause_frames {
                break;
            }
        }
    }

    let margin_frames = (settings.non_speaking_duration * 100.0) as usize;
    let start_frame = first_voiced.saturating_sub(margin_frames);
    let end_frame = (last_voiced + margin_frames + 1).min(rms.len());

    let start = start_frame * frame_len;
    let end = (end_frame * frame_len).min(samples.len());
    samples[start..end].to_vec()
}

/// Mock backend for testing the orchestration layer.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    id: String,
    responses: HashMap<String, String>,
    default_response: String,
    unavailable: bool,
}

impl MockBackend {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// Return `text` for the variant with this label.
    pub fn with_response(mut self, label: &str, text: &str) -> Self {
        self.responses.insert(label.to_string(), text.to_string());
        self
    }

    /// Return `text` for every variant without a specific response.
    pub fn with_default_response(mut self, text: &str) -> Self {
        self.default_response = text.to_string();
        self
    }

    /// Fail every call with `BackendUnavailable`.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl SttBackend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn transcribe(&self, asset: &AudioAsset, _language: &str) -> Result<Transcription> {
        if self.unavailable {
            return Err(CatchwordError::BackendUnavailable {
                backend: self.id.clone(),
                message: "mock backend down".to_string(),
            });
        }
        let text = self
            .responses
            .get(asset.label())
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());
        Ok(Transcription::new(text, Some(0.9)))
    }
}
