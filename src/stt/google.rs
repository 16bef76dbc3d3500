//! Network speech backend.
//!
//! Posts WAV audio to a speech-recognition HTTP endpoint (by default the
//! public v2 recognize endpoint) and parses its line-delimited JSON answer.
//! A "no speech" answer maps to an empty transcription; transport and HTTP
//! failures map to [`CatchwordError::BackendUnavailable`], which the caller
//! absorbs as empty text for that one (variant, backend) pairing. No
//! automatic retries — retrying the whole run is the caller's decision.

use crate::audio::asset::AudioAsset;
use crate::config::{GoogleConfig, RecognizerSettings};
use crate::defaults::SAMPLE_RATE;
use crate::error::{CatchwordError, Result};
use crate::stt::backend::{SttBackend, Transcription, extract_utterance};
use async_trait::async_trait;
use std::io::Cursor;
use tracing::debug;

pub struct GoogleSpeechBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    recognizer: RecognizerSettings,
}

impl std::fmt::Debug for GoogleSpeechBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechBackend")
            .field("endpoint", &self.endpoint)
            .field("recognizer", &self.recognizer)
            .finish_non_exhaustive()
    }
}

impl GoogleSpeechBackend {
    pub fn new(config: &GoogleConfig, recognizer: RecognizerSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            recognizer,
        }
    }

    fn unavailable(&self, message: String) -> CatchwordError {
        CatchwordError::BackendUnavailable {
            backend: self.id().to_string(),
            message,
        }
    }

    /// Encode 16kHz mono samples as an in-memory WAV payload.
    fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| CatchwordError::Other(format!("failed to encode WAV: {}", e)))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| CatchwordError::Other(format!("failed to encode WAV: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| CatchwordError::Other(format!("failed to encode WAV: {}", e)))?;
        }
        Ok(cursor.into_inner())
    }
}

/// Parse the v2 recognize response: one JSON object per line, where the
/// first line with a non-empty `result` array carries the transcript.
/// `{"result":[]}` alone means no speech was understood.
pub fn parse_recognize_response(body: &str) -> Option<(String, Option<f32>)> {
    for line in body.lines() {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        let Some(results) = value.get("result").and_then(|r| r.as_array()) else {
            continue;
        };
        if results.is_empty() {
            continue;
        }
        let alternative = results[0].get("alternative")?.as_array()?.first()?;
        let transcript = alternative.get("transcript")?.as_str()?.to_string();
        let confidence = alternative
            .get("confidence")
            .and_then(|c| c.as_f64())
            .map(|c| c as f32);
        return Some((transcript, confidence));
    }
    None
}

#[async_trait]
impl SttBackend for GoogleSpeechBackend {
    fn id(&self) -> &str {
        "google-speech"
    }

    async fn transcribe(&self, asset: &AudioAsset, language: &str) -> Result<Transcription> {
        let buffer = asset
            .load()
            .map_err(|e| self.unavailable(format!("asset not decodable: {}", e)))?;
        let samples = buffer.to_mono_16k();
        let utterance = extract_utterance(&samples, &self.recognizer, SAMPLE_RATE);

        if utterance.is_empty() {
            debug!(variant = asset.label(), "no utterance detected client-side");
            return Ok(Transcription::no_speech());
        }

        let payload = Self::encode_wav(&utterance)?;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "catchword"),
                ("lang", language),
                ("key", self.api_key.as_str()),
            ])
            .header("Content-Type", "audio/wav; rate=16000")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.unavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(self.unavailable(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("failed to read response: {}", e)))?;

        match parse_recognize_response(&body) {
            Some((text, confidence)) => Ok(Transcription::new(text.trim(), confidence)),
            None => Ok(Transcription::no_speech()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transcript_with_confidence() {
        let body = r#"{"result":[]}
{"result":[{"alternative":[{"transcript":"ירושלים","confidence":0.92}],"final":true}],"result_index":0}"#;
        let (text, confidence) = parse_recognize_response(body).unwrap();
        assert_eq!(text, "ירושלים");
        assert!((confidence.unwrap() - 0.92).abs() < 1e-6);
    }

    #[test]
    fn parses_transcript_without_confidence() {
        let body = r#"{"result":[{"alternative":[{"transcript":"tel aviv"}]}]}"#;
        let (text, confidence) = parse_recognize_response(body).unwrap();
        assert_eq!(text, "tel aviv");
        assert!(confidence.is_none());
    }

    #[test]
    fn empty_result_array_is_no_speech() {
        assert!(parse_recognize_response(r#"{"result":[]}"#).is_none());
    }

    #[test]
    fn blank_body_is_no_speech() {
        assert!(parse_recognize_response("").is_none());
        assert!(parse_recognize_response("\n\n").is_none());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let body = "not json\n{\"result\":[{\"alternative\":[{\"transcript\":\"ok\"}]}]}";
        let (text, _) = parse_recognize_response(body).unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn encode_wav_produces_riff_header() {
        let payload = GoogleSpeechBackend::encode_wav(&[0, 1000, -1000, 0]).unwrap();
        assert_eq!(&payload[..4], b"RIFF");
        assert_eq!(&payload[8..12], b"WAVE");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_backend_unavailable() {
        let backend = GoogleSpeechBackend::new(
            &GoogleConfig {
                // Reserved TEST-NET-1 address: connection always fails fast-ish
                endpoint: "http://192.0.2.1:9/recognize".to_string(),
                api_key: String::new(),
            },
            RecognizerSettings::default(),
        );

        // Asset that does not decode: fails before any network activity
        let asset = AudioAsset::new("original", "/nonexistent/original.wav");
        let err = backend.transcribe(&asset, "he-IL").await.unwrap_err();
        assert!(matches!(err, CatchwordError::BackendUnavailable { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn backend_id_is_stable() {
        let backend = GoogleSpeechBackend::new(&GoogleConfig::default(), RecognizerSettings::default());
        assert_eq!(backend.id(), "google-speech");
    }
}
