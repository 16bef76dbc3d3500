//! Audio asset handling: WAV decode/encode and format conversion.

use crate::defaults::SAMPLE_RATE;
use crate::error::{CatchwordError, Result};
use std::path::{Path, PathBuf};

/// A named audio file produced or consumed by the pipeline.
///
/// Assets are created once and treated as read-only afterwards; every
/// enhancement step writes a new asset instead of mutating its input.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    label: String,
    path: PathBuf,
}

impl AudioAsset {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }

    /// Deterministic human-readable variant label (also the filename stem).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the asset into memory.
    pub fn load(&self) -> Result<AudioBuffer> {
        AudioBuffer::load(&self.path)
    }
}

/// Decoded PCM audio held in memory as 16-bit samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    /// Decode a WAV file. Supports 16-bit integer and 32-bit float PCM.
    pub fn load(path: &Path) -> Result<Self> {
        let unreadable = |message: String| CatchwordError::InputUnreadable {
            path: path.display().to_string(),
            message,
        };

        let mut reader = hound::WavReader::open(path)
            .map_err(|e| unreadable(format!("failed to parse WAV: {}", e)))?;
        let spec = reader.spec();

        let samples: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .samples::<i16>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| unreadable(format!("failed to read samples: {}", e)))?,
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| unreadable(format!("failed to read samples: {}", e)))?,
        };

        if samples.is_empty() {
            return Err(unreadable("no audio samples".to_string()));
        }

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Encode the buffer as 16-bit PCM WAV at `path`.
    pub fn store(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| CatchwordError::Other(format!("failed to create WAV writer: {}", e)))?;
        for &sample in &self.samples {
            writer
                .write_sample(sample)
                .map_err(|e| CatchwordError::Other(format!("failed to write sample: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| CatchwordError::Other(format!("failed to finalize WAV: {}", e)))?;
        Ok(())
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Mix down to mono and resample to the working rate (16kHz).
    ///
    /// Speech backends expect 16kHz mono; enhanced variants may carry other
    /// rates (the re-encode variants deliberately do).
    pub fn to_mono_16k(&self) -> Vec<i16> {
        let mono: Vec<i16> = if self.channels == 2 {
            self.samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else if self.channels > 2 {
            let ch = self.channels as usize;
            self.samples
                .chunks_exact(ch)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / ch as i32) as i16
                })
                .collect()
        } else {
            self.samples.clone()
        };

        resample(&mono, self.sample_rate, SAMPLE_RATE)
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos as usize;
            let frac = src_pos - idx as f64;

            if idx + 1 < samples.len() {
                let a = samples[idx] as f64;
                let b = samples[idx + 1] as f64;
                (a + (b - a) * frac) as i16
            } else {
                samples[samples.len() - 1]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) fn sine_buffer(sample_rate: u32, channels: u16, secs: f32) -> AudioBuffer {
        let frames = (sample_rate as f32 * secs) as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let value = (8000.0 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()) as i16;
            for _ in 0..channels {
                samples.push(value);
            }
        }
        AudioBuffer {
            samples,
            sample_rate,
            channels,
        }
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let buffer = sine_buffer(16000, 1, 0.5);
        buffer.store(&path).unwrap();

        let loaded = AudioBuffer::load(&path).unwrap();
        assert_eq!(loaded.sample_rate, 16000);
        assert_eq!(loaded.channels, 1);
        assert_eq!(loaded.samples, buffer.samples);
    }

    #[test]
    fn load_rejects_non_wav_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a wav file").unwrap();

        let err = AudioBuffer::load(&path).unwrap_err();
        assert!(matches!(err, CatchwordError::InputUnreadable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = AudioBuffer::load(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, CatchwordError::InputUnreadable { .. }));
    }

    #[test]
    fn duration_accounts_for_channels() {
        let mono = sine_buffer(16000, 1, 1.0);
        let stereo = sine_buffer(16000, 2, 1.0);
        assert!((mono.duration_secs() - 1.0).abs() < 0.01);
        assert!((stereo.duration_secs() - 1.0).abs() < 0.01);
    }

    #[test]
    fn to_mono_16k_mixes_stereo_down() {
        let stereo = AudioBuffer {
            samples: vec![100, 300, -200, -400],
            sample_rate: 16000,
            channels: 2,
        };
        assert_eq!(stereo.to_mono_16k(), vec![200, -300]);
    }

    #[test]
    fn to_mono_16k_resamples_higher_rates() {
        let buffer = sine_buffer(44100, 1, 1.0);
        let converted = buffer.to_mono_16k();
        // Roughly one second at 16kHz
        assert!((converted.len() as i64 - 16000).unsigned_abs() < 100);
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let samples = vec![1, 2, 3, 4];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_halves_length_when_downsampling_by_two() {
        let samples: Vec<i16> = (0..1000).map(|i| (i % 100) as i16).collect();
        let out = resample(&samples, 32000, 16000);
        assert!((out.len() as i64 - 500).unsigned_abs() <= 1);
    }

    #[test]
    fn asset_exposes_label_and_path() {
        let asset = AudioAsset::new("original", "/tmp/run/original.wav");
        assert_eq!(asset.label(), "original");
        assert_eq!(asset.path(), Path::new("/tmp/run/original.wav"));
    }
}
