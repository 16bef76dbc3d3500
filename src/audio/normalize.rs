//! Amplitude normalization for in-memory audio buffers.

use crate::audio::asset::AudioBuffer;
use crate::defaults::NORMALIZE_PEAK;

/// Rescale the buffer so its peak amplitude hits the target fraction of
/// the i16 range. A silent buffer is returned unchanged.
pub fn normalize(input: &AudioBuffer) -> AudioBuffer {
    normalize_to(input, NORMALIZE_PEAK)
}

/// Peak-normalize to an explicit target (0.0..=1.0 of full scale).
pub fn normalize_to(input: &AudioBuffer, target: f32) -> AudioBuffer {
    let peak = input
        .samples
        .iter()
        .map(|&s| (s as i32).unsigned_abs())
        .max()
        .unwrap_or(0);

    if peak == 0 {
        return input.clone();
    }

    let gain = (target * i16::MAX as f32) / peak as f32;
    let samples = input
        .samples
        .iter()
        .map(|&s| {
            let scaled = s as f32 * gain;
            scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect();

    AudioBuffer {
        samples,
        sample_rate: input.sample_rate,
        channels: input.channels,
    }
}
