//! Silence padding around a waveform.

use crate::audio::asset::AudioBuffer;

/// Return a new buffer with `leading_ms` of silence before and `trailing_ms`
/// after the source, preserving sample rate and channel count.
pub fn pad(input: &AudioBuffer, leading_ms: u32, trailing_ms: u32) -> AudioBuffer {
    let frames_per_ms = input.sample_rate as usize * input.channels as usize / 1000;
    let leading = frames_per_ms * leading_ms as usize;
    let trailing = frames_per_ms * trailing_ms as usize;

    let mut samples = Vec::with_capacity(leading + input.samples.len() + trailing);
    samples.resize(leading, 0);
    samples.extend_from_slice(&input.samples);
    samples.resize(samples.len() + trailing, 0);

    AudioBuffer {
        samples,
        sample_rate: input.sample_rate,
        channels: input.channels,
    }
}
