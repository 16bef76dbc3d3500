//! Audio assets and in-memory waveform processing.

pub mod asset;
pub mod normalize;
pub mod pad;

pub use asset::{AudioAsset, AudioBuffer};
