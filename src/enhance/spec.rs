//! Enhancement specifications and their filter expressions.
//!
//! Each enhancement is a closed tagged variant: kind × strength with
//! kind-specific numeric parameters. The mapping from spec to engine filter
//! expression is exhaustive, so adding a kind without an expression builder
//! fails to compile.

use std::fmt;

/// How aggressively an enhancement is parameterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    Weak,
    Strong,
}

impl Strength {
    pub const ALL: [Strength; 2] = [Strength::Weak, Strength::Strong];

    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Strong => "strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five enhancement kinds, in catalog (and chain) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnhancementKind {
    FrequencyShape,
    NoiseSuppress,
    Compress,
    DynamicNormalize,
    Reencode,
}

impl EnhancementKind {
    pub const ALL: [EnhancementKind; 5] = [
        EnhancementKind::FrequencyShape,
        EnhancementKind::NoiseSuppress,
        EnhancementKind::Compress,
        EnhancementKind::DynamicNormalize,
        EnhancementKind::Reencode,
    ];

    /// Short slug used in variant labels and filenames.
    pub fn slug(self) -> &'static str {
        match self {
            EnhancementKind::FrequencyShape => "bandpass",
            EnhancementKind::NoiseSuppress => "denoise",
            EnhancementKind::Compress => "compress",
            EnhancementKind::DynamicNormalize => "dynnorm",
            EnhancementKind::Reencode => "reencode",
        }
    }
}

impl fmt::Display for EnhancementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Kind-specific numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnhancementParams {
    FrequencyShape { highpass_hz: u32, lowpass_hz: u32 },
    NoiseSuppress { noise_floor_db: i32 },
    Compress { ratio: u32, attack_ms: u32, release_ms: u32 },
    DynamicNormalize { frame_len_ms: u32, gauss_size: u32 },
    Reencode { sample_rate_hz: u32, channels: u16 },
}

/// One enhancement: an immutable value fully describing a filter invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancementSpec {
    pub kind: EnhancementKind,
    pub strength: Strength,
    pub params: EnhancementParams,
}

impl EnhancementSpec {
    /// The parameterization table for every kind × strength combination.
    pub fn new(kind: EnhancementKind, strength: Strength) -> Self {
        use EnhancementKind::*;
        use Strength::*;

        let params = match (kind, strength) {
            (FrequencyShape, Weak) => EnhancementParams::FrequencyShape {
                highpass_hz: 150,
                lowpass_hz: 3500,
            },
            (FrequencyShape, Strong) => EnhancementParams::FrequencyShape {
                highpass_hz: 300,
                lowpass_hz: 2800,
            },
            (NoiseSuppress, Weak) => EnhancementParams::NoiseSuppress { noise_floor_db: -25 },
            (NoiseSuppress, Strong) => EnhancementParams::NoiseSuppress { noise_floor_db: -38 },
            (Compress, Weak) => EnhancementParams::Compress {
                ratio: 4,
                attack_ms: 20,
                release_ms: 250,
            },
            (Compress, Strong) => EnhancementParams::Compress {
                ratio: 9,
                attack_ms: 5,
                release_ms: 150,
            },
            (DynamicNormalize, Weak) => EnhancementParams::DynamicNormalize {
                frame_len_ms: 500,
                gauss_size: 31,
            },
            (DynamicNormalize, Strong) => EnhancementParams::DynamicNormalize {
                frame_len_ms: 150,
                gauss_size: 15,
            },
            (Reencode, Weak) => EnhancementParams::Reencode {
                sample_rate_hz: 16000,
                channels: 1,
            },
            (Reencode, Strong) => EnhancementParams::Reencode {
                sample_rate_hz: 8000,
                channels: 1,
            },
        };

        Self {
            kind,
            strength,
            params,
        }
    }

    /// Deterministic label for a variant produced by this spec alone.
    pub fn label(&self) -> String {
        format!("{}-{}", self.kind.slug(), self.strength)
    }

    /// Build the engine filter expression for this spec.
    pub fn filter_expression(&self) -> String {
        match self.params {
            EnhancementParams::FrequencyShape {
                highpass_hz,
                lowpass_hz,
            } => format!("highpass=f={},lowpass=f={}", highpass_hz, lowpass_hz),
            EnhancementParams::NoiseSuppress { noise_floor_db } => {
                format!("afftdn=nf={}", noise_floor_db)
            }
            EnhancementParams::Compress {
                ratio,
                attack_ms,
                release_ms,
            } => format!(
                "acompressor=ratio={}:attack={}:release={}",
                ratio, attack_ms, release_ms
            ),
            EnhancementParams::DynamicNormalize {
                frame_len_ms,
                gauss_size,
            } => format!("dynaudnorm=f={}:g={}", frame_len_ms, gauss_size),
            EnhancementParams::Reencode {
                sample_rate_hz,
                channels,
            } => {
                let layout = if channels == 1 { "mono" } else { "stereo" };
                format!(
                    "aresample={},aformat=channel_layouts={}",
                    sample_rate_hz, layout
                )
            }
        }
    }
}
