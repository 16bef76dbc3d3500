//! The enhancement catalog and the canonical variant plan.
//!
//! The plan is a pure function of the catalog: no I/O, deterministic order,
//! unique labels. Insertion order here is the canonical report order.

use crate::enhance::spec::{EnhancementKind, EnhancementSpec, Strength};

/// All ten enhancement specs: five kinds × two strengths, kind-major,
/// weak before strong.
pub fn catalog() -> Vec<EnhancementSpec> {
    let mut specs = Vec::with_capacity(EnhancementKind::ALL.len() * Strength::ALL.len());
    for kind in EnhancementKind::ALL {
        for strength in Strength::ALL {
            specs.push(EnhancementSpec::new(kind, strength));
        }
    }
    specs
}

/// What a planned variant is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantKind {
    /// The unmodified source, re-encoded into the run directory.
    Source,
    /// The source with leading/trailing silence.
    PaddedSource,
    /// One spec applied to the source (or the padded source), independently
    /// of every other variant.
    Single {
        spec: EnhancementSpec,
        padded_input: bool,
    },
    /// All five kinds chained sequentially at one strength, finished with
    /// level normalization; `padded` pads the chain's final output.
    Combined { strength: Strength, padded: bool },
}

/// A variant the catalog intends to produce: label plus recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedVariant {
    pub label: String,
    pub kind: VariantKind,
}

/// Expand the catalog into the full ordered variant plan.
///
/// Baselines first, then each spec against the plain and padded source, then
/// the combined chains with their padded counterparts — 26 entries total.
pub fn variant_plan() -> Vec<PlannedVariant> {
    let mut plan = Vec::with_capacity(26);

    plan.push(PlannedVariant {
        label: "original".to_string(),
        kind: VariantKind::Source,
    });
    plan.push(PlannedVariant {
        label: "padded".to_string(),
        kind: VariantKind::PaddedSource,
    });

    for spec in catalog() {
        plan.push(PlannedVariant {
            label: spec.label(),
            kind: VariantKind::Single {
                spec,
                padded_input: false,
            },
        });
        plan.push(PlannedVariant {
            label: format!("padded-{}", spec.label()),
            kind: VariantKind::Single {
                spec,
                padded_input: true,
            },
        });
    }

    for strength in Strength::ALL {
        plan.push(PlannedVariant {
            label: format!("combined-{}", strength),
            kind: VariantKind::Combined {
                strength,
                padded: false,
            },
        });
        plan.push(PlannedVariant {
            label: format!("combined-{}-padded", strength),
            kind: VariantKind::Combined {
                strength,
                padded: true,
            },
        });
    }

    plan
}
