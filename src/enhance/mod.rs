//! Enhancement catalog and variant construction.

pub mod builder;
pub mod catalog;
pub mod spec;

pub use builder::{BuildOptions, VariantSet, build_variants};
pub use catalog::{PlannedVariant, VariantKind, catalog, variant_plan};
pub use spec::{EnhancementKind, EnhancementParams, EnhancementSpec, Strength};
