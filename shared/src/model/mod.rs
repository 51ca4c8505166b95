//! Effect definition model.
//!
//! Immutable value types. Layers clamp every numeric field on construction;
//! definitions enforce the pairing invariant through [`EffectDefinition::repair`].

pub mod behavior;
pub mod bounds;
pub mod catalog;
pub mod definition;
pub mod kinds;
pub mod placement;

pub use behavior::{BehaviorLayer, BehaviorParams, MAX_COLORS};
pub use bounds::Bounds;
pub use catalog::{CatalogEntry, Provenance};
pub use definition::{DefinitionMetadata, EffectDefinition, MAX_LAYERS};
pub use kinds::{MotionCurve, MovementKind, Rarity, RotationMode};
pub use placement::{
    DEFAULT_FALLBACK_PRIMITIVE, DEFAULT_PRIMITIVE, DEFAULT_STYLE_KEY, PlacementLayer,
    PlacementParams, default_primitive, fallback_primitive,
};
