//! Shared types for aurafx nodes.
//!
//! The effect definition model and its binary body codec. Everything here is
//! pure: no I/O, no global state.

pub mod codec;
pub mod ids;
pub mod model;

pub use codec::{DecodeError, decode_definition, encode_definition};
pub use ids::{DEFAULT_NAMESPACE, EffectId, IdError};
pub use model::{
    BehaviorLayer, BehaviorParams, CatalogEntry, DefinitionMetadata, EffectDefinition,
    MAX_LAYERS, MotionCurve, MovementKind, PlacementLayer, PlacementParams, Provenance, Rarity,
    RotationMode,
};
