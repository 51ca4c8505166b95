//! Effect definitions: paired behavior/placement layers plus metadata.

use serde::{Deserialize, Serialize};

use super::behavior::BehaviorLayer;
use super::placement::PlacementLayer;
use crate::ids::EffectId;

/// Maximum number of logical layers in one definition.
pub const MAX_LAYERS: usize = 16;

/// Free-form text attached to a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One effect: layer `i` of `behavior_layers` and layer `i` of
/// `placement_layers` describe the same logical layer.
///
/// Definitions are values. Every `with_*` method returns a new definition;
/// the id is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    id: EffectId,
    #[serde(rename = "behavior", default)]
    behavior_layers: Vec<BehaviorLayer>,
    #[serde(rename = "placement", default)]
    placement_layers: Vec<PlacementLayer>,
    #[serde(flatten)]
    metadata: DefinitionMetadata,
}

impl EffectDefinition {
    /// Empty definition with no layers.
    pub fn new(id: EffectId) -> Self {
        Self {
            id,
            behavior_layers: Vec::new(),
            placement_layers: Vec::new(),
            metadata: DefinitionMetadata::default(),
        }
    }

    /// Assemble a definition as-is. Lists are not repaired.
    pub fn from_parts(
        id: EffectId,
        behavior_layers: Vec<BehaviorLayer>,
        placement_layers: Vec<PlacementLayer>,
        metadata: DefinitionMetadata,
    ) -> Self {
        Self {
            id,
            behavior_layers,
            placement_layers,
            metadata,
        }
    }

    pub fn id(&self) -> &EffectId {
        &self.id
    }

    pub fn behavior_layers(&self) -> &[BehaviorLayer] {
        &self.behavior_layers
    }

    pub fn placement_layers(&self) -> &[PlacementLayer] {
        &self.placement_layers
    }

    pub fn metadata(&self) -> &DefinitionMetadata {
        &self.metadata
    }

    pub fn display_name(&self) -> Option<&str> {
        self.metadata.display_name.as_deref()
    }

    /// Whether both layer lists have the same length.
    pub fn is_paired(&self) -> bool {
        self.behavior_layers.len() == self.placement_layers.len()
    }

    /// Number of logical layers (the longer of the two lists).
    pub fn layer_count(&self) -> usize {
        self.behavior_layers.len().max(self.placement_layers.len())
    }

    /// Restore the pairing invariant.
    ///
    /// Lists longer than [`MAX_LAYERS`] lose their tail, then the shorter
    /// list is padded with canonical default layers. Idempotent.
    pub fn repair(mut self) -> Self {
        self.behavior_layers.truncate(MAX_LAYERS);
        self.placement_layers.truncate(MAX_LAYERS);

        let target = self.layer_count();
        self.behavior_layers.resize_with(target, BehaviorLayer::default);
        self.placement_layers.resize_with(target, PlacementLayer::default);
        self
    }

    pub fn with_behavior_layers(mut self, layers: Vec<BehaviorLayer>) -> Self {
        self.behavior_layers = layers;
        self
    }

    pub fn with_placement_layers(mut self, layers: Vec<PlacementLayer>) -> Self {
        self.placement_layers = layers;
        self
    }

    pub fn with_metadata(mut self, metadata: DefinitionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append one logical layer to both lists.
    pub fn with_layer(mut self, behavior: BehaviorLayer, placement: PlacementLayer) -> Self {
        self.behavior_layers.push(behavior);
        self.placement_layers.push(placement);
        self
    }

    /// Remove logical layer `index` from both lists, if present.
    pub fn without_layer(mut self, index: usize) -> Self {
        if index < self.behavior_layers.len() {
            self.behavior_layers.remove(index);
        }
        if index < self.placement_layers.len() {
            self.placement_layers.remove(index);
        }
        self
    }

    /// Take ownership of the layer lists.
    pub fn into_layers(self) -> (Vec<BehaviorLayer>, Vec<PlacementLayer>) {
        (self.behavior_layers, self.placement_layers)
    }
}
