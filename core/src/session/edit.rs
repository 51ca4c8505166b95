//! Single-field edits applied to a working copy.

use aurafx_shared::{
    BehaviorLayer, DefinitionMetadata, EffectDefinition, EffectId, MAX_LAYERS, MotionCurve,
    MovementKind, PlacementLayer, RotationMode,
};

use super::SessionError;

/// One operator edit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Behavior { layer: usize, edit: BehaviorEdit },
    Placement { layer: usize, edit: PlacementEdit },
    Metadata(MetadataEdit),
    /// Append a default layer pair
    AddLayer,
    /// Remove a layer pair
    RemoveLayer(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorEdit {
    Movement(MovementKind),
    Colors(Vec<u32>),
    Lifespan(f32),
    SpawnInterval(f32),
    Size(f32),
    Speed(f32),
    Weight(f32),
    PreviewScale(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementEdit {
    EffectRef(EffectId),
    StyleKey(String),
    Radius(f32),
    BaseHeight(f32),
    HeightStretch(f32),
    Offset([f32; 3]),
    SpreadStart(f32),
    SpreadEnd(f32),
    Tilt(f32),
    RotationMode(RotationMode),
    MotionCurve(MotionCurve),
    Jitter(f32),
    Drift(f32),
    Torque(f32),
    SpawnDelayVariance(f32),
    Count(u32),
    SpeedMultiplier(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataEdit {
    Description(Option<String>),
    StyleHint(Option<String>),
    DisplayName(Option<String>),
    Notes(Option<String>),
}

impl BehaviorEdit {
    fn apply(self, layer: &BehaviorLayer) -> BehaviorLayer {
        layer.with(|p| match self {
            BehaviorEdit::Movement(v) => p.movement = v,
            BehaviorEdit::Colors(v) => p.colors = v,
            BehaviorEdit::Lifespan(v) => p.lifespan_seconds = v,
            BehaviorEdit::SpawnInterval(v) => p.spawn_interval_seconds = v,
            BehaviorEdit::Size(v) => p.size = v,
            BehaviorEdit::Speed(v) => p.speed = v,
            BehaviorEdit::Weight(v) => p.weight = v,
            BehaviorEdit::PreviewScale(v) => p.preview_scale = v,
        })
    }
}

impl PlacementEdit {
    fn apply(self, layer: &PlacementLayer) -> PlacementLayer {
        layer.with(|p| match self {
            PlacementEdit::EffectRef(v) => p.effect_ref = v,
            PlacementEdit::StyleKey(v) => p.style_key = v,
            PlacementEdit::Radius(v) => p.radius = v,
            PlacementEdit::BaseHeight(v) => p.base_height = v,
            PlacementEdit::HeightStretch(v) => p.height_stretch = v,
            PlacementEdit::Offset(v) => p.offset = v,
            PlacementEdit::SpreadStart(v) => p.spread_start_degrees = v,
            PlacementEdit::SpreadEnd(v) => p.spread_end_degrees = v,
            PlacementEdit::Tilt(v) => p.tilt_degrees = v,
            PlacementEdit::RotationMode(v) => p.rotation_mode = v,
            PlacementEdit::MotionCurve(v) => p.motion_curve = v,
            PlacementEdit::Jitter(v) => p.jitter = v,
            PlacementEdit::Drift(v) => p.drift = v,
            PlacementEdit::Torque(v) => p.torque = v,
            PlacementEdit::SpawnDelayVariance(v) => p.spawn_delay_variance = v,
            PlacementEdit::Count(v) => p.count = v,
            PlacementEdit::SpeedMultiplier(v) => p.speed_multiplier = v,
        })
    }
}

impl MetadataEdit {
    fn apply(self, metadata: &mut DefinitionMetadata) {
        match self {
            MetadataEdit::Description(v) => metadata.description = v,
            MetadataEdit::StyleHint(v) => metadata.style_hint = v,
            MetadataEdit::DisplayName(v) => metadata.display_name = v,
            MetadataEdit::Notes(v) => metadata.notes = v,
        }
    }
}

impl FieldEdit {
    /// Apply to a paired definition, producing the next working copy
    pub(crate) fn apply(self, definition: EffectDefinition) -> Result<EffectDefinition, SessionError> {
        let count = definition.layer_count();
        match self {
            FieldEdit::Behavior { layer, edit } => {
                let current = definition
                    .behavior_layers()
                    .get(layer)
                    .ok_or(SessionError::LayerOutOfRange { index: layer, count })?;
                let updated = edit.apply(current);
                let mut layers = definition.behavior_layers().to_vec();
                layers[layer] = updated;
                Ok(definition.with_behavior_layers(layers))
            }
            FieldEdit::Placement { layer, edit } => {
                let current = definition
                    .placement_layers()
                    .get(layer)
                    .ok_or(SessionError::LayerOutOfRange { index: layer, count })?;
                let updated = edit.apply(current);
                let mut layers = definition.placement_layers().to_vec();
                layers[layer] = updated;
                Ok(definition.with_placement_layers(layers))
            }
            FieldEdit::Metadata(edit) => {
                let mut metadata = definition.metadata().clone();
                edit.apply(&mut metadata);
                Ok(definition.with_metadata(metadata))
            }
            FieldEdit::AddLayer => {
                if count >= MAX_LAYERS {
                    return Err(SessionError::LayerLimit { max: MAX_LAYERS });
                }
                Ok(definition.with_layer(BehaviorLayer::default(), PlacementLayer::default()))
            }
            FieldEdit::RemoveLayer(index) => {
                if index >= count {
                    return Err(SessionError::LayerOutOfRange { index, count });
                }
                Ok(definition.without_layer(index))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> EffectDefinition {
        EffectDefinition::new(EffectId::parse("edit_me").unwrap())
            .with_layer(BehaviorLayer::default(), PlacementLayer::default())
    }

    #[test]
    fn test_behavior_edit_clamps() {
        let def = FieldEdit::Behavior {
            layer: 0,
            edit: BehaviorEdit::Size(100.0),
        }
        .apply(base())
        .unwrap();
        assert_eq!(def.behavior_layers()[0].size(), 10.0);
    }

    #[test]
    fn test_placement_edit() {
        let def = FieldEdit::Placement {
            layer: 0,
            edit: PlacementEdit::Count(12),
        }
        .apply(base())
        .unwrap();
        assert_eq!(def.placement_layers()[0].count(), 12);
        assert_eq!(def.behavior_layers()[0], BehaviorLayer::default());
    }

    #[test]
    fn test_out_of_range_layer() {
        let err = FieldEdit::Placement {
            layer: 3,
            edit: PlacementEdit::Radius(1.0),
        }
        .apply(base())
        .unwrap_err();
        assert_eq!(err, SessionError::LayerOutOfRange { index: 3, count: 1 });
    }

    #[test]
    fn test_add_and_remove_layers() {
        let def = FieldEdit::AddLayer.apply(base()).unwrap();
        assert_eq!(def.layer_count(), 2);
        assert!(def.is_paired());

        let def = FieldEdit::RemoveLayer(0).apply(def).unwrap();
        assert_eq!(def.layer_count(), 1);
        assert!(FieldEdit::RemoveLayer(1).apply(def).is_err());
    }

    #[test]
    fn test_layer_limit() {
        let mut def = base();
        for _ in 1..MAX_LAYERS {
            def = FieldEdit::AddLayer.apply(def).unwrap();
        }
        assert_eq!(
            FieldEdit::AddLayer.apply(def).unwrap_err(),
            SessionError::LayerLimit { max: MAX_LAYERS }
        );
    }

    #[test]
    fn test_metadata_edit() {
        let def = FieldEdit::Metadata(MetadataEdit::DisplayName(Some("Glow".to_string())))
            .apply(base())
            .unwrap();
        assert_eq!(def.display_name(), Some("Glow"));
    }
}
