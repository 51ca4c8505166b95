//! Behavior layers: how one sub-effect looks and animates in a preview.

use serde::{Deserialize, Serialize};

use super::bounds::Bounds;
use super::kinds::MovementKind;

/// Maximum number of colours kept per layer.
pub const MAX_COLORS: usize = 16;

pub const LIFESPAN_SECONDS: Bounds = Bounds::new(0.05, 30.0, 1.0);
pub const SPAWN_INTERVAL_SECONDS: Bounds = Bounds::new(0.0, 10.0, 0.1);
pub const SIZE: Bounds = Bounds::new(0.01, 10.0, 0.25);
pub const SPEED: Bounds = Bounds::new(0.0, 10.0, 1.0);
pub const WEIGHT: Bounds = Bounds::new(-2.0, 2.0, 0.0);
pub const PREVIEW_SCALE: Bounds = Bounds::new(0.1, 5.0, 1.0);

/// Unclamped input for a [`BehaviorLayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorParams {
    pub movement: MovementKind,
    pub colors: Vec<u32>,
    pub lifespan_seconds: f32,
    pub spawn_interval_seconds: f32,
    pub size: f32,
    pub speed: f32,
    pub weight: f32,
    pub preview_scale: f32,
}

impl Default for BehaviorParams {
    fn default() -> Self {
        Self {
            movement: MovementKind::Default,
            colors: Vec::new(),
            lifespan_seconds: LIFESPAN_SECONDS.default,
            spawn_interval_seconds: SPAWN_INTERVAL_SECONDS.default,
            size: SIZE.default,
            speed: SPEED.default,
            weight: WEIGHT.default,
            preview_scale: PREVIEW_SCALE.default,
        }
    }
}

/// Preview-facing description of one logical layer.
///
/// Every numeric field is clamped on construction, so a `BehaviorLayer`
/// value is always in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BehaviorParams", into = "BehaviorParams")]
pub struct BehaviorLayer {
    movement: MovementKind,
    colors: Vec<u32>,
    lifespan_seconds: f32,
    spawn_interval_seconds: f32,
    size: f32,
    speed: f32,
    weight: f32,
    preview_scale: f32,
}

impl BehaviorLayer {
    pub fn new(params: BehaviorParams) -> Self {
        let mut colors = params.colors;
        colors.truncate(MAX_COLORS);
        Self {
            movement: params.movement,
            colors,
            lifespan_seconds: LIFESPAN_SECONDS.clamp(params.lifespan_seconds),
            spawn_interval_seconds: SPAWN_INTERVAL_SECONDS.clamp(params.spawn_interval_seconds),
            size: SIZE.clamp(params.size),
            speed: SPEED.clamp(params.speed),
            weight: WEIGHT.clamp(params.weight),
            preview_scale: PREVIEW_SCALE.clamp(params.preview_scale),
        }
    }

    /// Editable copy of this layer's values.
    pub fn to_params(&self) -> BehaviorParams {
        BehaviorParams {
            movement: self.movement,
            colors: self.colors.clone(),
            lifespan_seconds: self.lifespan_seconds,
            spawn_interval_seconds: self.spawn_interval_seconds,
            size: self.size,
            speed: self.speed,
            weight: self.weight,
            preview_scale: self.preview_scale,
        }
    }

    /// New layer with `edit` applied to a copy of this layer's params.
    pub fn with(&self, edit: impl FnOnce(&mut BehaviorParams)) -> Self {
        let mut params = self.to_params();
        edit(&mut params);
        Self::new(params)
    }

    pub fn movement(&self) -> MovementKind {
        self.movement
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn lifespan_seconds(&self) -> f32 {
        self.lifespan_seconds
    }

    pub fn spawn_interval_seconds(&self) -> f32 {
        self.spawn_interval_seconds
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn preview_scale(&self) -> f32 {
        self.preview_scale
    }
}

impl Default for BehaviorLayer {
    fn default() -> Self {
        Self::new(BehaviorParams::default())
    }
}

impl From<BehaviorParams> for BehaviorLayer {
    fn from(params: BehaviorParams) -> Self {
        Self::new(params)
    }
}

impl From<BehaviorLayer> for BehaviorParams {
    fn from(layer: BehaviorLayer) -> Self {
        layer.to_params()
    }
}
