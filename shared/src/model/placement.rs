//! Placement layers: how one sub-effect is positioned and emitted in the world.

use serde::{Deserialize, Serialize};

use super::bounds::{Bounds, wrap_degrees, wrap_degrees_inclusive};
use super::kinds::{MotionCurve, RotationMode};
use crate::ids::EffectId;

/// Primitive used by canonical default placement layers.
pub const DEFAULT_PRIMITIVE: &str = "aurafx:spark";

/// Primitive rendered when a reference resolves to nothing at all.
pub const DEFAULT_FALLBACK_PRIMITIVE: &str = "aurafx:glint";

/// Style key used when none (or only whitespace) is given.
pub const DEFAULT_STYLE_KEY: &str = "halo";

/// Longest style key kept; longer keys are cut at a char boundary.
pub const MAX_STYLE_KEY_LEN: usize = 32;

pub const RADIUS: Bounds = Bounds::new(0.0, 8.0, 0.5);
pub const BASE_HEIGHT: Bounds = Bounds::new(-4.0, 4.0, 0.0);
pub const HEIGHT_STRETCH: Bounds = Bounds::new(0.0, 8.0, 1.0);
pub const OFFSET: Bounds = Bounds::new(-4.0, 4.0, 0.0);
pub const TILT_DEGREES: Bounds = Bounds::new(-90.0, 90.0, 0.0);
pub const JITTER: Bounds = Bounds::new(0.0, 2.0, 0.0);
pub const DRIFT: Bounds = Bounds::new(-2.0, 2.0, 0.0);
pub const TORQUE: Bounds = Bounds::new(-10.0, 10.0, 0.0);
pub const SPAWN_DELAY_VARIANCE: Bounds = Bounds::new(0.0, 5.0, 0.0);
pub const SPEED_MULTIPLIER: Bounds = Bounds::new(0.0, 8.0, 1.0);

pub const SPREAD_START_DEFAULT: f32 = 0.0;
pub const SPREAD_END_DEFAULT: f32 = 360.0;

pub const MIN_COUNT: u32 = 1;
pub const MAX_COUNT: u32 = 64;

/// The identifier behind [`DEFAULT_PRIMITIVE`].
pub fn default_primitive() -> EffectId {
    EffectId::from_static("aurafx", "spark")
}

/// The identifier behind [`DEFAULT_FALLBACK_PRIMITIVE`].
pub fn fallback_primitive() -> EffectId {
    EffectId::from_static("aurafx", "glint")
}

/// Unclamped input for a [`PlacementLayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    pub effect_ref: EffectId,
    pub style_key: String,
    pub radius: f32,
    pub base_height: f32,
    pub height_stretch: f32,
    pub offset: [f32; 3],
    pub spread_start_degrees: f32,
    pub spread_end_degrees: f32,
    pub tilt_degrees: f32,
    pub rotation_mode: RotationMode,
    pub motion_curve: MotionCurve,
    pub jitter: f32,
    pub drift: f32,
    pub torque: f32,
    pub spawn_delay_variance: f32,
    pub count: u32,
    pub speed_multiplier: f32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            effect_ref: default_primitive(),
            style_key: DEFAULT_STYLE_KEY.to_string(),
            radius: RADIUS.default,
            base_height: BASE_HEIGHT.default,
            height_stretch: HEIGHT_STRETCH.default,
            offset: [OFFSET.default; 3],
            spread_start_degrees: SPREAD_START_DEFAULT,
            spread_end_degrees: SPREAD_END_DEFAULT,
            tilt_degrees: TILT_DEGREES.default,
            rotation_mode: RotationMode::default(),
            motion_curve: MotionCurve::default(),
            jitter: JITTER.default,
            drift: DRIFT.default,
            torque: TORQUE.default,
            spawn_delay_variance: SPAWN_DELAY_VARIANCE.default,
            count: MIN_COUNT,
            speed_multiplier: SPEED_MULTIPLIER.default,
        }
    }
}

/// World-facing description of one logical layer.
///
/// Spread angles wrap around the circle; tilt clamps. All other numeric
/// fields clamp to their bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlacementParams", into = "PlacementParams")]
pub struct PlacementLayer {
    effect_ref: EffectId,
    style_key: String,
    radius: f32,
    base_height: f32,
    height_stretch: f32,
    offset: [f32; 3],
    spread_start_degrees: f32,
    spread_end_degrees: f32,
    tilt_degrees: f32,
    rotation_mode: RotationMode,
    motion_curve: MotionCurve,
    jitter: f32,
    drift: f32,
    torque: f32,
    spawn_delay_variance: f32,
    count: u32,
    speed_multiplier: f32,
}

impl PlacementLayer {
    pub fn new(params: PlacementParams) -> Self {
        Self {
            effect_ref: params.effect_ref,
            style_key: normalize_style_key(&params.style_key),
            radius: RADIUS.clamp(params.radius),
            base_height: BASE_HEIGHT.clamp(params.base_height),
            height_stretch: HEIGHT_STRETCH.clamp(params.height_stretch),
            offset: params.offset.map(|v| OFFSET.clamp(v)),
            spread_start_degrees: wrap_degrees(params.spread_start_degrees, SPREAD_START_DEFAULT),
            spread_end_degrees: wrap_degrees_inclusive(
                params.spread_end_degrees,
                SPREAD_END_DEFAULT,
            ),
            tilt_degrees: TILT_DEGREES.clamp(params.tilt_degrees),
            rotation_mode: params.rotation_mode,
            motion_curve: params.motion_curve,
            jitter: JITTER.clamp(params.jitter),
            drift: DRIFT.clamp(params.drift),
            torque: TORQUE.clamp(params.torque),
            spawn_delay_variance: SPAWN_DELAY_VARIANCE.clamp(params.spawn_delay_variance),
            count: params.count.clamp(MIN_COUNT, MAX_COUNT),
            speed_multiplier: SPEED_MULTIPLIER.clamp(params.speed_multiplier),
        }
    }

    /// Minimal pattern around a single primitive, used for simple fallbacks.
    pub fn around(primitive: EffectId) -> Self {
        Self::new(PlacementParams {
            effect_ref: primitive,
            ..Default::default()
        })
    }

    pub fn to_params(&self) -> PlacementParams {
        PlacementParams {
            effect_ref: self.effect_ref.clone(),
            style_key: self.style_key.clone(),
            radius: self.radius,
            base_height: self.base_height,
            height_stretch: self.height_stretch,
            offset: self.offset,
            spread_start_degrees: self.spread_start_degrees,
            spread_end_degrees: self.spread_end_degrees,
            tilt_degrees: self.tilt_degrees,
            rotation_mode: self.rotation_mode,
            motion_curve: self.motion_curve,
            jitter: self.jitter,
            drift: self.drift,
            torque: self.torque,
            spawn_delay_variance: self.spawn_delay_variance,
            count: self.count,
            speed_multiplier: self.speed_multiplier,
        }
    }

    /// New layer with `edit` applied to a copy of this layer's params.
    pub fn with(&self, edit: impl FnOnce(&mut PlacementParams)) -> Self {
        let mut params = self.to_params();
        edit(&mut params);
        Self::new(params)
    }

    pub fn effect_ref(&self) -> &EffectId {
        &self.effect_ref
    }

    pub fn style_key(&self) -> &str {
        &self.style_key
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    pub fn height_stretch(&self) -> f32 {
        self.height_stretch
    }

    pub fn offset(&self) -> [f32; 3] {
        self.offset
    }

    pub fn spread_start_degrees(&self) -> f32 {
        self.spread_start_degrees
    }

    pub fn spread_end_degrees(&self) -> f32 {
        self.spread_end_degrees
    }

    pub fn tilt_degrees(&self) -> f32 {
        self.tilt_degrees
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation_mode
    }

    pub fn motion_curve(&self) -> MotionCurve {
        self.motion_curve
    }

    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    pub fn drift(&self) -> f32 {
        self.drift
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    pub fn spawn_delay_variance(&self) -> f32 {
        self.spawn_delay_variance
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }
}

impl Default for PlacementLayer {
    fn default() -> Self {
        Self::new(PlacementParams::default())
    }
}

impl From<PlacementParams> for PlacementLayer {
    fn from(params: PlacementParams) -> Self {
        Self::new(params)
    }
}

impl From<PlacementLayer> for PlacementParams {
    fn from(layer: PlacementLayer) -> Self {
        layer.to_params()
    }
}

fn normalize_style_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_STYLE_KEY.to_string();
    }
    trimmed.chars().take(MAX_STYLE_KEY_LEN).collect()
}
