//! Closed enums carried by layers.
//!
//! Each enum travels on the wire as its short snake_case name. Decoding an
//! unknown name falls back to the variant marked `#[default]`.

use serde::{Deserialize, Serialize};

/// How particles of a behavior layer move in the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    #[default]
    Default,
    FloatUp,
    DriftUp,
    Burst,
    Swirl,
    FallDown,
    Orbit,
    Flicker,
}

impl MovementKind {
    pub const ALL: [MovementKind; 8] = [
        MovementKind::Default,
        MovementKind::FloatUp,
        MovementKind::DriftUp,
        MovementKind::Burst,
        MovementKind::Swirl,
        MovementKind::FallDown,
        MovementKind::Orbit,
        MovementKind::Flicker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Default => "default",
            MovementKind::FloatUp => "float_up",
            MovementKind::DriftUp => "drift_up",
            MovementKind::Burst => "burst",
            MovementKind::Swirl => "swirl",
            MovementKind::FallDown => "fall_down",
            MovementKind::Orbit => "orbit",
            MovementKind::Flicker => "flicker",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Plane a placement pattern is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    #[default]
    Horizontal,
    VerticalX,
    VerticalZ,
}

impl RotationMode {
    pub const ALL: [RotationMode; 3] = [
        RotationMode::Horizontal,
        RotationMode::VerticalX,
        RotationMode::VerticalZ,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RotationMode::Horizontal => "horizontal",
            RotationMode::VerticalX => "vertical_x",
            RotationMode::VerticalZ => "vertical_z",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Easing applied to placement motion over a particle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionCurve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl MotionCurve {
    pub const ALL: [MotionCurve; 4] = [
        MotionCurve::Linear,
        MotionCurve::EaseIn,
        MotionCurve::EaseOut,
        MotionCurve::EaseInOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MotionCurve::Linear => "linear",
            MotionCurve::EaseIn => "ease_in",
            MotionCurve::EaseOut => "ease_out",
            MotionCurve::EaseInOut => "ease_in_out",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Evaluate the curve at `t` in `[0, 1]`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            MotionCurve::Linear => t,
            MotionCurve::EaseIn => t * t,
            MotionCurve::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            MotionCurve::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Rarity tier of a published catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}
