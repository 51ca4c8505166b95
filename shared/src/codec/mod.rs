//! Definition body codec
//!
//! A definition body is the binary encoding of one [`EffectDefinition`]
//! without its id; the id always travels alongside the body.
//!
//! # Layout
//!
//! Integers are little-endian. Counts and string lengths are LEB128 varints.
//! Strings are a varint byte length followed by UTF-8.
//!
//! ```text
//! varint behavior_count
//!   per layer: str movement, varint color_count, u32 * color_count,
//!              f32 lifespan, f32 spawn_interval, f32 size, f32 speed,
//!              f32 weight, f32 preview_scale
//! varint placement_count
//!   per layer: str effect_ref, str style_key, f32 radius, f32 base_height,
//!              f32 height_stretch, f32 offset_x, f32 offset_y, f32 offset_z,
//!              f32 spread_start, f32 spread_end, f32 tilt,
//!              str rotation_mode, str motion_curve, f32 jitter, f32 drift,
//!              f32 torque, f32 spawn_delay_variance, varint count,
//!              f32 speed_multiplier
//! trailing fields, each u8 presence (0|1) then str when present:
//!   description, style_hint, display_name, notes
//! ```
//!
//! A body that ends at any trailing-field boundary is complete; the missing
//! fields are absent. Bytes after the last known field are ignored so newer
//! encoders can append fields.

mod reader;
mod writer;

pub use reader::BodyReader;
pub use writer::BodyWriter;

use thiserror::Error;

use crate::ids::EffectId;
use crate::model::EffectDefinition;

/// Most layers a body may declare in either list
pub const MAX_WIRE_LAYERS: u32 = 64;

/// Most colors a single behavior layer may declare
pub const MAX_WIRE_COLORS: u32 = 64;

/// Longest string accepted on the wire, in bytes
pub const MAX_WIRE_STRING_LEN: u32 = 4096;

/// Structural failure decoding one definition body.
///
/// The whole definition is unusable; callers skip the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of body reading {context}")]
    UnexpectedEof { context: &'static str },
    #[error("varint overflow reading {context}")]
    VarintOverflow { context: &'static str },
    #[error("{what} count {count} exceeds maximum {max}")]
    CountTooLarge {
        what: &'static str,
        count: u32,
        max: u32,
    },
    #[error("{context} is {len} bytes, maximum is {max}")]
    StringTooLong {
        context: &'static str,
        len: u32,
        max: u32,
    },
    #[error("{context} is not valid UTF-8")]
    InvalidUtf8 { context: &'static str },
    #[error("invalid presence flag {flag} for {context}")]
    InvalidPresenceFlag { context: &'static str, flag: u8 },
}

/// Encode a definition body
pub fn encode_definition(definition: &EffectDefinition) -> Vec<u8> {
    let mut writer = BodyWriter::new();
    writer.write_definition(definition);
    writer.into_bytes()
}

/// Decode a definition body, assigning it `id`.
///
/// Never panics. Failures are logged and returned; the caller decides
/// whether to skip the record.
pub fn decode_definition(bytes: &[u8], id: EffectId) -> Result<EffectDefinition, DecodeError> {
    let label = id.to_string();
    BodyReader::new(bytes).read_definition(id).inspect_err(|e| {
        tracing::warn!(id = %label, len = bytes.len(), "Failed to decode definition body: {}", e);
    })
}
