//! Definition body reader
//!
//! Reads bodies produced by [`BodyWriter`](super::BodyWriter) and by older or
//! newer encoders of the same format.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{DecodeError, MAX_WIRE_COLORS, MAX_WIRE_LAYERS, MAX_WIRE_STRING_LEN};
use crate::ids::EffectId;
use crate::model::{
    BehaviorLayer, BehaviorParams, DefinitionMetadata, EffectDefinition, MotionCurve,
    MovementKind, PlacementLayer, PlacementParams, RotationMode,
};

/// Reader for the definition body format
pub struct BodyReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BodyReader<'a> {
    /// Create a new body reader
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    /// Read a complete definition body, assigning it `id`
    pub fn read_definition(&mut self, id: EffectId) -> Result<EffectDefinition, DecodeError> {
        let behavior_count = self.read_count("behavior layers", MAX_WIRE_LAYERS)?;
        let mut behavior_layers = Vec::with_capacity(behavior_count);
        for _ in 0..behavior_count {
            behavior_layers.push(self.read_behavior()?);
        }

        let placement_count = self.read_count("placement layers", MAX_WIRE_LAYERS)?;
        let mut placement_layers = Vec::with_capacity(placement_count);
        for index in 0..placement_count {
            match self.read_placement()? {
                Ok(layer) => placement_layers.push(layer),
                Err(raw_ref) => {
                    tracing::warn!(
                        id = %id,
                        layer = index,
                        effect_ref = %raw_ref,
                        "Dropping placement layer with unresolvable effect reference"
                    );
                }
            }
        }

        let metadata = self.read_metadata()?;

        if self.remaining() > 0 {
            tracing::trace!(
                id = %id,
                bytes = self.remaining(),
                "Ignoring trailing fields from a newer encoder"
            );
        }

        Ok(EffectDefinition::from_parts(
            id,
            behavior_layers,
            placement_layers,
            metadata,
        ))
    }

    fn read_behavior(&mut self) -> Result<BehaviorLayer, DecodeError> {
        let movement = self
            .read_enum_name("movement kind")?
            .and_then(|name| MovementKind::from_name(&name))
            .unwrap_or_default();

        let color_count = self.read_count("colors", MAX_WIRE_COLORS)?;
        let mut colors = Vec::with_capacity(color_count);
        for _ in 0..color_count {
            colors.push(self.read_u32("color")?);
        }

        Ok(BehaviorLayer::new(BehaviorParams {
            movement,
            colors,
            lifespan_seconds: self.read_f32("lifespan")?,
            spawn_interval_seconds: self.read_f32("spawn interval")?,
            size: self.read_f32("size")?,
            speed: self.read_f32("speed")?,
            weight: self.read_f32("weight")?,
            preview_scale: self.read_f32("preview scale")?,
        }))
    }

    /// Read one placement layer.
    ///
    /// The inner `Err` carries the raw effect reference when it does not
    /// parse; the layer's bytes are still fully consumed.
    fn read_placement(&mut self) -> Result<Result<PlacementLayer, String>, DecodeError> {
        let raw_ref = self.read_str("effect reference")?;
        let style_key = self.read_str("style key")?;
        let radius = self.read_f32("radius")?;
        let base_height = self.read_f32("base height")?;
        let height_stretch = self.read_f32("height stretch")?;
        let offset = [
            self.read_f32("offset x")?,
            self.read_f32("offset y")?,
            self.read_f32("offset z")?,
        ];
        let spread_start_degrees = self.read_f32("spread start")?;
        let spread_end_degrees = self.read_f32("spread end")?;
        let tilt_degrees = self.read_f32("tilt")?;
        let rotation_mode = self
            .read_enum_name("rotation mode")?
            .and_then(|name| RotationMode::from_name(&name))
            .unwrap_or_default();
        let motion_curve = self
            .read_enum_name("motion curve")?
            .and_then(|name| MotionCurve::from_name(&name))
            .unwrap_or_default();
        let jitter = self.read_f32("jitter")?;
        let drift = self.read_f32("drift")?;
        let torque = self.read_f32("torque")?;
        let spawn_delay_variance = self.read_f32("spawn delay variance")?;
        let count = self.read_varint("count")?;
        let speed_multiplier = self.read_f32("speed multiplier")?;

        let Ok(effect_ref) = EffectId::parse(&raw_ref) else {
            return Ok(Err(raw_ref));
        };

        Ok(Ok(PlacementLayer::new(PlacementParams {
            effect_ref,
            style_key,
            radius,
            base_height,
            height_stretch,
            offset,
            spread_start_degrees,
            spread_end_degrees,
            tilt_degrees,
            rotation_mode,
            motion_curve,
            jitter,
            drift,
            torque,
            spawn_delay_variance,
            count,
            speed_multiplier,
        })))
    }

    /// Read the optional trailing fields.
    ///
    /// Running out of bytes at a field boundary ends the record: that field
    /// and every later one is absent.
    fn read_metadata(&mut self) -> Result<DefinitionMetadata, DecodeError> {
        Ok(DefinitionMetadata {
            description: self.read_optional_str("description")?,
            style_hint: self.read_optional_str("style hint")?,
            display_name: self.read_optional_str("display name")?,
            notes: self.read_optional_str("notes")?,
        })
    }

    /// LEB128 unsigned varint, at most five bytes
    pub fn read_varint(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.cursor.read_u8().map_err(eof(context))?;
            let bits = (byte & 0x7F) as u32;
            if shift == 28 && bits > 0x0F {
                return Err(DecodeError::VarintOverflow { context });
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow { context })
    }

    fn read_count(&mut self, what: &'static str, max: u32) -> Result<usize, DecodeError> {
        let count = self.read_varint(what)?;
        if count > max {
            return Err(DecodeError::CountTooLarge { what, count, max });
        }
        Ok(count as usize)
    }

    fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        self.cursor.read_u32::<LittleEndian>().map_err(eof(context))
    }

    fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        self.cursor.read_f32::<LittleEndian>().map_err(eof(context))
    }

    fn read_bytes(&mut self, context: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_varint(context)?;
        if len > MAX_WIRE_STRING_LEN {
            return Err(DecodeError::StringTooLong {
                context,
                len,
                max: MAX_WIRE_STRING_LEN,
            });
        }
        if len as usize > self.remaining() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let mut bytes = vec![0u8; len as usize];
        self.cursor.read_exact(&mut bytes).map_err(eof(context))?;
        Ok(bytes)
    }

    fn read_str(&mut self, context: &'static str) -> Result<String, DecodeError> {
        String::from_utf8(self.read_bytes(context)?)
            .map_err(|_| DecodeError::InvalidUtf8 { context })
    }

    /// Enum names that are not UTF-8 come back as `None`, like unknown names.
    fn read_enum_name(&mut self, context: &'static str) -> Result<Option<String>, DecodeError> {
        let bytes = self.read_bytes(context)?;
        match String::from_utf8(bytes) {
            Ok(name) => Ok(Some(name)),
            Err(_) => {
                tracing::debug!(field = context, "Corrupt enum name, using default");
                Ok(None)
            }
        }
    }

    fn read_optional_str(&mut self, context: &'static str) -> Result<Option<String>, DecodeError> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        match self.cursor.read_u8().map_err(eof(context))? {
            0 => Ok(None),
            1 => self.read_str(context).map(Some),
            flag => Err(DecodeError::InvalidPresenceFlag { context, flag }),
        }
    }
}

fn eof(context: &'static str) -> impl FnOnce(io::Error) -> DecodeError {
    move |_| DecodeError::UnexpectedEof { context }
}
