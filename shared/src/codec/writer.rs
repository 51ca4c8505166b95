//! Definition body writer
//!
//! Writing into a `Vec<u8>` cannot fail, so every method is infallible.

use crate::model::{BehaviorLayer, DefinitionMetadata, EffectDefinition, PlacementLayer};

/// Writer for the definition body format
#[derive(Debug, Default)]
pub struct BodyWriter {
    out: Vec<u8>,
}

impl BodyWriter {
    /// Create a new body writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Consume the writer and return the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    /// Write a complete definition body
    pub fn write_definition(&mut self, definition: &EffectDefinition) {
        self.write_layers(definition);
        self.write_metadata(definition.metadata());
    }

    /// Write the required section: both layer lists
    pub fn write_layers(&mut self, definition: &EffectDefinition) {
        self.write_varint(definition.behavior_layers().len() as u32);
        for layer in definition.behavior_layers() {
            self.write_behavior(layer);
        }

        self.write_varint(definition.placement_layers().len() as u32);
        for layer in definition.placement_layers() {
            self.write_placement(layer);
        }
    }

    /// Write the optional trailing fields, in wire order
    pub fn write_metadata(&mut self, metadata: &DefinitionMetadata) {
        self.write_optional_str(metadata.description.as_deref());
        self.write_optional_str(metadata.style_hint.as_deref());
        self.write_optional_str(metadata.display_name.as_deref());
        self.write_optional_str(metadata.notes.as_deref());
    }

    fn write_behavior(&mut self, layer: &BehaviorLayer) {
        self.write_str(layer.movement().as_str());
        self.write_varint(layer.colors().len() as u32);
        for &color in layer.colors() {
            self.write_u32(color);
        }
        self.write_f32(layer.lifespan_seconds());
        self.write_f32(layer.spawn_interval_seconds());
        self.write_f32(layer.size());
        self.write_f32(layer.speed());
        self.write_f32(layer.weight());
        self.write_f32(layer.preview_scale());
    }

    fn write_placement(&mut self, layer: &PlacementLayer) {
        self.write_str(&layer.effect_ref().to_string());
        self.write_str(layer.style_key());
        self.write_f32(layer.radius());
        self.write_f32(layer.base_height());
        self.write_f32(layer.height_stretch());
        for axis in layer.offset() {
            self.write_f32(axis);
        }
        self.write_f32(layer.spread_start_degrees());
        self.write_f32(layer.spread_end_degrees());
        self.write_f32(layer.tilt_degrees());
        self.write_str(layer.rotation_mode().as_str());
        self.write_str(layer.motion_curve().as_str());
        self.write_f32(layer.jitter());
        self.write_f32(layer.drift());
        self.write_f32(layer.torque());
        self.write_f32(layer.spawn_delay_variance());
        self.write_varint(layer.count());
        self.write_f32(layer.speed_multiplier());
    }

    /// LEB128 unsigned varint
    pub fn write_varint(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.out.push(byte);
                return;
            }
            self.out.push(byte | 0x80);
        }
    }

    pub fn write_u32(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    /// Varint byte length followed by UTF-8 bytes
    pub fn write_str(&mut self, value: &str) {
        self.write_varint(value.len() as u32);
        self.out.extend_from_slice(value.as_bytes());
    }

    /// Presence byte (0 or 1) followed by the string when present
    pub fn write_optional_str(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.out.push(1);
                self.write_str(value);
            }
            None => self.out.push(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encoding() {
        let mut writer = BodyWriter::new();
        writer.write_varint(0);
        writer.write_varint(127);
        writer.write_varint(128);
        writer.write_varint(300);
        assert_eq!(writer.into_bytes(), vec![0x00, 0x7F, 0x80, 0x01, 0xAC, 0x02]);
    }

    #[test]
    fn test_optional_str_layout() {
        let mut writer = BodyWriter::new();
        writer.write_optional_str(None);
        writer.write_optional_str(Some("hi"));
        assert_eq!(writer.into_bytes(), vec![0, 1, 2, b'h', b'i']);
    }

    #[test]
    fn test_empty_definition_body() {
        let id = crate::ids::EffectId::parse("empty").unwrap();
        let mut writer = BodyWriter::new();
        writer.write_definition(&EffectDefinition::new(id));
        // two zero counts, four absent optional fields
        assert_eq!(writer.into_bytes(), vec![0, 0, 0, 0, 0, 0]);
    }
}
