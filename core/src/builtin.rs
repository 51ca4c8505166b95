//! Built-in pack loading
//!
//! A pack is a TOML file shipped with the build:
//!
//! ```toml
//! primitives = ["aurafx:spark", "aurafx:glint"]
//!
//! [[definition]]
//! id = "aurafx:halo"
//! display_name = "Halo"
//!
//! [[definition.behavior]]
//! movement = "orbit"
//! colors = [0xFFFFD700]
//!
//! [[definition.placement]]
//! effect_ref = "aurafx:spark"
//! radius = 0.8
//!
//! [[catalog]]
//! catalog_ref = "aurafx:shop/halo"
//! definition_ref = "aurafx:halo"
//! display_name = "Halo"
//! icon_ref = "icons/halo"
//!
//! [[legacy]]
//! id = "aurafx:ring"
//!
//! [[legacy.placement]]
//! effect_ref = "aurafx:glint"
//! ```
//!
//! Layer values clamp as they are read. Definitions are not repaired; the
//! resolver copes with degraded shipped data.

use std::path::{Path, PathBuf};

use aurafx_shared::{CatalogEntry, EffectDefinition, EffectId, MAX_LAYERS, PlacementLayer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, LegacyCatalog};
use crate::registry::Registry;

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("failed to read built-in pack {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse built-in pack: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Placement-only pattern from the legacy catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyPattern {
    pub id: EffectId,
    #[serde(default)]
    pub placement: Vec<PlacementLayer>,
}

/// Contents of a built-in pack file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuiltinPack {
    #[serde(default)]
    pub primitives: Vec<EffectId>,
    #[serde(default, rename = "definition")]
    pub definitions: Vec<EffectDefinition>,
    #[serde(default, rename = "catalog")]
    pub catalog: Vec<CatalogEntry>,
    #[serde(default, rename = "legacy")]
    pub legacy: Vec<LegacyPattern>,
}

impl BuiltinPack {
    pub fn from_toml(content: &str) -> Result<Self, BuiltinError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, BuiltinError> {
        let content = std::fs::read_to_string(path).map_err(|source| BuiltinError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pack = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            definitions = pack.definitions.len(),
            catalog = pack.catalog.len(),
            legacy = pack.legacy.len(),
            primitives = pack.primitives.len(),
            "Loaded built-in pack"
        );
        Ok(pack)
    }

    /// Definitions whose layer lists are unpaired or over the layer limit
    pub fn degraded(&self) -> Vec<&EffectDefinition> {
        self.definitions
            .iter()
            .filter(|def| !def.is_paired() || def.layer_count() > MAX_LAYERS)
            .collect()
    }

    /// Catalog entries whose definition is neither shipped in this pack nor
    /// a known primitive or legacy pattern
    pub fn dangling_catalog(&self) -> Vec<&CatalogEntry> {
        self.catalog
            .iter()
            .filter(|entry| {
                let target = &entry.definition_ref;
                !self.definitions.iter().any(|def| def.id() == target)
                    && !self.primitives.contains(target)
                    && !self.legacy.iter().any(|pattern| &pattern.id == target)
            })
            .collect()
    }

    /// Legacy catalog holding this pack's patterns and primitives
    pub fn legacy_catalog(&self) -> LegacyCatalog {
        let mut legacy = LegacyCatalog::new();
        for primitive in &self.primitives {
            legacy.insert_primitive(primitive.clone());
        }
        for pattern in &self.legacy {
            legacy.insert_pattern(pattern.id.clone(), pattern.placement.clone());
        }
        legacy
    }

    /// Install the pack as the built-in partition of `registry` and
    /// `catalog`, returning the legacy catalog.
    pub fn apply(self, registry: &mut Registry, catalog: &mut Catalog) -> LegacyCatalog {
        let legacy = self.legacy_catalog();
        for def in self.degraded() {
            tracing::warn!(
                id = %def.id(),
                behavior = def.behavior_layers().len(),
                placement = def.placement_layers().len(),
                "Built-in definition has degraded layers"
            );
        }
        registry.apply_builtins(self.definitions);
        catalog.apply_builtins(self.catalog);
        legacy
    }
}
