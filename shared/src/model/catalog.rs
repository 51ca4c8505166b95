//! Published catalog entries and provenance tags.

use serde::{Deserialize, Serialize};

use super::kinds::Rarity;
use crate::ids::EffectId;

/// Where a stored definition or catalog entry came from.
///
/// Local bookkeeping only; never part of an encoded definition body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Shipped with the build. Not deletable, never written to user storage.
    Builtin,
    /// Created or edited at runtime. Deletable and persisted.
    Authored,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Builtin => "builtin",
            Provenance::Authored => "authored",
        }
    }
}

/// A published reference that players can pick, pointing at a definition.
///
/// `definition_ref` need not resolve; such an entry renders through the
/// resolver's fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub catalog_ref: EffectId,
    pub definition_ref: EffectId,
    pub display_name: String,
    pub icon_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_tint: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
    #[serde(default = "default_provenance")]
    pub provenance: Provenance,
}

fn default_provenance() -> Provenance {
    Provenance::Builtin
}

impl CatalogEntry {
    /// Minimal authored entry for `definition_ref` under `catalog_ref`.
    pub fn authored(
        catalog_ref: EffectId,
        definition_ref: EffectId,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            catalog_ref,
            definition_ref,
            display_name: display_name.into(),
            icon_ref: String::new(),
            icon_tint: None,
            rarity: None,
            price: None,
            provenance: Provenance::Authored,
        }
    }
}
