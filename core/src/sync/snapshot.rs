//! Conversions between registry state and snapshot messages.
//!
//! Decoding isolates records: a corrupt id or body drops that record only.

use aurafx_shared::{
    CatalogEntry, EffectDefinition, EffectId, Provenance, Rarity, decode_definition,
    encode_definition,
};

use super::messages::{AuthoredSnapshot, CatalogRecord, CatalogSnapshot, SnapshotEntry};
use crate::catalog::Catalog;
use crate::registry::Registry;

/// Records decoded from a snapshot, and how many were dropped
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// Snapshot of every authored definition in `registry`
pub fn authored_snapshot(registry: &Registry, revision: u64) -> AuthoredSnapshot {
    AuthoredSnapshot {
        revision,
        entries: registry
            .authored()
            .into_iter()
            .map(|def| SnapshotEntry {
                id: def.id().to_string(),
                body: encode_definition(def),
            })
            .collect(),
    }
}

/// Snapshot of every published entry in `catalog`
pub fn catalog_snapshot(catalog: &Catalog, revision: u64) -> CatalogSnapshot {
    CatalogSnapshot {
        revision,
        entries: catalog.published().into_iter().map(record_from_entry).collect(),
    }
}

pub fn decode_authored(snapshot: &AuthoredSnapshot) -> Decoded<EffectDefinition> {
    let mut out = Decoded::default();
    for entry in &snapshot.entries {
        let id = match EffectId::parse(&entry.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(id = %entry.id, "Skipping snapshot record: {}", e);
                out.skipped += 1;
                continue;
            }
        };
        // decode_definition logs its own failures
        match decode_definition(&entry.body, id) {
            Ok(def) => out.records.push(def),
            Err(_) => out.skipped += 1,
        }
    }
    out
}

pub fn decode_catalog(snapshot: &CatalogSnapshot) -> Decoded<CatalogEntry> {
    let mut out = Decoded::default();
    for record in &snapshot.entries {
        match entry_from_record(record) {
            Some(entry) => out.records.push(entry),
            None => out.skipped += 1,
        }
    }
    out
}

pub fn record_from_entry(entry: &CatalogEntry) -> CatalogRecord {
    CatalogRecord {
        catalog_ref: entry.catalog_ref.to_string(),
        definition_ref: entry.definition_ref.to_string(),
        display_name: entry.display_name.clone(),
        icon_ref: entry.icon_ref.clone(),
        icon_tint: entry.icon_tint,
        rarity: entry.rarity.map(|r| r.as_str().to_string()),
        price: entry.price,
    }
}

/// Published entry from a wire record; `None` when a reference is invalid
pub fn entry_from_record(record: &CatalogRecord) -> Option<CatalogEntry> {
    let parse = |field: &str, value: &str| match EffectId::parse(value) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(field, value, "Skipping catalog record: {}", e);
            None
        }
    };

    Some(CatalogEntry {
        catalog_ref: parse("catalog_ref", &record.catalog_ref)?,
        definition_ref: parse("definition_ref", &record.definition_ref)?,
        display_name: record.display_name.clone(),
        icon_ref: record.icon_ref.clone(),
        icon_tint: record.icon_tint,
        rarity: record.rarity.as_deref().and_then(Rarity::from_name),
        price: record.price,
        provenance: Provenance::Authored,
    })
}
