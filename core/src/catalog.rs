//! Published catalog and the legacy pattern catalog.

use aurafx_shared::{CatalogEntry, EffectId, PlacementLayer, Provenance};
use hashbrown::{HashMap, HashSet};

use crate::partition::Partitioned;

/// Published references players can pick, keyed by `catalog_ref`.
///
/// Shipped entries and runtime-published entries live in separate
/// partitions, like [`Registry`](crate::Registry) definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Partitioned<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every shipped entry
    pub fn apply_builtins(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) {
        let set: HashMap<EffectId, CatalogEntry> = entries
            .into_iter()
            .map(|mut entry| {
                entry.provenance = Provenance::Builtin;
                (entry.catalog_ref.clone(), entry)
            })
            .collect();
        self.entries.replace_builtin(set);
    }

    /// Replace every published entry with an authoritative snapshot
    pub fn apply_published_snapshot(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) {
        let set: HashMap<EffectId, CatalogEntry> = entries
            .into_iter()
            .map(|mut entry| {
                entry.provenance = Provenance::Authored;
                (entry.catalog_ref.clone(), entry)
            })
            .collect();
        self.entries.replace_authored(set);
    }

    /// Publish or republish one entry. Returns the entry it replaced.
    pub fn publish(&mut self, mut entry: CatalogEntry) -> Option<CatalogEntry> {
        entry.provenance = Provenance::Authored;
        tracing::info!(
            catalog_ref = %entry.catalog_ref,
            definition_ref = %entry.definition_ref,
            "Published catalog entry"
        );
        self.entries.insert_authored(entry.catalog_ref.clone(), entry)
    }

    pub fn get(&self, catalog_ref: &EffectId) -> Option<&CatalogEntry> {
        self.entries.get(catalog_ref)
    }

    /// Every effective entry, sorted by catalog ref
    pub fn all(&self) -> Vec<&CatalogEntry> {
        self.entries.effective().into_iter().map(|(_, e)| e).collect()
    }

    /// Runtime-published entries only, sorted by catalog ref
    pub fn published(&self) -> Vec<&CatalogEntry> {
        self.entries
            .authored_sorted()
            .into_iter()
            .map(|(_, e)| e)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The simple pattern catalog that predates layered definitions.
///
/// Maps a reference to a list of placement layers, and knows which ids are
/// rendering primitives. Read-only at runtime.
#[derive(Debug, Clone, Default)]
pub struct LegacyCatalog {
    patterns: HashMap<EffectId, Vec<PlacementLayer>>,
    primitives: HashSet<EffectId>,
}

impl LegacyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, id: EffectId, layers: Vec<PlacementLayer>) -> Self {
        self.insert_pattern(id, layers);
        self
    }

    pub fn with_primitive(mut self, id: EffectId) -> Self {
        self.primitives.insert(id);
        self
    }

    pub fn insert_pattern(&mut self, id: EffectId, layers: Vec<PlacementLayer>) {
        self.patterns.insert(id, layers);
    }

    pub fn insert_primitive(&mut self, id: EffectId) {
        self.primitives.insert(id);
    }

    /// Placement layers for `id`, if a non-empty pattern exists
    pub fn pattern(&self, id: &EffectId) -> Option<&[PlacementLayer]> {
        self.patterns
            .get(id)
            .map(Vec::as_slice)
            .filter(|layers| !layers.is_empty())
    }

    pub fn is_primitive(&self, id: &EffectId) -> bool {
        self.primitives.contains(id)
    }

    /// Known primitives, sorted
    pub fn primitives(&self) -> Vec<&EffectId> {
        let mut out: Vec<&EffectId> = self.primitives.iter().collect();
        out.sort();
        out
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
