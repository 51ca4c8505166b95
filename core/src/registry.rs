//! Effect definition registry
//!
//! Holds built-in and authored definitions under one id space. The authored
//! partition shadows the built-in one; each is replaced wholesale by its own
//! operation so a sync never disturbs shipped data and an asset reload never
//! disturbs authored data.

use aurafx_shared::codec::MAX_WIRE_STRING_LEN;
use aurafx_shared::{EffectDefinition, EffectId, MAX_LAYERS, Provenance};
use hashbrown::HashMap;
use thiserror::Error;

use crate::partition::Partitioned;

/// Errors returned by registry mutations. The registry is unchanged on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The definition breaks an invariant that repair cannot restore
    #[error("definition {id} is invalid: {reason}")]
    Validation { id: EffectId, reason: String },
    /// The operation is not allowed on a built-in definition
    #[error("definition {0} is built-in and cannot be deleted")]
    Permission(EffectId),
    /// No authored definition with this id
    #[error("no authored definition {0}")]
    NotFound(EffectId),
}

/// What a successful [`Registry::save`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new id
    Created,
    /// Replaced an earlier authored definition
    Updated,
    /// First authored definition shadowing a built-in
    OverrodeBuiltin,
}

/// Built-in and authored effect definitions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: Partitioned<EffectDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every built-in definition. Authored definitions are untouched.
    ///
    /// Built-ins are stored as shipped, without repair.
    pub fn apply_builtins(&mut self, definitions: impl IntoIterator<Item = EffectDefinition>) {
        let set = index(definitions);
        tracing::debug!(count = set.len(), "Applying built-in definitions");
        self.definitions.replace_builtin(set);
    }

    /// Replace every authored definition. Built-in definitions are untouched.
    ///
    /// Authored ids missing from `definitions` are gone afterwards. Each
    /// definition is repaired, since decoding may drop layers from one list.
    pub fn apply_authored_snapshot(
        &mut self,
        definitions: impl IntoIterator<Item = EffectDefinition>,
    ) {
        let set = index(definitions.into_iter().map(EffectDefinition::repair));
        tracing::debug!(count = set.len(), "Applying authored snapshot");
        self.definitions.replace_authored(set);
    }

    /// Effective definition for `id`: authored if present, else built-in
    pub fn get(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.definitions.get(id)
    }

    /// Built-in definition for `id`, even when an authored one shadows it
    pub fn builtin(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.definitions.builtin(id)
    }

    pub fn contains(&self, id: &EffectId) -> bool {
        self.definitions.get(id).is_some()
    }

    pub fn is_authored(&self, id: &EffectId) -> bool {
        self.definitions.authored(id).is_some()
    }

    pub fn is_builtin(&self, id: &EffectId) -> bool {
        self.definitions.builtin(id).is_some()
    }

    /// Provenance of the effective definition for `id`
    pub fn provenance(&self, id: &EffectId) -> Option<Provenance> {
        self.definitions.provenance(id)
    }

    /// Every effective definition, sorted by id
    pub fn all(&self) -> Vec<&EffectDefinition> {
        self.definitions
            .effective()
            .into_iter()
            .map(|(_, def)| def)
            .collect()
    }

    /// Authored definitions only, sorted by id
    pub fn authored(&self) -> Vec<&EffectDefinition> {
        self.definitions
            .authored_sorted()
            .into_iter()
            .map(|(_, def)| def)
            .collect()
    }

    /// Number of distinct ids
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn authored_len(&self) -> usize {
        self.definitions.authored_len()
    }

    /// Repair, validate and store `definition` as authored.
    pub fn save(&mut self, definition: EffectDefinition) -> Result<SaveOutcome, RegistryError> {
        let definition = definition.repair();
        validate(&definition)?;

        let id = definition.id().clone();
        let shadows_builtin = self.is_builtin(&id);
        let outcome = match self.definitions.insert_authored(id.clone(), definition) {
            Some(_) => SaveOutcome::Updated,
            None if shadows_builtin => SaveOutcome::OverrodeBuiltin,
            None => SaveOutcome::Created,
        };

        tracing::info!(id = %id, ?outcome, "Saved authored definition");
        Ok(outcome)
    }

    /// Remove the authored definition `id`.
    ///
    /// Removing an authored override re-exposes the built-in underneath.
    pub fn delete(&mut self, id: &EffectId) -> Result<EffectDefinition, RegistryError> {
        if let Some(removed) = self.definitions.remove_authored(id) {
            tracing::info!(
                id = %id,
                builtin_restored = self.is_builtin(id),
                "Deleted authored definition"
            );
            return Ok(removed);
        }

        if self.is_builtin(id) {
            tracing::warn!(id = %id, "Refusing to delete built-in definition");
            Err(RegistryError::Permission(id.clone()))
        } else {
            Err(RegistryError::NotFound(id.clone()))
        }
    }
}

fn index(definitions: impl IntoIterator<Item = EffectDefinition>) -> HashMap<EffectId, EffectDefinition> {
    definitions
        .into_iter()
        .map(|def| (def.id().clone(), def))
        .collect()
}

/// Invariants that must hold after repair
fn validate(definition: &EffectDefinition) -> Result<(), RegistryError> {
    if !definition.is_paired() {
        return Err(RegistryError::Validation {
            id: definition.id().clone(),
            reason: format!(
                "{} behavior layers but {} placement layers",
                definition.behavior_layers().len(),
                definition.placement_layers().len()
            ),
        });
    }
    if definition.layer_count() > MAX_LAYERS {
        return Err(RegistryError::Validation {
            id: definition.id().clone(),
            reason: format!("{} layers, maximum is {}", definition.layer_count(), MAX_LAYERS),
        });
    }

    // Every string must fit the body codec and the store
    let max = MAX_WIRE_STRING_LEN as usize;
    let ids = std::iter::once(("id", definition.id())).chain(
        definition
            .placement_layers()
            .iter()
            .map(|layer| ("effect_ref", layer.effect_ref())),
    );
    for (field, id) in ids {
        let len = id.namespace().len() + 1 + id.path().len();
        if len > max {
            return Err(too_long(definition, field, len));
        }
    }

    let metadata = definition.metadata();
    let texts = [
        ("description", &metadata.description),
        ("style_hint", &metadata.style_hint),
        ("display_name", &metadata.display_name),
        ("notes", &metadata.notes),
    ];
    for (field, text) in texts {
        let len = text.as_deref().map_or(0, str::len);
        if len > max {
            return Err(too_long(definition, field, len));
        }
    }
    Ok(())
}

fn too_long(definition: &EffectDefinition, field: &str, len: usize) -> RegistryError {
    RegistryError::Validation {
        id: definition.id().clone(),
        reason: format!("{} is {} bytes, maximum is {}", field, len, MAX_WIRE_STRING_LEN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurafx_shared::{
        BehaviorLayer, BehaviorParams, DefinitionMetadata, MovementKind, PlacementLayer,
        decode_definition, encode_definition,
    };

    fn id(s: &str) -> EffectId {
        EffectId::parse(s).unwrap()
    }

    fn def(name: &str, layers: usize) -> EffectDefinition {
        let mut d = EffectDefinition::new(id(name));
        for _ in 0..layers {
            d = d.with_layer(BehaviorLayer::default(), PlacementLayer::default());
        }
        d
    }

    fn swirl() -> BehaviorLayer {
        BehaviorLayer::new(BehaviorParams {
            movement: MovementKind::Swirl,
            ..Default::default()
        })
    }

    #[test]
    fn test_partition_independence_either_order() {
        let builtins = vec![def("a", 1), def("b", 1)];
        let authored = vec![def("b", 2), def("c", 3)];

        let mut first = Registry::new();
        first.apply_builtins(builtins.clone());
        first.apply_authored_snapshot(authored.clone());

        let mut second = Registry::new();
        second.apply_authored_snapshot(authored);
        second.apply_builtins(builtins);

        for name in ["a", "b", "c", "d"] {
            assert_eq!(first.get(&id(name)), second.get(&id(name)), "id {}", name);
        }
        assert_eq!(first.get(&id("a")).unwrap().layer_count(), 1);
        assert_eq!(first.get(&id("b")).unwrap().layer_count(), 2);
        assert_eq!(first.get(&id("c")).unwrap().layer_count(), 3);
        assert!(first.get(&id("d")).is_none());
    }

    #[test]
    fn test_authored_snapshot_is_full_replace() {
        let mut registry = Registry::new();
        registry.apply_builtins(vec![def("shipped", 1)]);
        registry.apply_authored_snapshot(vec![def("one", 1), def("two", 1)]);
        registry.apply_authored_snapshot(vec![def("two", 2)]);

        assert!(registry.get(&id("one")).is_none());
        assert_eq!(registry.get(&id("two")).unwrap().layer_count(), 2);
        assert!(registry.get(&id("shipped")).is_some());
    }

    #[test]
    fn test_save_repairs_unpaired_layers() {
        let mut registry = Registry::new();
        let unpaired = EffectDefinition::new(id("new_aura")).with_behavior_layers(vec![swirl(), swirl()]);

        assert_eq!(registry.save(unpaired), Ok(SaveOutcome::Created));

        let saved = registry.get(&id("new_aura")).unwrap();
        assert_eq!(saved.placement_layers().len(), 2);
        assert!(saved.placement_layers().iter().all(|p| *p == PlacementLayer::default()));
        assert!(registry.is_authored(&id("new_aura")));
    }

    #[test]
    fn test_save_rejects_text_the_codec_cannot_carry() {
        let mut registry = Registry::new();
        let with_notes = |len: usize| {
            def("noted", 1).with_metadata(DefinitionMetadata {
                notes: Some("n".repeat(len)),
                ..Default::default()
            })
        };

        let at_limit = with_notes(MAX_WIRE_STRING_LEN as usize);
        assert_eq!(registry.save(at_limit.clone()), Ok(SaveOutcome::Created));
        let decoded = decode_definition(&encode_definition(&at_limit), id("noted")).unwrap();
        assert_eq!(decoded, at_limit);

        let over = with_notes(MAX_WIRE_STRING_LEN as usize + 1);
        assert!(matches!(
            registry.save(over),
            Err(RegistryError::Validation { ref reason, .. }) if reason.starts_with("notes")
        ));
        assert_eq!(registry.get(&id("noted")), Some(&at_limit));
    }

    #[test]
    fn test_save_outcomes() {
        let mut registry = Registry::new();
        registry.apply_builtins(vec![def("crown", 1)]);

        assert_eq!(registry.save(def("crown", 2)), Ok(SaveOutcome::OverrodeBuiltin));
        assert_eq!(registry.save(def("crown", 3)), Ok(SaveOutcome::Updated));
        assert_eq!(registry.save(def("fresh", 1)), Ok(SaveOutcome::Created));
        assert_eq!(registry.provenance(&id("crown")), Some(Provenance::Authored));
        assert!(registry.is_builtin(&id("crown")));
        assert_eq!(registry.builtin(&id("crown")).unwrap().layer_count(), 1);
    }

    #[test]
    fn test_delete_builtin_is_rejected_and_unchanged() {
        let mut registry = Registry::new();
        registry.apply_builtins(vec![def("crown", 1)]);
        let before = registry.get(&id("crown")).cloned();

        assert_eq!(
            registry.delete(&id("crown")),
            Err(RegistryError::Permission(id("crown")))
        );
        assert_eq!(registry.get(&id("crown")).cloned(), before);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_delete_override_reexposes_builtin() {
        let mut registry = Registry::new();
        registry.apply_builtins(vec![def("crown", 1)]);
        registry.save(def("crown", 4)).unwrap();

        let removed = registry.delete(&id("crown")).unwrap();
        assert_eq!(removed.layer_count(), 4);
        assert_eq!(registry.get(&id("crown")).unwrap().layer_count(), 1);
        assert_eq!(registry.provenance(&id("crown")), Some(Provenance::Builtin));

        // the built-in underneath is still protected
        assert!(matches!(
            registry.delete(&id("crown")),
            Err(RegistryError::Permission(_))
        ));
    }

    #[test]
    fn test_delete_unknown() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.delete(&id("ghost")),
            Err(RegistryError::NotFound(id("ghost")))
        );
    }

    #[test]
    fn test_all_and_authored_sorted() {
        let mut registry = Registry::new();
        registry.apply_builtins(vec![def("zeta", 1), def("alpha", 1)]);
        registry.save(def("mid", 1)).unwrap();
        registry.save(def("alpha", 2)).unwrap();

        let all: Vec<String> = registry.all().iter().map(|d| d.id().to_string()).collect();
        assert_eq!(all, vec!["aurafx:alpha", "aurafx:mid", "aurafx:zeta"]);

        let authored: Vec<String> = registry.authored().iter().map(|d| d.id().to_string()).collect();
        assert_eq!(authored, vec!["aurafx:alpha", "aurafx:mid"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.authored_len(), 2);
    }

    #[test]
    fn test_builtins_are_not_repaired() {
        let mut registry = Registry::new();
        let degraded = EffectDefinition::new(id("old")).with_behavior_layers(vec![swirl()]);
        registry.apply_builtins(vec![degraded.clone()]);
        assert_eq!(registry.get(&id("old")), Some(&degraded));
    }
}
