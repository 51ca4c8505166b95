//! Reference resolution
//!
//! Decides what a viewer renders for a reference. Evaluated every render
//! tick, so it only borrows; the merge fallback is the one path that builds
//! a new definition.
//!
//! Priority, first match wins:
//!
//! 1. preview override set by an editing session
//! 2. live working copy of a session in preview mode
//! 3. registry definition with placement layers
//! 4. registry definition without placement layers, merged with a legacy
//!    pattern
//! 5. a known rendering primitive, drawn with a minimal pattern
//! 6. the default fallback primitive

use std::borrow::Cow;

use aurafx_shared::model::fallback_primitive;
use aurafx_shared::{EffectDefinition, EffectId, PlacementLayer, Provenance};

use crate::catalog::{Catalog, LegacyCatalog};
use crate::registry::Registry;

/// What a caller asks to render
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EffectRef {
    /// A catalog reference
    Published(EffectId),
    /// A definition id
    Definition(EffectId),
}

impl EffectRef {
    pub fn id(&self) -> &EffectId {
        match self {
            EffectRef::Published(id) | EffectRef::Definition(id) => id,
        }
    }
}

/// Where a resolved definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    PreviewOverride,
    PreviewSession,
    Authored,
    Builtin,
    /// Registry behavior layers with legacy placement layers
    Merged,
}

impl From<Provenance> for Origin {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Authored => Origin::Authored,
            Provenance::Builtin => Origin::Builtin,
        }
    }
}

/// Resolution outcome. A miss is [`Resolution::Default`], never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Resolved {
        definition: Cow<'a, EffectDefinition>,
        origin: Origin,
    },
    /// Render a minimal pattern around `primitive`
    Simple { primitive: &'a EffectId },
    /// Render the default fallback primitive
    Default,
}

impl Resolution<'_> {
    pub fn definition(&self) -> Option<&EffectDefinition> {
        match self {
            Resolution::Resolved { definition, .. } => Some(definition),
            _ => None,
        }
    }

    pub fn origin(&self) -> Option<Origin> {
        match self {
            Resolution::Resolved { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    /// Placement layers to spawn for this outcome
    pub fn placement_layers(&self) -> Cow<'_, [PlacementLayer]> {
        match self {
            Resolution::Resolved { definition, .. } => {
                Cow::Borrowed(definition.placement_layers())
            }
            Resolution::Simple { primitive } => {
                Cow::Owned(vec![PlacementLayer::around((*primitive).clone())])
            }
            Resolution::Default => Cow::Owned(vec![PlacementLayer::around(fallback_primitive())]),
        }
    }
}

/// In-progress edits visible to the resolver
pub trait PreviewSource {
    /// Debounced preview snapshot for `id`
    fn preview_override(&self, id: &EffectId) -> Option<&EffectDefinition>;

    /// Working copy for `id` while live preview is on
    fn live_preview(&self, id: &EffectId) -> Option<&EffectDefinition>;
}

/// No editing session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreview;

impl PreviewSource for NoPreview {
    fn preview_override(&self, _id: &EffectId) -> Option<&EffectDefinition> {
        None
    }

    fn live_preview(&self, _id: &EffectId) -> Option<&EffectDefinition> {
        None
    }
}

/// Resolves references against one node's current state.
pub struct Resolver<'a, P: PreviewSource + ?Sized = NoPreview> {
    registry: &'a Registry,
    catalog: &'a Catalog,
    legacy: &'a LegacyCatalog,
    preview: &'a P,
}

impl<'a> Resolver<'a, NoPreview> {
    pub fn new(registry: &'a Registry, catalog: &'a Catalog, legacy: &'a LegacyCatalog) -> Self {
        Self {
            registry,
            catalog,
            legacy,
            preview: &NoPreview,
        }
    }
}

impl<'a, P: PreviewSource + ?Sized> Resolver<'a, P> {
    /// Consult `preview` before the registry
    pub fn with_preview<Q: PreviewSource + ?Sized>(self, preview: &'a Q) -> Resolver<'a, Q> {
        Resolver {
            registry: self.registry,
            catalog: self.catalog,
            legacy: self.legacy,
            preview,
        }
    }

    /// Definition id a reference points at.
    ///
    /// A published reference follows its catalog entry; one without an
    /// entry is treated as a definition id.
    pub fn target_id(&self, reference: &'a EffectRef) -> &'a EffectId {
        match reference {
            EffectRef::Definition(id) => id,
            EffectRef::Published(catalog_ref) => self
                .catalog
                .get(catalog_ref)
                .map(|entry| &entry.definition_ref)
                .unwrap_or(catalog_ref),
        }
    }

    pub fn resolve(&self, reference: &'a EffectRef) -> Resolution<'a> {
        let target = self.target_id(reference);

        if let Some(definition) = self.preview.preview_override(target) {
            return resolved(definition, Origin::PreviewOverride);
        }

        if let Some(definition) = self.preview.live_preview(target) {
            return resolved(definition, Origin::PreviewSession);
        }

        if let Some(definition) = self.registry.get(target) {
            if !definition.placement_layers().is_empty() {
                let origin = self
                    .registry
                    .provenance(target)
                    .map(Origin::from)
                    .unwrap_or(Origin::Builtin);
                return resolved(definition, origin);
            }

            if let Some(pattern) = self.legacy_pattern(reference, target) {
                tracing::trace!(id = %target, "Merging legacy placement into definition");
                let merged = EffectDefinition::from_parts(
                    definition.id().clone(),
                    definition.behavior_layers().to_vec(),
                    pattern.to_vec(),
                    definition.metadata().clone(),
                );
                return Resolution::Resolved {
                    definition: Cow::Owned(merged),
                    origin: Origin::Merged,
                };
            }

            tracing::trace!(id = %target, "Definition has no placement layers");
        }

        if self.legacy.is_primitive(target) {
            return Resolution::Simple { primitive: target };
        }

        Resolution::Default
    }

    /// Legacy pattern for the target id, then for the catalog ref itself
    fn legacy_pattern(
        &self,
        reference: &EffectRef,
        target: &EffectId,
    ) -> Option<&'a [PlacementLayer]> {
        self.legacy.pattern(target).or_else(|| match reference {
            EffectRef::Published(catalog_ref) => self.legacy.pattern(catalog_ref),
            EffectRef::Definition(_) => None,
        })
    }
}

fn resolved(definition: &EffectDefinition, origin: Origin) -> Resolution<'_> {
    Resolution::Resolved {
        definition: Cow::Borrowed(definition),
        origin,
    }
}
