//! Editing sessions
//!
//! One session edits one definition at a time. It keeps the last saved
//! snapshot next to the working copy, debounces preview rebuilds, and sends
//! saves, deletes and publishes through an [`EditSink`].
//!
//! ```text
//!            select                mutate              save
//!   Idle ------------> Clean ---------------> Dirty ---------> Clean
//!     |                  ^                      |
//!     | begin_new        |        revert        |
//!     v                  +----------------------+
//!    New --- save ---> Clean
//!     |
//!     +--- revert ---> Idle
//! ```
//!
//! Preview rebuilds are driven by the caller's tick loop: every mutation
//! pushes the deadline out by the debounce interval and [`EditingSession::tick`]
//! rebuilds once it has passed.

mod edit;

#[cfg(test)]
mod tests;

pub use edit::{BehaviorEdit, FieldEdit, MetadataEdit, PlacementEdit};

use std::time::{Duration, Instant};

use aurafx_shared::{CatalogEntry, EffectDefinition, EffectId, Provenance, Rarity};
use thiserror::Error;

use crate::config::PreviewConfig;
use crate::registry::{Registry, RegistryError, SaveOutcome};
use crate::resolver::PreviewSource;
use crate::sync::ChangeKind;

/// Default preview debounce interval
pub const DEFAULT_PREVIEW_DEBOUNCE: Duration = Duration::from_millis(100);

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing selected
    Idle,
    /// Working copy equals the saved snapshot
    Clean,
    /// Working copy has unsaved changes
    Dirty,
    /// No saved snapshot exists yet
    New,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no definition selected")]
    NothingSelected,
    #[error("no unsaved changes")]
    NothingToSave,
    #[error("definition {0} already exists")]
    AlreadyExists(EffectId),
    #[error("definition {0} not found")]
    NotFound(EffectId),
    #[error("definition {id} cannot be published: {reason}")]
    Unpublishable { id: EffectId, reason: &'static str },
    #[error("layer {index} out of range ({count} layers)")]
    LayerOutOfRange { index: usize, count: usize },
    #[error("definitions hold at most {max} layers")]
    LayerLimit { max: usize },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Where a session sends its changes.
///
/// Implemented by both sides of a sync link: a viewer applies changes
/// optimistically and forwards them, the coordinator applies them directly.
pub trait EditSink {
    fn registry(&self) -> &Registry;

    /// Store `definition` and announce it
    fn commit(
        &mut self,
        definition: &EffectDefinition,
        kind: ChangeKind,
    ) -> Result<SaveOutcome, RegistryError>;

    /// Delete the authored definition `id` and announce it
    fn retract(&mut self, id: &EffectId) -> Result<(), RegistryError>;

    /// Informational; previews are rendered locally
    fn toggle_preview(&mut self, enable: bool, target: Option<&EffectId>);

    fn publish(&mut self, entry: CatalogEntry);
}

/// Listing details for [`EditingSession::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub catalog_ref: EffectId,
    pub display_name: String,
    pub icon_ref: String,
    pub icon_tint: Option<u32>,
    pub rarity: Option<Rarity>,
    pub price: Option<u32>,
}

impl Listing {
    pub fn new(catalog_ref: EffectId, display_name: impl Into<String>) -> Self {
        Self {
            catalog_ref,
            display_name: display_name.into(),
            icon_ref: String::new(),
            icon_tint: None,
            rarity: None,
            price: None,
        }
    }

    fn into_entry(self, definition_ref: EffectId) -> CatalogEntry {
        CatalogEntry {
            catalog_ref: self.catalog_ref,
            definition_ref,
            display_name: self.display_name,
            icon_ref: self.icon_ref,
            icon_tint: self.icon_tint,
            rarity: self.rarity,
            price: self.price,
            provenance: Provenance::Authored,
        }
    }
}

/// Editing context for one definition
#[derive(Debug, Clone)]
pub struct EditingSession {
    state: SessionState,
    snapshot: Option<EffectDefinition>,
    working: Option<EffectDefinition>,
    preview_mode: bool,
    preview_override: Option<EffectDefinition>,
    preview_deadline: Option<Instant>,
    debounce: Duration,
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_DEBOUNCE)
    }
}

impl EditingSession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            snapshot: None,
            working: None,
            preview_mode: false,
            preview_override: None,
            preview_deadline: None,
            debounce,
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(config.debounce())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the working copy has unsaved content
    pub fn dirty(&self) -> bool {
        matches!(self.state, SessionState::Dirty | SessionState::New)
    }

    pub fn is_new(&self) -> bool {
        self.state == SessionState::New
    }

    pub fn working(&self) -> Option<&EffectDefinition> {
        self.working.as_ref()
    }

    pub fn snapshot(&self) -> Option<&EffectDefinition> {
        self.snapshot.as_ref()
    }

    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    /// Whether a preview rebuild is scheduled
    pub fn preview_pending(&self) -> bool {
        self.preview_deadline.is_some()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Id of the definition being edited
    pub fn target(&self) -> Option<&EffectId> {
        self.working.as_ref().map(EffectDefinition::id)
    }

    /// Load `id` from the registry for editing
    pub fn select(&mut self, registry: &Registry, id: &EffectId) -> Result<(), SessionError> {
        let definition = registry
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?
            .clone()
            .repair();

        self.reset();
        self.snapshot = Some(definition.clone());
        self.working = Some(definition);
        self.state = SessionState::Clean;
        tracing::debug!(id = %id, "Selected definition for editing");
        Ok(())
    }

    /// Start a definition that does not exist yet
    pub fn begin_new(&mut self, registry: &Registry, id: EffectId) -> Result<(), SessionError> {
        if registry.contains(&id) {
            return Err(SessionError::AlreadyExists(id));
        }

        self.reset();
        tracing::debug!(id = %id, "Started new definition");
        self.working = Some(EffectDefinition::new(id));
        self.state = SessionState::New;
        Ok(())
    }

    /// Apply one field edit
    pub fn mutate_field(&mut self, edit: FieldEdit, now: Instant) -> Result<(), SessionError> {
        let working = self.working.as_ref().ok_or(SessionError::NothingSelected)?;
        let next = edit.apply(working.clone())?;
        self.replace_working(next, now);
        Ok(())
    }

    /// Apply an arbitrary transformation. The id cannot change.
    pub fn mutate_with(
        &mut self,
        f: impl FnOnce(EffectDefinition) -> EffectDefinition,
        now: Instant,
    ) -> Result<(), SessionError> {
        let working = self.working.as_ref().ok_or(SessionError::NothingSelected)?;
        let id = working.id().clone();
        let mut next = f(working.clone());
        if next.id() != &id {
            tracing::warn!(id = %id, returned = %next.id(), "Ignoring id change in edit");
            let metadata = next.metadata().clone();
            let (behavior, placement) = next.into_layers();
            next = EffectDefinition::from_parts(id, behavior, placement, metadata);
        }
        self.replace_working(next, now);
        Ok(())
    }

    fn replace_working(&mut self, next: EffectDefinition, now: Instant) {
        self.working = Some(next.repair());
        if self.state != SessionState::New {
            self.state = SessionState::Dirty;
        }
        self.preview_deadline = Some(now + self.debounce);
    }

    /// Rebuild the preview override once the debounce window has passed.
    ///
    /// Returns whether a rebuild happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.preview_deadline {
            Some(deadline) if now >= deadline => {
                self.preview_deadline = None;
                self.preview_override = self.working.clone();
                tracing::trace!(
                    id = ?self.target().map(ToString::to_string),
                    "Rebuilt preview override"
                );
                true
            }
            _ => false,
        }
    }

    /// Send the working copy through `sink`
    pub fn save(&mut self, sink: &mut impl EditSink) -> Result<SaveOutcome, SessionError> {
        let kind = match self.state {
            SessionState::Idle => return Err(SessionError::NothingSelected),
            SessionState::Clean => return Err(SessionError::NothingToSave),
            SessionState::Dirty => ChangeKind::Update,
            SessionState::New => ChangeKind::Create,
        };
        let working = self.working.as_ref().ok_or(SessionError::NothingSelected)?;

        let outcome = sink.commit(working, kind)?;
        self.snapshot = Some(working.clone());
        self.state = SessionState::Clean;
        // The registry now holds the saved copy; later snapshots must win
        self.preview_override = None;
        self.preview_deadline = None;
        Ok(outcome)
    }

    /// Discard unsaved changes. A new definition is abandoned.
    pub fn revert(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Err(SessionError::NothingSelected),
            SessionState::New => {
                tracing::debug!(id = ?self.target().map(ToString::to_string), "Abandoned new definition");
                self.close();
                Ok(())
            }
            SessionState::Clean | SessionState::Dirty => {
                self.working = self.snapshot.clone();
                self.preview_override = None;
                self.preview_deadline = None;
                self.state = SessionState::Clean;
                Ok(())
            }
        }
    }

    /// Delete the selected definition. Only authored definitions qualify.
    pub fn delete(&mut self, sink: &mut impl EditSink) -> Result<(), SessionError> {
        let id = self.target().cloned().ok_or(SessionError::NothingSelected)?;

        let registry = sink.registry();
        if !registry.is_authored(&id) {
            return Err(if registry.is_builtin(&id) {
                RegistryError::Permission(id).into()
            } else {
                SessionError::NotFound(id)
            });
        }

        sink.retract(&id)?;
        self.close();
        Ok(())
    }

    /// Turn live preview of the working copy on or off
    pub fn set_preview_mode(&mut self, enable: bool, sink: &mut impl EditSink) {
        if self.preview_mode == enable {
            return;
        }
        self.preview_mode = enable;
        sink.toggle_preview(enable, self.target());
    }

    /// Publish the saved definition as a catalog entry
    pub fn publish(
        &mut self,
        sink: &mut impl EditSink,
        listing: Listing,
    ) -> Result<CatalogEntry, SessionError> {
        let id = self.target().cloned().ok_or(SessionError::NothingSelected)?;
        match self.state {
            SessionState::Clean => {}
            SessionState::New => {
                return Err(SessionError::Unpublishable {
                    id,
                    reason: "never saved",
                });
            }
            SessionState::Dirty => {
                return Err(SessionError::Unpublishable {
                    id,
                    reason: "unsaved changes",
                });
            }
            SessionState::Idle => return Err(SessionError::NothingSelected),
        }
        if !sink.registry().contains(&id) {
            return Err(SessionError::Unpublishable {
                id,
                reason: "not in registry",
            });
        }

        let entry = listing.into_entry(id);
        sink.publish(entry.clone());
        Ok(entry)
    }

    /// End the session. Pending preview rebuilds never fire.
    pub fn close(&mut self) {
        if self.preview_mode {
            tracing::debug!("Closing session with live preview on");
        }
        self.reset();
        self.preview_mode = false;
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.snapshot = None;
        self.working = None;
        self.preview_override = None;
        self.preview_deadline = None;
    }
}

impl PreviewSource for EditingSession {
    fn preview_override(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.preview_override.as_ref().filter(|def| def.id() == id)
    }

    fn live_preview(&self, id: &EffectId) -> Option<&EffectDefinition> {
        if !self.preview_mode {
            return None;
        }
        self.working.as_ref().filter(|def| def.id() == id)
    }
}
