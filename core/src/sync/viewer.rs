//! Viewer state machine
//!
//! Keeps a local registry and catalog in step with the coordinator's
//! snapshots, and forwards local edits. Edits apply locally first; the next
//! authored snapshot replaces them either way.

use aurafx_shared::{CatalogEntry, EffectDefinition, EffectId, encode_definition};

use super::messages::{
    ChangeKind, ChangeRejected, DEFAULT_MAX_FRAME_BYTES, DefinitionChange, DeleteRequest,
    FrameError, PreviewToggle, PublishRequest, RejectReason, SyncMessage,
};
use super::snapshot::{decode_authored, decode_catalog, record_from_entry};
use crate::catalog::Catalog;
use crate::registry::{Registry, RegistryError, SaveOutcome};
use crate::session::EditSink;

/// Events emitted by the viewer
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    AuthoredApplied {
        revision: u64,
        applied: usize,
        skipped: usize,
    },
    CatalogApplied {
        revision: u64,
        applied: usize,
        skipped: usize,
    },
    /// A snapshot older than the one already applied arrived
    StaleSnapshot { revision: u64, current: u64 },
    ChangeRejected {
        id: String,
        reason: RejectReason,
        message: Option<String>,
    },
    FrameDropped(FrameError),
}

/// Viewer side of the sync protocol
pub struct SyncClient {
    registry: Registry,
    catalog: Catalog,
    outbox: Vec<Vec<u8>>,
    authored_revision: Option<u64>,
    catalog_revision: Option<u64>,
    max_frame_bytes: usize,
}

impl SyncClient {
    /// Create a viewer over a registry and catalog with built-ins applied
    pub fn new(registry: Registry, catalog: Catalog) -> Self {
        Self {
            registry,
            catalog,
            outbox: Vec::new(),
            authored_revision: None,
            catalog_revision: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// For built-in reloads
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Revision of the last applied authored snapshot
    pub fn authored_revision(&self) -> Option<u64> {
        self.authored_revision
    }

    pub fn catalog_revision(&self) -> Option<u64> {
        self.catalog_revision
    }

    /// Start a fresh link: forget revisions and ask for both snapshots.
    ///
    /// A restarted coordinator counts revisions from zero again.
    pub fn connect(&mut self) {
        self.authored_revision = None;
        self.catalog_revision = None;
        self.send(&SyncMessage::SyncRequest);
    }

    /// Frames queued for the coordinator, in order
    pub fn drain_outgoing(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.outbox)
    }

    pub fn handle_frame(&mut self, bytes: &[u8]) -> Option<ClientEvent> {
        match SyncMessage::from_bytes_limited(bytes, self.max_frame_bytes) {
            Ok(msg) => self.handle_message(msg),
            Err(error) => {
                tracing::warn!("Dropping frame: {}", error);
                Some(ClientEvent::FrameDropped(error))
            }
        }
    }

    pub fn handle_message(&mut self, msg: SyncMessage) -> Option<ClientEvent> {
        match msg {
            SyncMessage::AuthoredSnapshot(snapshot) => {
                if let Some(current) = stale(self.authored_revision, snapshot.revision) {
                    tracing::debug!(revision = snapshot.revision, current, "Ignoring stale authored snapshot");
                    return Some(ClientEvent::StaleSnapshot {
                        revision: snapshot.revision,
                        current,
                    });
                }

                let decoded = decode_authored(&snapshot);
                let applied = decoded.records.len();
                self.registry.apply_authored_snapshot(decoded.records);
                self.authored_revision = Some(snapshot.revision);
                tracing::debug!(
                    revision = snapshot.revision,
                    applied,
                    skipped = decoded.skipped,
                    "Applied authored snapshot"
                );
                Some(ClientEvent::AuthoredApplied {
                    revision: snapshot.revision,
                    applied,
                    skipped: decoded.skipped,
                })
            }
            SyncMessage::CatalogSnapshot(snapshot) => {
                if let Some(current) = stale(self.catalog_revision, snapshot.revision) {
                    tracing::debug!(revision = snapshot.revision, current, "Ignoring stale catalog snapshot");
                    return Some(ClientEvent::StaleSnapshot {
                        revision: snapshot.revision,
                        current,
                    });
                }

                let decoded = decode_catalog(&snapshot);
                let applied = decoded.records.len();
                self.catalog.apply_published_snapshot(decoded.records);
                self.catalog_revision = Some(snapshot.revision);
                Some(ClientEvent::CatalogApplied {
                    revision: snapshot.revision,
                    applied,
                    skipped: decoded.skipped,
                })
            }
            SyncMessage::ChangeRejected(ChangeRejected {
                id,
                reason,
                message,
            }) => {
                tracing::warn!(id = %id, ?reason, message = ?message, "Change rejected by coordinator");
                Some(ClientEvent::ChangeRejected {
                    id,
                    reason,
                    message,
                })
            }
            other => {
                tracing::warn!(kind = other.kind(), "Unexpected message from coordinator");
                None
            }
        }
    }

    fn send(&mut self, msg: &SyncMessage) {
        self.outbox.push(msg.to_bytes());
    }
}

/// `Some(current)` when `incoming` is older than the applied revision
fn stale(applied: Option<u64>, incoming: u64) -> Option<u64> {
    applied.filter(|&current| incoming < current)
}

/// Local edits apply immediately and are forwarded to the coordinator.
impl EditSink for SyncClient {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn commit(
        &mut self,
        definition: &EffectDefinition,
        kind: ChangeKind,
    ) -> Result<SaveOutcome, RegistryError> {
        let outcome = self.registry.save(definition.clone())?;
        let id = definition.id();
        let body = self.registry.get(id).map(encode_definition);
        self.send(&SyncMessage::DefinitionChange(DefinitionChange {
            kind,
            id: id.to_string(),
            body,
        }));
        Ok(outcome)
    }

    fn retract(&mut self, id: &EffectId) -> Result<(), RegistryError> {
        self.registry.delete(id)?;
        self.send(&SyncMessage::DeleteRequest(DeleteRequest { id: id.to_string() }));
        Ok(())
    }

    fn toggle_preview(&mut self, enable: bool, target: Option<&EffectId>) {
        self.send(&SyncMessage::PreviewToggle(PreviewToggle {
            enable,
            target: target.map(ToString::to_string),
        }));
    }

    fn publish(&mut self, entry: CatalogEntry) {
        let record = record_from_entry(&entry);
        self.catalog.publish(entry);
        self.send(&SyncMessage::PublishRequest(PublishRequest { entry: record }));
    }
}
