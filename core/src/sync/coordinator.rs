//! Coordinator state machine
//!
//! Owns the authoritative registry and catalog. Validates incoming changes,
//! persists the authored set and rebroadcasts full snapshots. Transport is
//! the caller's job: frames go in through [`SyncHost::handle_frame`] and come
//! out of [`SyncHost::drain_outgoing`].

use std::fmt;

use aurafx_shared::{CatalogEntry, EffectDefinition, EffectId, decode_definition};

use super::messages::{
    ChangeKind, ChangeRejected, DEFAULT_MAX_FRAME_BYTES, DefinitionChange, FrameError,
    PreviewToggle, RejectReason, SyncMessage,
};
use super::snapshot::{authored_snapshot, catalog_snapshot, entry_from_record};
use crate::catalog::Catalog;
use crate::registry::{Registry, RegistryError, SaveOutcome};
use crate::session::EditSink;
use crate::store::{AuthoredStore, StoreError};

/// Transport-assigned peer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Decides which peers may change which definitions.
pub trait EditPolicy {
    fn may_edit(&self, peer: PeerId, id: &EffectId) -> bool;
}

/// Every peer may edit everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl EditPolicy for AllowAll {
    fn may_edit(&self, _peer: PeerId, _id: &EffectId) -> bool {
        true
    }
}

impl<F> EditPolicy for F
where
    F: Fn(PeerId, &EffectId) -> bool,
{
    fn may_edit(&self, peer: PeerId, id: &EffectId) -> bool {
        self(peer, id)
    }
}

/// Events emitted by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PeerJoined(PeerId),
    PeerLeft(PeerId),
    DefinitionSaved {
        peer: PeerId,
        id: EffectId,
        outcome: SaveOutcome,
    },
    DefinitionDeleted {
        peer: PeerId,
        id: EffectId,
    },
    Published {
        peer: PeerId,
        catalog_ref: EffectId,
    },
    PreviewToggled {
        peer: PeerId,
        enable: bool,
        target: Option<EffectId>,
    },
    ChangeRejected {
        peer: PeerId,
        id: String,
        reason: RejectReason,
    },
    FrameDropped {
        peer: PeerId,
        error: FrameError,
    },
}

/// Coordinator side of the sync protocol
pub struct SyncHost<P: EditPolicy = AllowAll> {
    registry: Registry,
    catalog: Catalog,
    store: Option<AuthoredStore>,
    policy: P,
    peers: Vec<PeerId>,
    outbox: Vec<(PeerId, Vec<u8>)>,
    authored_revision: u64,
    catalog_revision: u64,
    max_frame_bytes: usize,
}

impl SyncHost<AllowAll> {
    /// Create a coordinator over a registry and catalog with built-ins applied
    pub fn new(registry: Registry, catalog: Catalog) -> Self {
        Self {
            registry,
            catalog,
            store: None,
            policy: AllowAll,
            peers: Vec::new(),
            outbox: Vec::new(),
            authored_revision: 0,
            catalog_revision: 0,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl<P: EditPolicy> SyncHost<P> {
    pub fn with_policy<Q: EditPolicy>(self, policy: Q) -> SyncHost<Q> {
        SyncHost {
            registry: self.registry,
            catalog: self.catalog,
            store: self.store,
            policy,
            peers: self.peers,
            outbox: self.outbox,
            authored_revision: self.authored_revision,
            catalog_revision: self.catalog_revision,
            max_frame_bytes: self.max_frame_bytes,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    /// Persist the authored set to `store`, loading what it already holds.
    pub fn with_store(mut self, store: AuthoredStore) -> Result<Self, StoreError> {
        let contents = store.load()?;
        tracing::info!(
            path = %store.path().display(),
            definitions = contents.definitions.len(),
            skipped = contents.skipped,
            "Loaded authored store"
        );
        self.registry.apply_authored_snapshot(contents.definitions);
        self.store = Some(store);
        Ok(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn authored_revision(&self) -> u64 {
        self.authored_revision
    }

    pub fn catalog_revision(&self) -> u64 {
        self.catalog_revision
    }

    pub fn peers(&self) -> &[PeerId] {
        &self.peers
    }

    /// Register a peer and send it both snapshots
    pub fn connect(&mut self, peer: PeerId) -> HostEvent {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
        tracing::info!(%peer, "Peer connected");
        self.send_snapshots(peer);
        HostEvent::PeerJoined(peer)
    }

    pub fn disconnect(&mut self, peer: PeerId) -> Option<HostEvent> {
        let index = self.peers.iter().position(|p| *p == peer)?;
        self.peers.remove(index);
        self.outbox.retain(|(to, _)| *to != peer);
        tracing::info!(%peer, "Peer disconnected");
        Some(HostEvent::PeerLeft(peer))
    }

    /// Frames queued for delivery, in order
    pub fn drain_outgoing(&mut self) -> Vec<(PeerId, Vec<u8>)> {
        std::mem::take(&mut self.outbox)
    }

    /// Handle one incoming frame
    pub fn handle_frame(&mut self, from: PeerId, bytes: &[u8]) -> Option<HostEvent> {
        match SyncMessage::from_bytes_limited(bytes, self.max_frame_bytes) {
            Ok(msg) => self.handle_message(from, msg),
            Err(error) => {
                tracing::warn!(peer = %from, "Dropping frame: {}", error);
                Some(HostEvent::FrameDropped { peer: from, error })
            }
        }
    }

    /// Handle an incoming message
    pub fn handle_message(&mut self, from: PeerId, msg: SyncMessage) -> Option<HostEvent> {
        if !self.peers.contains(&from) {
            tracing::warn!(peer = %from, kind = msg.kind(), "Message from unknown peer");
            return None;
        }

        match msg {
            SyncMessage::DefinitionChange(change) => self.handle_change(from, change),
            SyncMessage::DeleteRequest(request) => match self.parse_editable(from, &request.id) {
                Ok(id) => self.handle_delete(from, id),
                Err(event) => Some(event),
            },
            SyncMessage::PublishRequest(request) => {
                let Some(entry) = entry_from_record(&request.entry) else {
                    return Some(self.reject(
                        from,
                        request.entry.catalog_ref,
                        RejectReason::InvalidId,
                        None,
                    ));
                };
                if !self.policy.may_edit(from, &entry.definition_ref) {
                    return Some(self.reject(
                        from,
                        request.entry.catalog_ref,
                        RejectReason::PermissionDenied,
                        None,
                    ));
                }
                let catalog_ref = entry.catalog_ref.clone();
                self.apply_publish(entry);
                Some(HostEvent::Published {
                    peer: from,
                    catalog_ref,
                })
            }
            SyncMessage::PreviewToggle(PreviewToggle { enable, target }) => {
                let target = target.and_then(|t| EffectId::parse(&t).ok());
                tracing::debug!(peer = %from, enable, target = ?target, "Preview toggled");
                Some(HostEvent::PreviewToggled {
                    peer: from,
                    enable,
                    target,
                })
            }
            SyncMessage::SyncRequest => {
                self.send_snapshots(from);
                None
            }
            other => {
                tracing::warn!(peer = %from, kind = other.kind(), "Unexpected message from peer");
                None
            }
        }
    }

    fn handle_change(&mut self, from: PeerId, change: DefinitionChange) -> Option<HostEvent> {
        let id = match self.parse_editable(from, &change.id) {
            Ok(id) => id,
            Err(event) => return Some(event),
        };

        if change.kind == ChangeKind::Delete {
            return self.handle_delete(from, id);
        }

        let Some(body) = change.body else {
            return Some(self.reject(
                from,
                change.id,
                RejectReason::DecodeFailed,
                Some("missing definition body".to_string()),
            ));
        };

        let definition = match decode_definition(&body, id.clone()) {
            Ok(definition) => definition,
            Err(e) => {
                return Some(self.reject(
                    from,
                    change.id,
                    RejectReason::DecodeFailed,
                    Some(e.to_string()),
                ));
            }
        };

        match self.apply_save(definition) {
            Ok(outcome) => {
                if change.kind == ChangeKind::Create && outcome == SaveOutcome::Updated {
                    tracing::debug!(id = %id, "Create for existing id applied as update");
                }
                Some(HostEvent::DefinitionSaved {
                    peer: from,
                    id,
                    outcome,
                })
            }
            Err(e) => Some(self.reject(from, change.id, RejectReason::Invalid, Some(e.to_string()))),
        }
    }

    fn handle_delete(&mut self, from: PeerId, id: EffectId) -> Option<HostEvent> {
        match self.apply_delete(&id) {
            Ok(()) => Some(HostEvent::DefinitionDeleted { peer: from, id }),
            Err(e) => {
                let reason = match e {
                    RegistryError::Permission(_) => RejectReason::Builtin,
                    RegistryError::NotFound(_) => RejectReason::NotFound,
                    RegistryError::Validation { .. } => RejectReason::Invalid,
                };
                Some(self.reject(from, id.to_string(), reason, Some(e.to_string())))
            }
        }
    }

    /// Parse `raw` and check the edit policy
    fn parse_editable(&mut self, from: PeerId, raw: &str) -> Result<EffectId, HostEvent> {
        let id = EffectId::parse(raw).map_err(|e| {
            self.reject(from, raw.to_string(), RejectReason::InvalidId, Some(e.to_string()))
        })?;
        if !self.policy.may_edit(from, &id) {
            return Err(self.reject(from, raw.to_string(), RejectReason::PermissionDenied, None));
        }
        Ok(id)
    }

    /// Tell `peer` its change was refused and resend the authoritative set,
    /// undoing whatever it applied optimistically.
    fn reject(
        &mut self,
        peer: PeerId,
        id: String,
        reason: RejectReason,
        message: Option<String>,
    ) -> HostEvent {
        tracing::warn!(%peer, id = %id, ?reason, "Rejected change");
        self.send_to(
            peer,
            &SyncMessage::ChangeRejected(ChangeRejected {
                id: id.clone(),
                reason,
                message,
            }),
        );
        self.send_snapshots(peer);
        HostEvent::ChangeRejected { peer, id, reason }
    }

    fn apply_save(&mut self, definition: EffectDefinition) -> Result<SaveOutcome, RegistryError> {
        let outcome = self.registry.save(definition)?;
        self.authored_changed();
        Ok(outcome)
    }

    fn apply_delete(&mut self, id: &EffectId) -> Result<(), RegistryError> {
        self.registry.delete(id)?;
        self.authored_changed();
        Ok(())
    }

    fn apply_publish(&mut self, entry: CatalogEntry) {
        self.catalog.publish(entry);
        self.catalog_revision += 1;
        let msg = SyncMessage::CatalogSnapshot(catalog_snapshot(&self.catalog, self.catalog_revision));
        self.broadcast(&msg);
    }

    fn authored_changed(&mut self) {
        self.authored_revision += 1;
        self.persist();
        let msg = SyncMessage::AuthoredSnapshot(authored_snapshot(
            &self.registry,
            self.authored_revision,
        ));
        self.broadcast(&msg);
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(self.registry.authored()) {
            tracing::error!(path = %store.path().display(), "Failed to persist authored set: {}", e);
        }
    }

    fn send_snapshots(&mut self, peer: PeerId) {
        let authored = SyncMessage::AuthoredSnapshot(authored_snapshot(
            &self.registry,
            self.authored_revision,
        ));
        let catalog = SyncMessage::CatalogSnapshot(catalog_snapshot(&self.catalog, self.catalog_revision));
        self.send_to(peer, &authored);
        self.send_to(peer, &catalog);
    }

    fn send_to(&mut self, peer: PeerId, msg: &SyncMessage) {
        self.outbox.push((peer, msg.to_bytes()));
    }

    fn broadcast(&mut self, msg: &SyncMessage) {
        let bytes = msg.to_bytes();
        tracing::debug!(kind = msg.kind(), peers = self.peers.len(), len = bytes.len(), "Broadcast");
        for &peer in &self.peers {
            self.outbox.push((peer, bytes.clone()));
        }
    }
}

/// Edits made on the coordinator itself apply directly.
impl<P: EditPolicy> EditSink for SyncHost<P> {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn commit(
        &mut self,
        definition: &EffectDefinition,
        _kind: ChangeKind,
    ) -> Result<SaveOutcome, RegistryError> {
        self.apply_save(definition.clone())
    }

    fn retract(&mut self, id: &EffectId) -> Result<(), RegistryError> {
        self.apply_delete(id)
    }

    fn toggle_preview(&mut self, enable: bool, target: Option<&EffectId>) {
        tracing::debug!(enable, target = ?target.map(ToString::to_string), "Local preview toggled");
    }

    fn publish(&mut self, entry: CatalogEntry) {
        self.apply_publish(entry);
    }
}
