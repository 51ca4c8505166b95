//! Coordinator/viewer synchronization
//!
//! One coordinator holds the authoritative authored set. Viewers edit
//! optimistically and converge on the coordinator's full snapshots; the
//! latest snapshot always wins.
//!
//! # Protocol Flow
//!
//! ```text
//! Viewer                              Coordinator
//!   |                                     |
//!   |--- SyncRequest -------------------->|
//!   |<-- AuthoredSnapshot, CatalogSnapshot|
//!   |                                     |
//!   |--- DefinitionChange / DeleteRequest>|  (validate, save, persist)
//!   |<-- AuthoredSnapshot (all viewers) --|
//!   |<-- ChangeRejected + snapshots ------|  (on refusal, sender only)
//!   |                                     |
//!   |--- PublishRequest ----------------->|
//!   |<-- CatalogSnapshot (all viewers) ---|
//!   |                                     |
//!   |--- PreviewToggle ------------------>|  (informational)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut host = SyncHost::new(registry, catalog).with_store(store)?;
//! host.connect(PeerId(1));
//!
//! let mut viewer = SyncClient::new(viewer_registry, viewer_catalog);
//! viewer.connect();
//!
//! for frame in viewer.drain_outgoing() {
//!     host.handle_frame(PeerId(1), &frame);
//! }
//! for (_, frame) in host.drain_outgoing() {
//!     viewer.handle_frame(&frame);
//! }
//! ```

pub mod coordinator;
pub mod messages;
pub mod snapshot;
pub mod viewer;


pub use coordinator::{AllowAll, EditPolicy, HostEvent, PeerId, SyncHost};
pub use messages::{
    AuthoredSnapshot, CatalogRecord, CatalogSnapshot, ChangeKind, ChangeRejected,
    DEFAULT_MAX_FRAME_BYTES, DefinitionChange, DeleteRequest, FrameError, PreviewToggle,
    PublishRequest, RejectReason, SYNC_HEADER_SIZE, SYNC_MAGIC, SYNC_VERSION, SnapshotEntry,
    SyncMessage,
};
pub use viewer::{ClientEvent, SyncClient};
