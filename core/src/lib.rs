//! Aurafx Core - effect registry, resolution, editing and sync
//!
//! This crate holds everything a node needs on top of the shared effect
//! model: the in-memory registry, the resolver that turns a reference into
//! something renderable, the editing session, and the coordinator/viewer
//! sync state machines.
//!
//! # Architecture
//!
//! - [`Registry`] - built-in and authored definitions, authored wins
//! - [`Catalog`] / [`LegacyCatalog`] - published entries and simple patterns
//! - [`Resolver`] - reference to definition, pattern, primitive or default
//! - [`EditingSession`] - select, mutate, debounce, save, publish
//! - [`SyncHost`] / [`SyncClient`] - snapshot-based replication
//! - [`AuthoredStore`] - on-disk authored set

pub mod builtin;
pub mod catalog;
pub mod config;
mod partition;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod store;
pub mod sync;

pub use builtin::{BuiltinError, BuiltinPack, LegacyPattern};
pub use catalog::{Catalog, LegacyCatalog};
pub use config::{ConfigError, FxConfig};
pub use registry::{Registry, RegistryError, SaveOutcome};
pub use resolver::{EffectRef, NoPreview, Origin, PreviewSource, Resolution, Resolver};
pub use session::{
    BehaviorEdit, DEFAULT_PREVIEW_DEBOUNCE, EditSink, EditingSession, FieldEdit, Listing,
    MetadataEdit, PlacementEdit, SessionError, SessionState,
};
pub use store::{AuthoredStore, StoreContents, StoreError};
pub use sync::{ClientEvent, EditPolicy, FrameError, HostEvent, PeerId, SyncClient, SyncHost};
