//! Sync protocol messages
//!
//! Messages are serialized with bitcode inside a small versioned envelope.
//! Definition bodies travel as opaque bytes in the body format of
//! [`aurafx_shared::codec`], so one corrupt body never breaks the frame.
//!
//! # Wire Format
//!
//! ```text
//! [AFXS][version:u16][length:u32][bitcode payload...]
//! ```

use bitcode::{Decode, Encode};
use thiserror::Error;

/// Sync protocol magic bytes
pub const SYNC_MAGIC: [u8; 4] = *b"AFXS";

/// Current sync protocol version
pub const SYNC_VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + length (4)
pub const SYNC_HEADER_SIZE: usize = 10;

/// Default largest accepted payload
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// Core Message Enum
// ============================================================================

/// Top-level sync message
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum SyncMessage {
    // Coordinator -> Viewer
    /// Every authored definition; replaces the viewer's authored set
    AuthoredSnapshot(AuthoredSnapshot),
    /// Every published catalog entry; replaces the viewer's published set
    CatalogSnapshot(CatalogSnapshot),
    /// A change from this viewer was refused
    ChangeRejected(ChangeRejected),

    // Viewer -> Coordinator
    /// Create, update or delete one authored definition
    DefinitionChange(DefinitionChange),
    /// Delete one authored definition
    DeleteRequest(DeleteRequest),
    /// Publish a catalog entry
    PublishRequest(PublishRequest),
    /// Live preview switched on or off (informational)
    PreviewToggle(PreviewToggle),
    /// Ask for both snapshots
    SyncRequest,
}

// ============================================================================
// Coordinator -> Viewer Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct AuthoredSnapshot {
    /// Increases with every change to the authored set
    pub revision: u64,
    pub entries: Vec<SnapshotEntry>,
}

/// One authored definition inside a snapshot
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SnapshotEntry {
    /// Qualified id, `namespace:path`
    pub id: String,
    /// Encoded definition body
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct CatalogSnapshot {
    /// Increases with every change to the published set
    pub revision: u64,
    pub entries: Vec<CatalogRecord>,
}

/// Catalog entry as sent on the wire
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct CatalogRecord {
    pub catalog_ref: String,
    pub definition_ref: String,
    pub display_name: String,
    pub icon_ref: String,
    pub icon_tint: Option<u32>,
    /// Rarity name; unknown names read as no rarity
    pub rarity: Option<String>,
    pub price: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ChangeRejected {
    pub id: String,
    pub reason: RejectReason,
    /// Optional human-readable message
    pub message: Option<String>,
}

/// Why the coordinator refused a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum RejectReason {
    /// Target is a built-in definition
    Builtin,
    /// No authored definition with that id
    NotFound,
    /// The id is not a valid qualified identifier
    InvalidId,
    /// The definition body failed to decode
    DecodeFailed,
    /// The definition failed validation
    Invalid,
    /// The edit policy refused this peer
    PermissionDenied,
}

// ============================================================================
// Viewer -> Coordinator Messages
// ============================================================================

/// Kind of definition change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct DefinitionChange {
    pub kind: ChangeKind,
    pub id: String,
    /// Encoded definition body; absent on delete
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct PublishRequest {
    pub entry: CatalogRecord,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct PreviewToggle {
    pub enable: bool,
    pub target: Option<String>,
}

// ============================================================================
// Serialization
// ============================================================================

impl SyncMessage {
    /// Serialize message to bytes with sync framing
    ///
    /// Returns wire format: [AFXS][version:u16][length:u32][payload...]
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = bitcode::encode(self);
        let mut bytes = Vec::with_capacity(SYNC_HEADER_SIZE + payload.len());

        bytes.extend_from_slice(&SYNC_MAGIC);
        bytes.extend_from_slice(&SYNC_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);

        bytes
    }

    /// Deserialize message from bytes with sync framing
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        Self::from_bytes_limited(bytes, DEFAULT_MAX_FRAME_BYTES)
    }

    /// Deserialize, refusing payloads longer than `max_payload`
    ///
    /// Validates magic, version, and length before decoding payload.
    pub fn from_bytes_limited(bytes: &[u8], max_payload: usize) -> Result<Self, FrameError> {
        if bytes.len() < SYNC_HEADER_SIZE {
            return Err(FrameError::TooShort);
        }

        if bytes[0..4] != SYNC_MAGIC {
            return Err(FrameError::InvalidMagic);
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SYNC_VERSION {
            return Err(FrameError::VersionMismatch {
                expected: SYNC_VERSION,
                got: version,
            });
        }

        let length = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        if length > max_payload {
            return Err(FrameError::TooLarge {
                max: max_payload,
                got: length,
            });
        }

        if bytes.len() < SYNC_HEADER_SIZE + length {
            return Err(FrameError::IncompletePayload {
                expected: length,
                got: bytes.len() - SYNC_HEADER_SIZE,
            });
        }

        let payload = &bytes[SYNC_HEADER_SIZE..SYNC_HEADER_SIZE + length];
        bitcode::decode(payload).map_err(|e| FrameError::DecodeFailed(e.to_string()))
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::AuthoredSnapshot(_) => "authored_snapshot",
            SyncMessage::CatalogSnapshot(_) => "catalog_snapshot",
            SyncMessage::ChangeRejected(_) => "change_rejected",
            SyncMessage::DefinitionChange(_) => "definition_change",
            SyncMessage::DeleteRequest(_) => "delete_request",
            SyncMessage::PublishRequest(_) => "publish_request",
            SyncMessage::PreviewToggle(_) => "preview_toggle",
            SyncMessage::SyncRequest => "sync_request",
        }
    }
}

/// Errors that can occur when unframing sync messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("message too short for sync header")]
    TooShort,
    #[error("invalid sync magic bytes")]
    InvalidMagic,
    #[error("sync version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u16, got: u16 },
    #[error("payload of {got} bytes exceeds limit of {max}")]
    TooLarge { max: usize, got: usize },
    #[error("incomplete payload: expected {expected} bytes, got {got}")]
    IncompletePayload { expected: usize, got: usize },
    #[error("failed to decode sync message: {0}")]
    DecodeFailed(String),
}

// ============================================================================
// Tests
// ============================================================================
