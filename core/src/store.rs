//! Authored definition persistence
//!
//! # File Format
//!
//! ```text
//! [AFXA][version:u32][checksum:u64][count:u32]
//! count * ([id_len:u32][id utf-8][body_len:u32][body])
//! ```
//!
//! The checksum is xxh3-64 over everything after it. Built-in definitions
//! are never written here.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use aurafx_shared::codec::MAX_WIRE_STRING_LEN;
use aurafx_shared::{EffectDefinition, EffectId, decode_definition, encode_definition};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

pub const STORE_MAGIC: [u8; 4] = *b"AFXA";
pub const STORE_VERSION: u32 = 1;

/// Magic (4) + version (4) + checksum (8)
const PREAMBLE_SIZE: usize = 16;

/// Largest accepted record body
const MAX_BODY_SIZE: u32 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store path {0} has no file name")]
    InvalidPath(PathBuf),
}

/// Definitions read from a store
#[derive(Debug, Clone, Default)]
pub struct StoreContents {
    pub definitions: Vec<EffectDefinition>,
    /// Records dropped as unreadable
    pub skipped: usize,
}

/// File-backed authored definition store
#[derive(Debug, Clone)]
pub struct AuthoredStore {
    path: PathBuf,
}

impl AuthoredStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store.
    ///
    /// A missing file is an empty store. A corrupt header or checksum also
    /// yields an empty store, with a warning. Unreadable records are skipped.
    pub fn load(&self) -> Result<StoreContents, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreContents::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match parse(&bytes) {
            Some(contents) => Ok(contents),
            None => {
                tracing::warn!(path = %self.path.display(), "Authored store is corrupt, starting empty");
                Ok(StoreContents::default())
            }
        }
    }

    /// Replace the store contents. Writes a temp file, then renames it over
    /// the store.
    pub fn save<'a>(
        &self,
        definitions: impl IntoIterator<Item = &'a EffectDefinition>,
    ) -> Result<(), StoreError> {
        let bytes = serialize(definitions);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let tmp_path = match self.path.file_name() {
            Some(name) => {
                let mut tmp_name = OsString::from(name);
                tmp_name.push(".tmp");
                self.path.with_file_name(tmp_name)
            }
            None => return Err(StoreError::InvalidPath(self.path.clone())),
        };

        fs::write(&tmp_path, &bytes).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))?;

        tracing::debug!(path = %self.path.display(), len = bytes.len(), "Wrote authored store");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn serialize<'a>(definitions: impl IntoIterator<Item = &'a EffectDefinition>) -> Vec<u8> {
    let mut records = Vec::new();
    let mut count = 0u32;
    for definition in definitions {
        let id = definition.id().to_string();
        let body = encode_definition(definition);
        // Writing into a Vec cannot fail
        let _ = records.write_u32::<LittleEndian>(id.len() as u32);
        records.extend_from_slice(id.as_bytes());
        let _ = records.write_u32::<LittleEndian>(body.len() as u32);
        records.extend_from_slice(&body);
        count += 1;
    }

    let mut payload = Vec::with_capacity(4 + records.len());
    let _ = payload.write_u32::<LittleEndian>(count);
    payload.extend_from_slice(&records);

    let mut out = Vec::with_capacity(PREAMBLE_SIZE + payload.len());
    out.extend_from_slice(&STORE_MAGIC);
    let _ = out.write_u32::<LittleEndian>(STORE_VERSION);
    let _ = out.write_u64::<LittleEndian>(xxh3_64(&payload));
    out.extend_from_slice(&payload);
    out
}

/// `None` when the header or checksum is bad
fn parse(bytes: &[u8]) -> Option<StoreContents> {
    if bytes.len() < PREAMBLE_SIZE + 4 || bytes[0..4] != STORE_MAGIC {
        return None;
    }

    let mut cursor = Cursor::new(&bytes[4..PREAMBLE_SIZE]);
    let version = cursor.read_u32::<LittleEndian>().ok()?;
    if version != STORE_VERSION {
        tracing::warn!(version, expected = STORE_VERSION, "Unsupported authored store version");
        return None;
    }
    let checksum = cursor.read_u64::<LittleEndian>().ok()?;

    let payload = &bytes[PREAMBLE_SIZE..];
    if xxh3_64(payload) != checksum {
        tracing::warn!("Authored store checksum mismatch");
        return None;
    }

    let mut cursor = Cursor::new(payload);
    let count = cursor.read_u32::<LittleEndian>().ok()?;
    let mut contents = StoreContents::default();

    for index in 0..count {
        let Some((raw_id, body)) = read_record(&mut cursor) else {
            tracing::warn!(record = index, count, "Authored store ends early");
            contents.skipped += (count - index) as usize;
            break;
        };

        let id = match String::from_utf8(raw_id).ok().map(|s| EffectId::parse(&s)) {
            Some(Ok(id)) => id,
            _ => {
                tracing::warn!(record = index, "Skipping record with invalid id");
                contents.skipped += 1;
                continue;
            }
        };

        match decode_definition(&body, id) {
            Ok(definition) => contents.definitions.push(definition),
            Err(_) => contents.skipped += 1,
        }
    }

    Some(contents)
}

fn read_record(cursor: &mut Cursor<&[u8]>) -> Option<(Vec<u8>, Vec<u8>)> {
    let id = read_block(cursor, MAX_WIRE_STRING_LEN)?;
    let body = read_block(cursor, MAX_BODY_SIZE)?;
    Some((id, body))
}

fn read_block(cursor: &mut Cursor<&[u8]>, max: u32) -> Option<Vec<u8>> {
    let len = cursor.read_u32::<LittleEndian>().ok()?;
    if len > max {
        return None;
    }
    let mut data = vec![0u8; len as usize];
    cursor.read_exact(&mut data).ok()?;
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurafx_shared::{BehaviorLayer, BehaviorParams, MovementKind, PlacementLayer};

    fn id(s: &str) -> EffectId {
        EffectId::parse(s).unwrap()
    }

    fn sample(name: &str) -> EffectDefinition {
        EffectDefinition::new(id(name)).with_layer(
            BehaviorLayer::new(BehaviorParams {
                movement: MovementKind::Burst,
                colors: vec![0xFF00_FF00],
                ..Default::default()
            }),
            PlacementLayer::default(),
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthoredStore::new(dir.path().join("authored.afxa"));
        let contents = store.load().unwrap();
        assert!(contents.definitions.is_empty());
        assert_eq!(contents.skipped, 0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthoredStore::new(dir.path().join("nested").join("authored.afxa"));
        let defs = vec![sample("one"), sample("two")];

        store.save(&defs).unwrap();
        let contents = store.load().unwrap();
        assert_eq!(contents.definitions, defs);
        assert_eq!(contents.skipped, 0);
        assert!(!dir.path().join("nested").join("authored.afxa.tmp").exists());
    }

    #[test]
    fn test_corrupt_checksum_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authored.afxa");
        let store = AuthoredStore::new(&path);
        store.save(&[sample("one")]).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(store.load().unwrap().definitions.is_empty());
    }

    #[test]
    fn test_bad_magic_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authored.afxa");
        fs::write(&path, b"NOPE0000000000000000000000").unwrap();
        assert!(AuthoredStore::new(&path).load().unwrap().definitions.is_empty());
    }

    #[test]
    fn test_bad_record_is_skipped() {
        // Hand-built payload: one good record, one with a truncated body
        let good = sample("good");
        let mut records = Vec::new();
        for (raw_id, body) in [
            ("aurafx:good".to_string(), encode_definition(&good)),
            ("aurafx:bad".to_string(), vec![1]),
        ] {
            records.write_u32::<LittleEndian>(raw_id.len() as u32).unwrap();
            records.extend_from_slice(raw_id.as_bytes());
            records.write_u32::<LittleEndian>(body.len() as u32).unwrap();
            records.extend_from_slice(&body);
        }
        let mut payload = Vec::new();
        payload.write_u32::<LittleEndian>(2).unwrap();
        payload.extend_from_slice(&records);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&STORE_MAGIC);
        bytes.write_u32::<LittleEndian>(STORE_VERSION).unwrap();
        bytes.write_u64::<LittleEndian>(xxh3_64(&payload)).unwrap();
        bytes.extend_from_slice(&payload);

        let contents = parse(&bytes).unwrap();
        assert_eq!(contents.definitions, vec![good]);
        assert_eq!(contents.skipped, 1);
    }

    #[test]
    fn test_empty_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthoredStore::new(dir.path().join("authored.afxa"));
        store.save(std::iter::empty()).unwrap();
        let contents = store.load().unwrap();
        assert!(contents.definitions.is_empty());
    }
}
