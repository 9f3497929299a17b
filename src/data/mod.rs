//! Compressed, versioned universe snapshots.
//!
//! Layout: the 4-byte magic `SNAV`, a little-endian `u16` format version,
//! then the zstd-compressed bincode encoding of a [`UniverseSnapshot`].

use std::fs;
use std::io::Cursor;
use std::path::Path;

use bincode::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::universe::{AgentRecord, ProbeRecord, SystemRecord};

/// Compression level used when encoding universe snapshots.
const SNAPSHOT_COMPRESSION_LEVEL: i32 = 19;

const SNAPSHOT_MAGIC: &[u8; 4] = b"SNAV";

/// Bumped whenever a persisted record changes shape.
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 2;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] Box<ErrorKind>),
    #[error("Snapshot compression error: {0}")]
    Compression(#[source] std::io::Error),
    #[error("Not a universe snapshot (missing SNAV header)")]
    NotASnapshot,
    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

/// Every persisted record, as loaded into or dumped from a store.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UniverseSnapshot {
    pub systems: Vec<SystemRecord>,
    pub agents: Vec<AgentRecord>,
    pub probes: Vec<ProbeRecord>,
    /// Last probe number handed out.
    #[serde(default)]
    pub next_probe_id: u64,
}

pub fn serialize_snapshot(snapshot: &UniverseSnapshot) -> Result<Vec<u8>, DataError> {
    let encoded = bincode::serialize(snapshot)?;
    let compressed = zstd::stream::encode_all(Cursor::new(encoded), SNAPSHOT_COMPRESSION_LEVEL)
        .map_err(DataError::Compression)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + compressed.len());
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&SNAPSHOT_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

pub fn deserialize_snapshot(bytes: &[u8]) -> Result<UniverseSnapshot, DataError> {
    if bytes.len() < HEADER_LEN || &bytes[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(DataError::NotASnapshot);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(DataError::UnsupportedVersion {
            found: version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }

    let decoded = zstd::stream::decode_all(Cursor::new(&bytes[HEADER_LEN..]))
        .map_err(DataError::Compression)?;
    Ok(bincode::deserialize(&decoded)?)
}

pub fn write_snapshot_to_file<P: AsRef<Path>>(
    snapshot: &UniverseSnapshot,
    path: P,
) -> Result<(), DataError> {
    fs::write(path, serialize_snapshot(snapshot)?)?;
    Ok(())
}

pub fn read_snapshot_from_file<P: AsRef<Path>>(path: P) -> Result<UniverseSnapshot, DataError> {
    deserialize_snapshot(&fs::read(path)?)
}
