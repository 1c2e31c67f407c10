//! Save envelope and encoding

use serde::{Deserialize, Serialize};
use thiserror::Error;
use void_inventory::{ContainerSnapshot, InventoryError};

/// Envelope version written by this crate
pub const SAVE_VERSION: u32 = 1;

/// Save system errors
#[derive(Debug, Error)]
pub enum SaveError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// Version mismatch
    #[error("Version mismatch: save version {0}, current version {1}")]
    VersionMismatch(u32, u32),
    /// Corrupted save
    #[error("Corrupted save data: {0}")]
    Corrupted(String),
}

impl From<SaveError> for InventoryError {
    fn from(err: SaveError) -> Self {
        InventoryError::Persistence(err.to_string())
    }
}

/// Save file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveFormat {
    /// JSON (human readable)
    Json,
    /// Binary (compact)
    #[default]
    Binary,
}

impl SaveFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "sav",
        }
    }
}

/// Save data header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Envelope version
    pub version: u32,
    /// Store key the snapshot was written under
    pub key: String,
    /// Save timestamp (Unix timestamp)
    pub timestamp: u64,
    /// Number of items, checked on load
    pub item_count: u32,
}

impl SaveHeader {
    /// Create a header for a snapshot
    pub fn new(key: impl Into<String>, snapshot: &ContainerSnapshot) -> Self {
        Self {
            version: SAVE_VERSION,
            key: key.into(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            item_count: snapshot.items.len() as u32,
        }
    }
}

/// Header plus snapshot, as written to a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    /// Save header
    pub header: SaveHeader,
    /// Container contents
    pub snapshot: ContainerSnapshot,
}

impl SaveEnvelope {
    /// Wrap a snapshot
    pub fn new(key: impl Into<String>, snapshot: ContainerSnapshot) -> Self {
        Self {
            header: SaveHeader::new(key, &snapshot),
            snapshot,
        }
    }

    /// Encode to bytes
    pub fn encode(&self, format: SaveFormat) -> Result<Vec<u8>, SaveError> {
        match format {
            SaveFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| SaveError::Serialization(e.to_string())),
            SaveFormat::Binary => bincode::serialize(self)
                .map_err(|e| SaveError::Serialization(e.to_string())),
        }
    }

    /// Decode and validate an envelope written under `key`
    pub fn decode(bytes: &[u8], format: SaveFormat, key: &str) -> Result<Self, SaveError> {
        let envelope: SaveEnvelope = match format {
            SaveFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| SaveError::Deserialization(e.to_string()))?,
            SaveFormat::Binary => bincode::deserialize(bytes)
                .map_err(|e| SaveError::Deserialization(e.to_string()))?,
        };

        // Check version
        if envelope.header.version > SAVE_VERSION {
            return Err(SaveError::VersionMismatch(envelope.header.version, SAVE_VERSION));
        }
        if envelope.header.key != key {
            return Err(SaveError::Corrupted(format!(
                "expected key {}, found {}",
                key, envelope.header.key
            )));
        }
        if envelope.header.item_count as usize != envelope.snapshot.items.len() {
            return Err(SaveError::Corrupted(format!(
                "header lists {} items, snapshot holds {}",
                envelope.header.item_count,
                envelope.snapshot.items.len()
            )));
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_inventory::prelude::*;

    fn snapshot() -> ContainerSnapshot {
        let ids = IdGenerator::new();
        let mut pack = Container::new(ContainerId(1), ContainerConfig::grid(4, 2));
        pack.add_item(ItemTemplate::new("rifle", "Rifle").with_size(3, 1).instantiate(ids.next(), 1))
            .unwrap();
        pack.add_item(
            ItemTemplate::new("arrow", "Arrow")
                .with_max_stack(20)
                .instantiate(ids.next(), 12),
        )
        .unwrap();
        ContainerSnapshot::capture(&pack)
    }

    #[test]
    fn test_envelope_round_trip() {
        for format in [SaveFormat::Json, SaveFormat::Binary] {
            let envelope = SaveEnvelope::new("container_1", snapshot());
            let bytes = envelope.encode(format).unwrap();
            let decoded = SaveEnvelope::decode(&bytes, format, "container_1").unwrap();
            assert_eq!(decoded, envelope);
        }
    }

    #[test]
    fn test_newer_version_is_refused() {
        let mut envelope = SaveEnvelope::new("container_1", snapshot());
        envelope.header.version = SAVE_VERSION + 1;
        let bytes = envelope.encode(SaveFormat::Json).unwrap();

        assert!(matches!(
            SaveEnvelope::decode(&bytes, SaveFormat::Json, "container_1"),
            Err(SaveError::VersionMismatch(2, 1))
        ));
    }

    #[test]
    fn test_mismatched_header_is_corrupted() {
        let mut envelope = SaveEnvelope::new("container_1", snapshot());
        envelope.header.item_count = 7;
        let bytes = envelope.encode(SaveFormat::Binary).unwrap();
        assert!(matches!(
            SaveEnvelope::decode(&bytes, SaveFormat::Binary, "container_1"),
            Err(SaveError::Corrupted(_))
        ));

        let bytes = SaveEnvelope::new("container_1", snapshot())
            .encode(SaveFormat::Binary)
            .unwrap();
        assert!(matches!(
            SaveEnvelope::decode(&bytes, SaveFormat::Binary, "container_2"),
            Err(SaveError::Corrupted(_))
        ));
        assert!(matches!(
            SaveEnvelope::decode(&bytes[..bytes.len() / 2], SaveFormat::Binary, "container_1"),
            Err(SaveError::Deserialization(_))
        ));
    }

    #[test]
    fn test_error_converts_to_inventory_error() {
        let err: InventoryError = SaveError::Corrupted("bad".into()).into();
        assert!(matches!(err, InventoryError::Persistence(msg) if msg.contains("bad")));
    }
}
