//! In-memory container store

use crate::save::{SaveEnvelope, SaveFormat};
use std::collections::HashMap;
use void_inventory::{ContainerSnapshot, ContainerStore, Result};

/// Store that keeps encoded snapshots in a map.
///
/// Snapshots go through the same encoding as [`FileStore`](crate::FileStore),
/// so a round trip here exercises the real save format.
#[derive(Debug, Default)]
pub struct MemoryStore {
    format: SaveFormat,
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store using the binary format
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoding
    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    /// Encoding in use
    pub fn format(&self) -> SaveFormat {
        self.format
    }

    /// Stored keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw encoded bytes under `key`
    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

impl ContainerStore for MemoryStore {
    fn save(&mut self, key: &str, snapshot: &ContainerSnapshot) -> Result<()> {
        let bytes = SaveEnvelope::new(key, snapshot.clone()).encode(self.format)?;
        self.entries.insert(key.to_string(), bytes);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<ContainerSnapshot>> {
        match self.entries.get(key) {
            Some(bytes) => Ok(Some(SaveEnvelope::decode(bytes, self.format, key)?.snapshot)),
            None => Ok(None),
        }
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_inventory::prelude::*;

    #[test]
    fn test_save_load_delete() {
        let ids = IdGenerator::new();
        let mut pack = Container::new(ContainerId(2), ContainerConfig::grid(3, 3));
        pack.add_item(ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1)).unwrap();
        let snapshot = ContainerSnapshot::capture(&pack);

        let mut store = MemoryStore::new().with_format(SaveFormat::Json);
        assert!(store.load("container_2").unwrap().is_none());

        store.save("container_2", &snapshot).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("container_2").unwrap(), Some(snapshot));
        assert!(std::str::from_utf8(store.raw("container_2").unwrap()).unwrap().contains("\"gem\""));

        assert!(store.delete("container_2").unwrap());
        assert!(!store.delete("container_2").unwrap());
        assert!(store.is_empty());
    }
}
