//! Directory-backed container store

use crate::save::{SaveEnvelope, SaveError, SaveFormat};
use std::fs;
use std::path::{Path, PathBuf};
use void_inventory::{ContainerSnapshot, ContainerStore, Result};

/// Store writing one file per key into a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    format: SaveFormat,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: SaveFormat::default(),
        }
    }

    /// Set the save format
    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    /// Save directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save format
    pub fn format(&self) -> SaveFormat {
        self.format
    }

    /// Get file path for a key
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, self.format.extension()))
    }

    /// Ensure save directory exists
    fn ensure_dir(&self) -> std::result::Result<(), SaveError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Keys with a save file in the directory, sorted
    pub fn keys(&self) -> std::result::Result<Vec<String>, SaveError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.format.extension()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl ContainerStore for FileStore {
    fn save(&mut self, key: &str, snapshot: &ContainerSnapshot) -> Result<()> {
        self.ensure_dir()?;
        let bytes = SaveEnvelope::new(key, snapshot.clone()).encode(self.format)?;
        let path = self.slot_path(key);
        fs::write(&path, bytes).map_err(SaveError::from)?;

        log::info!("Saved {} ({} items) to {:?}", key, snapshot.items.len(), path);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<ContainerSnapshot>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(SaveError::from)?;
        let envelope = SaveEnvelope::decode(&bytes, self.format, key).map_err(|e| {
            log::warn!("Failed to load {:?}: {}", path, e);
            e
        })?;

        log::info!("Loaded {} from {:?}", key, path);
        Ok(Some(envelope.snapshot))
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(SaveError::from)?;
        log::info!("Deleted {:?}", path);
        Ok(true)
    }
}
