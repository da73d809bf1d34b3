//! Persistent blob store of named string blobs, no schema.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid blob name '{0}'")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// get/set of named string blobs.
pub trait BlobStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, name: &str, blob: &str) -> Result<(), StoreError>;
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// One file per blob under a directory. Writes go through a temp file and a
/// rename so a crash never leaves a half-written blob.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        validate_name(name)?;
        match std::fs::read_to_string(self.path_for(name)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path_for(name)).map_err(|e| e.error)?;
        debug!("Persisted blob '{name}' ({} bytes)", blob.len());
        Ok(())
    }
}

/// In-process store, used by tests and when no directory is configured.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        validate_name(name)?;
        let blobs = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.get(name).cloned())
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        let mut blobs = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        blobs.insert(name.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        assert_eq!(store.get("variables").unwrap(), None);
        store.set("variables", "{\"a\":1}").unwrap();
        assert_eq!(store.get("variables").unwrap().as_deref(), Some("{\"a\":1}"));
        store.set("variables", "[]").unwrap();
        assert_eq!(store.get("variables").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileBlobStore::open(&nested).unwrap();
        store.set("settings", "{}").unwrap();
        assert!(nested.join("settings.json").exists());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let store = MemoryBlobStore::default();
        for name in ["", "../etc", "a/b", "x.json"] {
            assert!(matches!(
                store.set(name, "x"),
                Err(StoreError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryBlobStore::default();
        store.set("settings", "v1").unwrap();
        store.set("settings", "v2").unwrap();
        assert_eq!(store.get("settings").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.get("other").unwrap(), None);
    }
}
