//! Storage for rendered overlays, keyed by name.

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::overlay::OverlayError;

/// Key under which the most recent rendered overlay is stored.
pub const DRAWN_IMAGE_KEY: &str = "drawnImage";

/// A get/set store for encoded overlay images.
pub trait OverlayCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, OverlayError>;

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), OverlayError>;
}

/// Process-local cache, lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OverlayCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, OverlayError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), OverlayError> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Cache that keeps one file per key in a directory, so entries survive restarts.
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    root: PathBuf,
}

impl DirectoryCache {
    /// The directory is created on the first `set`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirectoryCache {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(file_name)
    }
}

impl OverlayCache for DirectoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, OverlayError> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OverlayError::Cache(format!("Failed to read '{key}': {e}"))),
        }
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), OverlayError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            OverlayError::Cache(format!(
                "Failed to create cache directory {}: {e}",
                self.root.display()
            ))
        })?;
        let path = self.entry_path(key);
        fs::write(&path, bytes)
            .map_err(|e| OverlayError::Cache(format!("Failed to write '{key}': {e}")))?;
        debug!("Cached {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache() {
        let mut cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(DRAWN_IMAGE_KEY).unwrap(), None);

        cache.set(DRAWN_IMAGE_KEY, b"first").unwrap();
        cache.set(DRAWN_IMAGE_KEY, b"second").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(DRAWN_IMAGE_KEY).unwrap().as_deref(),
            Some(&b"second"[..])
        );
    }

    #[test]
    fn test_directory_cache_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("overlays");

        let mut cache = DirectoryCache::new(&root);
        assert_eq!(cache.get(DRAWN_IMAGE_KEY).unwrap(), None);
        cache.set(DRAWN_IMAGE_KEY, &[1, 2, 3]).unwrap();

        let reopened = DirectoryCache::new(&root);
        assert_eq!(reopened.get(DRAWN_IMAGE_KEY).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_directory_cache_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DirectoryCache::new(dir.path());
        cache.set("../escape", b"x").unwrap();
        assert!(dir.path().join("___escape").exists());
        assert_eq!(cache.get("../escape").unwrap(), Some(b"x".to_vec()));
    }
}
