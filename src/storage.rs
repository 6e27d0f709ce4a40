//! Byte stores for persisted stub trees.
//!
//! The loader treats storage as a cache: anything read back is checked
//! against the current source before use, and any failure here only costs
//! a rebuild. The default file store lives in ~/.cache/stubtree/stubs/.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::PersistenceError;

/// Persistence collaborator keyed by file.
pub trait StubStorage: Send + Sync {
    /// Stored bytes for `key`, or `None` if nothing is stored.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError>;

    /// Drop whatever is stored for `key`. Missing entries are not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// One file per key inside a cache directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The per-user cache directory, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stubtree").map(|dirs| dirs.cache_dir().join("stubs"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are arbitrary paths; hash them into flat file names.
    fn entry_path(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes());
        self.dir.join(format!("{}.stub", hash.to_hex()))
    }

    /// Delete every stored entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, PersistenceError> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("stub") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl StubStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let path = self.entry_path(key);
        // Each writer fills its own temp file, then renames it into place, so
        // readers never see a partial entry.
        let mut tmp = tempfile::Builder::new()
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and for runs with the disk cache disabled
/// but in-session reuse wanted.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl StubStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Stores nothing. Every load misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStorage;

impl StubStorage for NullStorage {
    fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(None)
    }

    fn store(&self, _key: &str, _bytes: &[u8]) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), PersistenceError> {
        Ok(())
    }
}

impl<S: StubStorage + ?Sized> StubStorage for std::sync::Arc<S> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        (**self).store(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().join("stubs")).unwrap();

        assert_eq!(storage.load("/src/main.rs").unwrap(), None);

        storage.store("/src/main.rs", b"payload").unwrap();
        assert_eq!(
            storage.load("/src/main.rs").unwrap(),
            Some(b"payload".to_vec())
        );
        // Different key should not be cached
        assert_eq!(storage.load("/src/lib.rs").unwrap(), None);

        storage.store("/src/main.rs", b"newer").unwrap();
        assert_eq!(storage.load("/src/main.rs").unwrap(), Some(b"newer".to_vec()));
    }

    #[test]
    fn test_file_storage_remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path()).unwrap();

        storage.store("a", b"1").unwrap();
        storage.store("b", b"2").unwrap();
        storage.remove("a").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.load("a").unwrap(), None);

        assert_eq!(storage.clear().unwrap(), 1);
        assert_eq!(storage.load("b").unwrap(), None);
    }

    #[test]
    fn test_no_tmp_files_remain() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path()).unwrap();
        storage.store("key", b"bytes").unwrap();

        let tmp_files = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .count();
        assert_eq!(tmp_files, 0);
    }

    #[test]
    fn test_concurrent_writers_leave_a_whole_entry() {
        let temp = TempDir::new().unwrap();
        let storage = std::sync::Arc::new(FileStorage::new(temp.path()).unwrap());
        let payloads: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 64 * 1024]).collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|bytes| {
                let storage = std::sync::Arc::clone(&storage);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        storage.store("shared", &bytes).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = storage.load("shared").unwrap().unwrap();
        assert!(payloads.contains(&stored));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.store("k", b"v").unwrap();
        assert!(storage.contains("k"));
        assert_eq!(storage.load("k").unwrap(), Some(b"v".to_vec()));

        storage.remove("k").unwrap();
        assert_eq!(storage.len(), 0);
    }
}
