//! Build-or-reuse decisions for per-file stub trees.
//!
//! For each file the loader answers "is there a tree for exactly this
//! content?" from three places, cheapest first: the in-memory memo, the
//! persisted store, and finally a fresh build. Every answer is keyed by the
//! content fingerprint, so an edited file can never be served its old tree.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::{Config, FileFilter};
use crate::error::{BuildError, PersistenceError, Result, StubError};
use crate::fingerprint::Fingerprint;
use crate::parser;
use crate::storage::{FileStorage, NullStorage, StubStorage};
use crate::stub::{codec, StubEntry, StubTree};

/// Storage and memo key for a path.
///
/// The path is made absolute and `.`/`..` are removed lexically. Symlinks
/// are resolved in the directories that still exist, never in the file name
/// itself, so a file keeps its key after it is deleted.
pub fn key_for(path: &Path) -> String {
    let absolute = if path.is_relative() {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    };
    let absolute = normalize(&absolute);

    let mut trailing = Vec::new();
    let mut ancestor = absolute.as_path();
    let resolved = loop {
        let (Some(parent), Some(name)) = (ancestor.parent(), ancestor.file_name()) else {
            break None;
        };
        trailing.push(name);
        ancestor = parent;
        if let Ok(real) = fs::canonicalize(ancestor) {
            break Some(real);
        }
    };

    let key = match resolved {
        Some(mut real) => {
            real.extend(trailing.iter().rev());
            real
        }
        None => absolute.clone(),
    };
    key.to_string_lossy().to_string()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// A file's current content and its fingerprint.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    key: String,
    content: Vec<u8>,
    fingerprint: Fingerprint,
}

impl SourceFile {
    /// In-memory content for `path`.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        let content = content.into();
        Self {
            key: key_for(&path),
            fingerprint: Fingerprint::compute(&content),
            path,
            content,
        }
    }

    /// Read `path` from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|source| StubError::Source {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            key: key_for(path),
            fingerprint: Fingerprint::compute(&content),
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

/// What the persisted store holds for a file, relative to its current content.
#[derive(Debug)]
pub enum PersistedState {
    Fresh(StubTree),
    /// Built from other content or an older format.
    Stale,
    Missing,
    Unreadable(PersistenceError),
}

struct Memo {
    fingerprint: Fingerprint,
    tree: Arc<StubTree>,
}

/// Decides, per file, whether to reuse a persisted stub tree or build one.
///
/// The loader remembers the latest tree of every file it has served until
/// that file is passed to [`invalidate`](Self::invalidate).
pub struct StubTreeLoader {
    storage: Arc<dyn StubStorage>,
    filter: FileFilter,
    memo: RwLock<HashMap<String, Memo>>,
    file_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StubTreeLoader {
    pub fn new(storage: Arc<dyn StubStorage>) -> Self {
        Self {
            storage,
            filter: FileFilter::default(),
            memo: RwLock::new(HashMap::new()),
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Loader with the storage and filters described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage: Arc<dyn StubStorage> = match config.cache_dir() {
            Some(dir) => Arc::new(FileStorage::new(&dir)?),
            None => Arc::new(NullStorage),
        };
        Ok(Self::new(storage).with_filter(config.file_filter()?))
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Whether `path` is a file this loader would build a tree for.
    pub fn can_have_stub(&self, path: &Path) -> bool {
        if self.filter.is_path_excluded(path) {
            return false;
        }
        parser::for_path(path).is_some_and(|p| self.filter.allows_language(p.language()))
    }

    /// The persisted tree for `file`, if one exists for its current content.
    pub fn read_from_persisted(&self, file: &SourceFile) -> Option<Arc<StubTree>> {
        if let Some(tree) = self.memoized(file) {
            return Some(tree);
        }
        match self.persisted_state(file) {
            PersistedState::Fresh(tree) => {
                tracing::debug!(file = %file.path().display(), "persisted stub tree is fresh");
                Some(self.remember(file, tree))
            }
            PersistedState::Stale => {
                tracing::debug!(file = %file.path().display(), "persisted stub tree is stale");
                None
            }
            PersistedState::Missing => None,
            PersistedState::Unreadable(err) => {
                tracing::warn!(file = %file.path().display(), error = %err, "ignoring unreadable persisted stub tree");
                None
            }
        }
    }

    /// Inspect the store without touching the memo.
    pub fn persisted_state(&self, file: &SourceFile) -> PersistedState {
        let bytes = match self.storage.load(file.key()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return PersistedState::Missing,
            Err(err) => return PersistedState::Unreadable(err),
        };
        match codec::decode(&bytes) {
            Ok(decoded) if decoded.fingerprint == file.fingerprint() => {
                PersistedState::Fresh(decoded.tree)
            }
            Ok(_) | Err(PersistenceError::FormatVersion { .. }) => PersistedState::Stale,
            Err(err) => PersistedState::Unreadable(err),
        }
    }

    /// Return the tree for `file`'s current content, building it from
    /// `entries` and persisting it when no fresh tree exists.
    pub fn read_or_build(&self, file: &SourceFile, entries: &[StubEntry]) -> Result<Arc<StubTree>> {
        self.read_or_build_with(file, || Ok(StubTree::build(entries)?))
    }

    /// Read `path` and return its tree, parsing only on a miss.
    pub fn load(&self, path: &Path) -> Result<Arc<StubTree>> {
        if !self.can_have_stub(path) {
            return Err(StubError::Unsupported(path.to_path_buf()));
        }
        let file = SourceFile::read(path)?;
        self.load_file(&file)
    }

    /// Like [`load`](Self::load) for content already in memory.
    pub fn load_file(&self, file: &SourceFile) -> Result<Arc<StubTree>> {
        if let Some(tree) = self.memoized(file) {
            return Ok(tree);
        }
        self.read_or_build_with(file, || self.build_from_source(file))
    }

    /// File-change notification: forget everything held for `path`.
    pub fn invalidate(&self, path: &Path) -> std::result::Result<(), PersistenceError> {
        let key = key_for(path);
        let lock = self.file_lock(&key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        let removed = self.storage.remove(&key);
        tracing::debug!(file = %path.display(), key = %key, "invalidated stub tree");

        // Drop the lock entry unless another caller is already waiting on it.
        let mut locks = self.file_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }
        removed
    }

    /// The in-memory tree for `path`, whatever content it was built from.
    pub fn cached_tree(&self, path: &Path) -> Option<Arc<StubTree>> {
        let memo = self.memo.read().unwrap_or_else(PoisonError::into_inner);
        memo.get(&key_for(path)).map(|m| Arc::clone(&m.tree))
    }

    fn read_or_build_with<F>(&self, file: &SourceFile, build: F) -> Result<Arc<StubTree>>
    where
        F: FnOnce() -> Result<StubTree>,
    {
        let lock = self.file_lock(file.key());
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another writer may have finished while we waited.
        if let Some(tree) = self.read_from_persisted(file) {
            return Ok(tree);
        }

        let tree = build()?;
        tracing::debug!(
            file = %file.path().display(),
            nodes = tree.len(),
            fingerprint = %file.fingerprint(),
            "built stub tree"
        );
        self.persist(file, &tree);
        Ok(self.remember(file, tree))
    }

    fn build_from_source(&self, file: &SourceFile) -> Result<StubTree> {
        let producer = parser::for_path(file.path())
            .ok_or_else(|| StubError::Unsupported(file.path().to_path_buf()))?;
        let entries = producer
            .produce(file.path(), file.content())
            .map_err(|e| BuildError::Parse(format!("{}: {:#}", file.path().display(), e)))?;
        Ok(StubTree::build(&entries)?)
    }

    fn persist(&self, file: &SourceFile, tree: &StubTree) {
        let stored = codec::encode(tree, &file.fingerprint())
            .and_then(|bytes| self.storage.store(file.key(), &bytes));
        if let Err(err) = stored {
            tracing::warn!(file = %file.path().display(), error = %err, "failed to persist stub tree");
        }
    }

    fn memoized(&self, file: &SourceFile) -> Option<Arc<StubTree>> {
        let memo = self.memo.read().unwrap_or_else(PoisonError::into_inner);
        memo.get(file.key())
            .filter(|m| m.fingerprint == file.fingerprint())
            .map(|m| Arc::clone(&m.tree))
    }

    fn remember(&self, file: &SourceFile, tree: StubTree) -> Arc<StubTree> {
        let tree = Arc::new(tree);
        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                file.key().to_string(),
                Memo {
                    fingerprint: file.fingerprint(),
                    tree: Arc::clone(&tree),
                },
            );
        tree
    }

    fn file_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.file_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}
