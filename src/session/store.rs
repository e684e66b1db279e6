//! Best Score Persistence
//!
//! One scalar per opaque key. The session reads it at startup and writes it
//! whenever the running score beats it; failures are logged, never raised
//! into the engine.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Best-score storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not a valid score map.
    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage for the best score of each key.
pub trait BestScoreStore {
    /// Stored best score for `key`, if any.
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError>;

    /// Overwrite the best score for `key`.
    fn save(&mut self, key: &str, score: u32) -> Result<(), StoreError>;
}

/// In-memory store, mostly for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    scores: BTreeMap<String, u32>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BestScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.scores.get(key).copied())
    }

    fn save(&mut self, key: &str, score: u32) -> Result<(), StoreError> {
        self.scores.insert(key.to_string(), score);
        Ok(())
    }
}

/// JSON file holding a `{ key: score }` map.
///
/// A missing file reads as an empty map.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, u32>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl BestScoreStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn save(&mut self, key: &str, score: u32) -> Result<(), StoreError> {
        let mut scores = self.read_all()?;
        scores.insert(key.to_string(), score);
        fs::write(&self.path, serde_json::to_string_pretty(&scores)?)?;
        Ok(())
    }
}
