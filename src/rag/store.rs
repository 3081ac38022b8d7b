//! Durable index storage.
//!
//! The index is a single JSON artifact in a caller-chosen directory. Writes
//! go to a temp file in the same directory and are renamed over the live
//! file, so a concurrent reader sees either the old index or the new one,
//! never a mix. Builds take an advisory exclusive lock on a sidecar lock
//! file; two writers against the same location cannot interleave.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::errors::RagError;

use super::index::EmbeddingIndex;

const INDEX_FILE: &str = "index.json";
const LOCK_FILE: &str = "index.lock";

pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn exists(&self) -> bool {
        self.index_path().is_file()
    }

    /// Atomically replace the persisted index with `index`.
    pub fn save(&self, index: &EmbeddingIndex) -> Result<(), RagError> {
        index.validate()?;

        fs::create_dir_all(&self.dir).map_err(RagError::storage)?;

        let lock = self.acquire_write_lock()?;
        let result = self.write_replace(index);
        let _ = FileExt::unlock(&lock);
        result
    }

    /// Load and structurally validate the persisted index.
    pub fn load(&self) -> Result<EmbeddingIndex, RagError> {
        let path = self.index_path();
        if !path.is_file() {
            return Err(RagError::IndexNotFound(path));
        }

        let raw = fs::read(&path).map_err(RagError::storage)?;
        let index: EmbeddingIndex = serde_json::from_slice(&raw)
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))?;
        index.validate()?;
        Ok(index)
    }

    fn acquire_write_lock(&self) -> Result<File, RagError> {
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.dir.join(LOCK_FILE))
            .map_err(RagError::storage)?;
        lock.try_lock_exclusive().map_err(|_| {
            RagError::Storage(format!(
                "another build holds the index lock at {}",
                self.dir.display()
            ))
        })?;
        Ok(lock)
    }

    fn write_replace(&self, index: &EmbeddingIndex) -> Result<(), RagError> {
        let tmp_path = self.dir.join(format!("{}.tmp", INDEX_FILE));
        let payload = serde_json::to_vec(index).map_err(RagError::storage)?;

        let written = write_and_sync(&tmp_path, &payload)
            .and_then(|_| fs::rename(&tmp_path, self.index_path()).map_err(RagError::storage));
        if written.is_err() {
            // Don't leave a stale temp file next to the live index.
            let _ = fs::remove_file(&tmp_path);
        }
        written?;

        tracing::info!(
            "Persisted index with {} entries to {}",
            index.len(),
            self.index_path().display()
        );
        Ok(())
    }
}

fn write_and_sync(path: &Path, payload: &[u8]) -> Result<(), RagError> {
    let mut file = File::create(path).map_err(RagError::storage)?;
    file.write_all(payload).map_err(RagError::storage)?;
    file.sync_all().map_err(RagError::storage)?;
    Ok(())
}
