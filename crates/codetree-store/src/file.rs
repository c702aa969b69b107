//! JSON document backend.
//!
//! On-disk format is a single pretty-printed document:
//! ```text
//! {
//!   "codes": [ { "code": "ACC", "name": "...", ... }, ... ]
//! }
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the data file, so a reader sees either the old or the new document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use codetree_types::CodeCollection;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::traits::CollectionStore;

/// File-backed collection store.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the document at `path`. Nothing is touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Create the data file with an empty collection if it does not exist.
    fn ensure_file(&self) -> StorageResult<()> {
        if self.path.try_exists()? {
            return Ok(());
        }
        debug!(path = %self.path.display(), "creating empty code-tree document");
        self.write(&CodeCollection::default())
    }
}

impl CollectionStore for JsonFileStore {
    fn read(&self) -> StorageResult<CodeCollection> {
        self.ensure_file()?;
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn write(&self, collection: &CodeCollection) -> StorageResult<()> {
        let dir = self.dir();
        fs::create_dir_all(dir)?;

        let encoded = serde_json::to_vec_pretty(collection)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Persist {
            path: self.path.clone(),
            reason: e.error.to_string(),
        })?;

        debug!(path = %self.path.display(), nodes = collection.len(), "wrote code-tree document");
        Ok(())
    }
}
