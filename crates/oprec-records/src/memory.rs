//! In-memory declaration store for tests and dry runs.
//!
//! [`InMemoryDeclarationStore`] keeps file contents in a `HashMap` behind a
//! `RwLock`. Paths are used as given, with no normalization.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{RecordError, RecordResult};
use crate::traits::DeclarationStore;

/// An in-memory implementation of [`DeclarationStore`].
#[derive(Debug, Default)]
pub struct InMemoryDeclarationStore {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl InMemoryDeclarationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for fixtures.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), contents.into());
        }
        self
    }

    /// Current contents of a file, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(path.as_ref()).cloned())
    }
}

impl DeclarationStore for InMemoryDeclarationStore {
    fn read_to_string(&self, path: &Path) -> RecordResult<String> {
        let files = self
            .files
            .read()
            .map_err(|e| RecordError::Poisoned(e.to_string()))?;
        files.get(path).cloned().ok_or_else(|| RecordError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn write_string(&self, path: &Path, contents: &str) -> RecordResult<()> {
        let mut files = self
            .files
            .write()
            .map_err(|e| RecordError::Poisoned(e.to_string()))?;
        files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
