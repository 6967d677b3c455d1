//! Filesystem-backed declaration store.
//!
//! Relative paths resolve against the store root; absolute paths are used
//! as-is. Parent directories are created on write.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RecordError, RecordResult};
use crate::traits::DeclarationStore;

/// A [`DeclarationStore`] over a directory on disk.
#[derive(Clone, Debug)]
pub struct FsDeclarationStore {
    root: PathBuf,
}

impl FsDeclarationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the store root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RecordError {
    if source.kind() == std::io::ErrorKind::NotFound {
        RecordError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        RecordError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl DeclarationStore for FsDeclarationStore {
    fn read_to_string(&self, path: &Path) -> RecordResult<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).map_err(|e| io_error(&full, e))
    }

    fn write_string(&self, path: &Path, contents: &str) -> RecordResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&full, contents).map_err(|e| io_error(&full, e))?;
        debug!(path = %full.display(), bytes = contents.len(), "wrote declaration file");
        Ok(())
    }
}
