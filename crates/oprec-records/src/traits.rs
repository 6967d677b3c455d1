//! The [`DeclarationStore`] trait: where declaration files are read from and
//! written to.
//!
//! The reconciliation pipeline only ever talks to a store, so the same code
//! runs against the real yaml tree ([`crate::FsDeclarationStore`]) and
//! against in-memory fixtures ([`crate::InMemoryDeclarationStore`]).

use std::path::Path;

use crate::error::RecordResult;

/// Storage backend for declaration files.
pub trait DeclarationStore: Send + Sync {
    /// Read a whole file as UTF-8 text.
    ///
    /// Fails with [`crate::RecordError::NotFound`] if the file does not exist.
    fn read_to_string(&self, path: &Path) -> RecordResult<String>;

    /// Create or overwrite a file with `contents`.
    fn write_string(&self, path: &Path, contents: &str) -> RecordResult<()>;
}
