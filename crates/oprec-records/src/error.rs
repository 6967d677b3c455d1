//! Error types for record extraction and serialization.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while extracting, editing, or writing records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The number of record headers does not match the number of sealed
    /// bodies. Happens when a record name is declared twice in one file.
    #[error("record count mismatch: {headers} headers vs {records} records (duplicate record: {duplicate})")]
    CountMismatch {
        headers: usize,
        records: usize,
        duplicate: String,
    },

    /// A record that was asked for is not present.
    #[error("record not found: {name}")]
    MissingName { name: String },

    /// A record that was asked to be added already exists.
    #[error("record already exists: {name}")]
    DuplicateName { name: String },

    /// A declaration file does not exist in the store.
    #[error("declaration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// I/O error reading or writing a declaration file.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An in-memory store lock was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Convenience alias for record operations.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
