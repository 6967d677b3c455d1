//! Error types for the reconciliation crate.

use std::path::PathBuf;

use oprec_records::RecordError;

/// Errors that can occur while reconciling declarations.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A declaration file could not be read or parsed.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    /// A record operation failed.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A name classified as shared is missing from one side.
    #[error("shared record {name} missing from {side} declarations")]
    MissingRecord { name: String, side: &'static str },

    /// The configuration is invalid.
    #[error("invalid config: {0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for reconciliation results.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
