//! Record model for operator declaration files.
//!
//! A declaration file is a flat list of records, each opened by a header
//! line (`- op: <name>` for forward operators, `- backward_op: <name>` for
//! backward operators) and running until the next header. This crate reads
//! such files into insertion-ordered [`RecordSet`]s and writes them back
//! verbatim, without interpreting the YAML inside a record.
//!
//! # Modules
//!
//! - [`error`] -- Error types for record operations
//! - [`record`] -- [`RecordKind`] and the ordered [`RecordSet`]
//! - [`extract`] -- Line-oriented record extraction
//! - [`writer`] -- Rendering, remove/add-and-write helpers
//! - [`traits`] -- The [`DeclarationStore`] trait
//! - [`fs`] -- Filesystem store rooted at a directory
//! - [`memory`] -- In-memory store for tests and dry runs

pub mod error;
pub mod extract;
pub mod fs;
pub mod memory;
pub mod record;
pub mod traits;
pub mod writer;

pub use error::{RecordError, RecordResult};
pub use extract::{extract_file, extract_records};
pub use fs::FsDeclarationStore;
pub use memory::InMemoryDeclarationStore;
pub use record::{RecordBody, RecordKind, RecordSet};
pub use traits::DeclarationStore;
pub use writer::{
    add_and_write, add_records, remove_and_write, remove_records, render, render_all,
    render_name_list, render_sorted, write_name_list, write_records,
};
