//! Reconciliation of dygraph and static operator declarations.
//!
//! Records declared identically by both execution modes are removed from
//! the per-mode files and merged into the canonical ones. A forward op only
//! moves when every backward variant it has (`_grad`, `_double_grad`,
//! `_triple_grad` by default) is consistent too.
//!
//! # Key Types
//!
//! - [`Split`] / [`Comparison`] / [`Promotion`] -- results of the three set operations
//! - [`ReconcileConfig`] -- paths and suffixes for one run, loadable from TOML
//! - [`ReconcilePlan`] -- every output of a run, rendered before anything is written

pub mod config;
pub mod error;
pub mod pipeline;
pub mod reconcile;

pub use config::ReconcileConfig;
pub use error::{ReconcileError, ReconcileResult};
pub use pipeline::{
    apply, load_declarations, plan, run, verify, Declarations, FileWrite, ReconcilePlan,
    ReconcileSummary, Verification, WritePurpose, WriteSummary,
};
pub use reconcile::{
    backward_names, compare_shared, promote_backward_linked, split_shared_and_unique,
    verify_consistency, Comparison, Consistency, ConsistencyCounts, Promotion, Split,
    DEFAULT_GRAD_SUFFIXES,
};
