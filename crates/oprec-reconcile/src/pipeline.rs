//! The reconciliation run: read, classify, plan every output, then write.
//!
//! [`plan`] does all reads and all checks and renders every output file to a
//! string; [`apply`] only writes. Any failure therefore surfaces before the
//! first byte hits the store, and a dry run is just a plan that is never
//! applied.

use std::path::{Path, PathBuf};

use oprec_records::{
    add_records, extract_file, remove_records, render, render_all, render_name_list,
    render_sorted, DeclarationStore, RecordError, RecordKind, RecordSet,
};
use serde::Serialize;
use tracing::info;

use crate::config::{report_subdir, ReconcileConfig, REPORT_NAME_LISTS, REPORT_RECORD_FILES};
use crate::error::{ReconcileError, ReconcileResult};
use crate::reconcile::{
    promote_backward_linked, verify_consistency, Consistency, ConsistencyCounts, Promotion,
};

/// The four declaration files being reconciled.
#[derive(Clone, Debug)]
pub struct Declarations {
    pub dygraph_ops: RecordSet,
    pub static_ops: RecordSet,
    pub dygraph_backward: RecordSet,
    pub static_backward: RecordSet,
}

/// Forward and backward consistency plus the resulting promotion.
#[derive(Clone, Debug)]
pub struct Verification {
    pub forward: Consistency,
    pub backward: Consistency,
    pub promotion: Promotion,
}

/// Why a file is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePurpose {
    /// Split/compare results for review.
    Report,
    /// Names moved to the canonical files.
    ExclusionList,
    /// A dygraph/static declaration file with the promoted records removed.
    Source,
    /// A canonical declaration file with the promoted records merged in.
    Canonical,
}

/// One planned output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileWrite {
    pub path: PathBuf,
    pub purpose: WritePurpose,
    /// Number of records (or names) in the file.
    pub entries: usize,
    pub contents: String,
}

/// Everything a run will write, computed without touching the store.
#[derive(Clone, Debug)]
pub struct ReconcilePlan {
    pub verification: Verification,
    pub writes: Vec<FileWrite>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub purpose: WritePurpose,
    pub entries: usize,
}

/// Serializable digest of a plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub forward: ConsistencyCounts,
    pub backward: ConsistencyCounts,
    pub promoted_forward: usize,
    pub promoted_backward: usize,
    pub writes: Vec<WriteSummary>,
}

impl ReconcilePlan {
    pub fn summary(&self) -> ReconcileSummary {
        let v = &self.verification;
        ReconcileSummary {
            forward: v.forward.counts(),
            backward: v.backward.counts(),
            promoted_forward: v.promotion.forward.len(),
            promoted_backward: v.promotion.backward.len(),
            writes: self
                .writes
                .iter()
                .map(|w| WriteSummary {
                    path: w.path.clone(),
                    purpose: w.purpose,
                    entries: w.entries,
                })
                .collect(),
        }
    }
}

fn in_file<T>(path: &Path, result: Result<T, RecordError>) -> ReconcileResult<T> {
    result.map_err(|source| ReconcileError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn read(store: &dyn DeclarationStore, path: &Path, kind: RecordKind) -> ReconcileResult<RecordSet> {
    in_file(path, extract_file(store, path, kind))
}

/// Read the four dygraph/static declaration files.
pub fn load_declarations(
    store: &dyn DeclarationStore,
    config: &ReconcileConfig,
) -> ReconcileResult<Declarations> {
    Ok(Declarations {
        dygraph_ops: read(store, &config.dygraph_ops, RecordKind::Forward)?,
        static_ops: read(store, &config.static_ops, RecordKind::Forward)?,
        dygraph_backward: read(store, &config.dygraph_backward, RecordKind::Backward)?,
        static_backward: read(store, &config.static_backward, RecordKind::Backward)?,
    })
}

/// Classify both declaration pairs and decide what gets promoted.
pub fn verify(decls: &Declarations, config: &ReconcileConfig) -> ReconcileResult<Verification> {
    let forward = verify_consistency(&decls.dygraph_ops, &decls.static_ops)?;
    let backward = verify_consistency(&decls.dygraph_backward, &decls.static_backward)?;
    let promotion = promote_backward_linked(
        &forward.comparison.consistent,
        &backward.comparison.consistent,
        &backward.comparison.inconsistent,
        &config.grad_suffixes,
    );
    info!(
        forward = promotion.forward.len(),
        backward = promotion.backward.len(),
        "promoted consistent ops"
    );
    Ok(Verification {
        forward,
        backward,
        promotion,
    })
}

fn name_list(path: PathBuf, purpose: WritePurpose, names: &[String]) -> FileWrite {
    FileWrite {
        path,
        purpose,
        entries: names.len(),
        contents: render_name_list(names),
    }
}

fn report_writes(
    dir: &Path,
    consistency: &Consistency,
    dygraph: &RecordSet,
    static_: &RecordSet,
) -> ReconcileResult<Vec<FileWrite>> {
    let sub = report_subdir(dir, consistency.kind);
    let split = &consistency.split;
    let cmp = &consistency.comparison;

    let lists = [
        &split.shared,
        &split.unique_a,
        &split.unique_b,
        &cmp.consistent,
        &cmp.inconsistent,
    ];
    let mut writes: Vec<FileWrite> = REPORT_NAME_LISTS
        .iter()
        .zip(lists)
        .map(|(file, names)| name_list(sub.join(file), WritePurpose::Report, names))
        .collect();
    for (file, set) in REPORT_RECORD_FILES.iter().zip([dygraph, static_]) {
        writes.push(FileWrite {
            path: sub.join(file),
            purpose: WritePurpose::Report,
            entries: cmp.inconsistent.len(),
            contents: render(&cmp.inconsistent, set)?,
        });
    }
    Ok(writes)
}

fn without(path: &Path, remove: &[String], set: &RecordSet) -> ReconcileResult<FileWrite> {
    let remaining = in_file(path, remove_records(remove, set))?;
    Ok(FileWrite {
        path: path.to_path_buf(),
        purpose: WritePurpose::Source,
        entries: remaining.len(),
        contents: render_all(&remaining),
    })
}

fn merged(
    path: &Path,
    add: &[String],
    source: &RecordSet,
    target: &RecordSet,
) -> ReconcileResult<FileWrite> {
    let union = in_file(path, add_records(add, source, target))?;
    Ok(FileWrite {
        path: path.to_path_buf(),
        purpose: WritePurpose::Canonical,
        entries: union.len(),
        contents: render_sorted(&union),
    })
}

/// Read every input and compute every output of a run.
///
/// Outputs, in write order: optional reports, the two exclusion lists, the
/// four dygraph/static files without the promoted records, and the two
/// canonical files with the promoted records (taken from the dygraph side)
/// merged in and sorted by name.
pub fn plan(store: &dyn DeclarationStore, config: &ReconcileConfig) -> ReconcileResult<ReconcilePlan> {
    config.validate()?;
    let decls = load_declarations(store, config)?;
    let verification = verify(&decls, config)?;
    let promoted = &verification.promotion;

    let canonical_ops = read(store, &config.ops, RecordKind::Forward)?;
    let canonical_backward = read(store, &config.backward, RecordKind::Backward)?;

    let mut writes = Vec::new();
    if let Some(dir) = &config.report_dir {
        writes.extend(report_writes(
            dir,
            &verification.forward,
            &decls.dygraph_ops,
            &decls.static_ops,
        )?);
        writes.extend(report_writes(
            dir,
            &verification.backward,
            &decls.dygraph_backward,
            &decls.static_backward,
        )?);
    }

    writes.push(name_list(
        config.ops_exclude.clone(),
        WritePurpose::ExclusionList,
        &promoted.forward,
    ));
    writes.push(name_list(
        config.backward_exclude.clone(),
        WritePurpose::ExclusionList,
        &promoted.backward,
    ));

    writes.push(without(&config.dygraph_ops, &promoted.forward, &decls.dygraph_ops)?);
    writes.push(without(&config.static_ops, &promoted.forward, &decls.static_ops)?);
    writes.push(without(&config.dygraph_backward, &promoted.backward, &decls.dygraph_backward)?);
    writes.push(without(&config.static_backward, &promoted.backward, &decls.static_backward)?);

    writes.push(merged(&config.ops, &promoted.forward, &decls.dygraph_ops, &canonical_ops)?);
    writes.push(merged(
        &config.backward,
        &promoted.backward,
        &decls.dygraph_backward,
        &canonical_backward,
    )?);

    Ok(ReconcilePlan {
        verification,
        writes,
    })
}

/// Write every planned file, in order.
pub fn apply(store: &dyn DeclarationStore, plan: &ReconcilePlan) -> ReconcileResult<()> {
    for write in &plan.writes {
        in_file(&write.path, store.write_string(&write.path, &write.contents))?;
        info!(
            path = %write.path.display(),
            purpose = ?write.purpose,
            entries = write.entries,
            "wrote file"
        );
    }
    Ok(())
}

/// Plan and apply a full run.
pub fn run(store: &dyn DeclarationStore, config: &ReconcileConfig) -> ReconcileResult<ReconcilePlan> {
    let plan = plan(store, config)?;
    apply(store, &plan)?;
    Ok(plan)
}
