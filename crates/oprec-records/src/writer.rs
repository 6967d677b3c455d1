//! Serialization of record sets back to the declaration format.
//!
//! Bodies are written verbatim, each followed by a single blank line. The
//! remove/add helpers validate every requested name before anything is
//! rendered, so a bad request never leaves a half-written file behind.

use std::path::Path;

use tracing::info;

use crate::error::{RecordError, RecordResult};
use crate::record::RecordSet;
use crate::traits::DeclarationStore;

/// Render the named records of `records`, in the order given.
pub fn render(names: &[String], records: &RecordSet) -> RecordResult<String> {
    let mut out = String::new();
    for name in names {
        for line in records.require(name)? {
            out.push_str(line);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Render every record in insertion order.
pub fn render_all(records: &RecordSet) -> String {
    let mut out = String::new();
    for (_, body) in records.iter() {
        for line in body {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Render every record sorted by name.
pub fn render_sorted(records: &RecordSet) -> String {
    // Names come from the set itself, so lookups cannot miss.
    render(&records.sorted_names(), records).unwrap_or_default()
}

/// Render a bare name list, one `- <name>` line per entry.
pub fn render_name_list(names: &[String]) -> String {
    names.iter().map(|name| format!("- {name}\n")).collect()
}

/// Write the named records to `path`.
pub fn write_records(
    store: &dyn DeclarationStore,
    path: &Path,
    names: &[String],
    records: &RecordSet,
) -> RecordResult<()> {
    let contents = render(names, records)?;
    store.write_string(path, &contents)?;
    info!(path = %path.display(), records = names.len(), "wrote records");
    Ok(())
}

/// Write a bare name list to `path`.
pub fn write_name_list(
    store: &dyn DeclarationStore,
    path: &Path,
    names: &[String],
) -> RecordResult<()> {
    store.write_string(path, &render_name_list(names))?;
    info!(path = %path.display(), names = names.len(), "wrote name list");
    Ok(())
}

/// Copy of `records` without the names in `remove`.
///
/// Every name must be present, otherwise [`RecordError::MissingName`].
pub fn remove_records(remove: &[String], records: &RecordSet) -> RecordResult<RecordSet> {
    let mut remaining = records.clone();
    for name in remove {
        remaining.remove(name)?;
    }
    Ok(remaining)
}

/// Copy of `target` with the `add` records taken from `source` appended.
///
/// Every name must be present in `source` ([`RecordError::MissingName`]) and
/// absent from `target` ([`RecordError::DuplicateName`]).
pub fn add_records(
    add: &[String],
    source: &RecordSet,
    target: &RecordSet,
) -> RecordResult<RecordSet> {
    let mut merged = target.clone();
    for name in add {
        let body = source.get(name).ok_or_else(|| RecordError::MissingName {
            name: name.clone(),
        })?;
        merged.insert(name.clone(), body.to_vec())?;
    }
    Ok(merged)
}

/// Remove `remove` from `records` and write what is left, in insertion
/// order, to `path`. Nothing is written if any name is missing.
pub fn remove_and_write(
    store: &dyn DeclarationStore,
    remove: &[String],
    records: &RecordSet,
    path: &Path,
) -> RecordResult<RecordSet> {
    let remaining = remove_records(remove, records)?;
    store.write_string(path, &render_all(&remaining))?;
    info!(
        path = %path.display(),
        removed = remove.len(),
        remaining = remaining.len(),
        "removed records"
    );
    Ok(remaining)
}

/// Add `add` from `source` into `target` and write the union, sorted by
/// name, to `path`. Nothing is written if any name is missing or duplicated.
pub fn add_and_write(
    store: &dyn DeclarationStore,
    add: &[String],
    source: &RecordSet,
    target: &RecordSet,
    path: &Path,
) -> RecordResult<RecordSet> {
    let merged = add_records(add, source, target)?;
    store.write_string(path, &render_sorted(&merged))?;
    info!(
        path = %path.display(),
        added = add.len(),
        total = merged.len(),
        "merged records"
    );
    Ok(merged)
}
