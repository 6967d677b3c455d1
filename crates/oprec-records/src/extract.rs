//! Record extraction from line-oriented declaration files.
//!
//! Lines are scanned in order. A header line (see [`RecordKind::header_name`])
//! seals the body collected so far against the previous record name and
//! opens a new body. Every line that is non-blank and does not start with
//! `#` is appended verbatim to the open body, header included. Comment lines
//! are skipped but do not close a record. Content before the first header
//! has no name to attach to and is dropped. `\r\n` and lone `\r` line
//! endings are read as `\n`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{RecordError, RecordResult};
use crate::record::{RecordBody, RecordKind, RecordSet};
use crate::traits::DeclarationStore;

/// Extract all records of `kind` from `text`.
///
/// Fails with [`RecordError::CountMismatch`] when the number of headers does
/// not match the number of sealed bodies, which happens when one record name
/// is declared more than once.
///
/// # Examples
///
/// ```
/// use oprec_records::{extract_records, RecordKind};
///
/// let set = extract_records("- op: add\nx: 1\n- op: sub\ny: 2\n", RecordKind::Forward).unwrap();
/// assert_eq!(set.names(), &["add".to_string(), "sub".to_string()]);
/// assert_eq!(set.get("add").unwrap(), &["- op: add\n".to_string(), "x: 1\n".to_string()]);
/// ```
pub fn extract_records(text: &str, kind: RecordKind) -> RecordResult<RecordSet> {
    let mut names: Vec<String> = Vec::new();
    let mut bodies: HashMap<String, RecordBody> = HashMap::new();
    let mut duplicate: Option<String> = None;
    let mut current: RecordBody = Vec::new();

    let text = normalize_line_endings(text);
    for line in text.split_inclusive('\n') {
        if let Some(name) = kind.header_name(line) {
            let finished = std::mem::take(&mut current);
            match names.last() {
                Some(prev) => seal(&mut bodies, &mut duplicate, prev, finished),
                None if !finished.is_empty() => {
                    debug!(lines = finished.len(), "dropping preamble before first record");
                }
                None => {}
            }
            names.push(name.to_string());
        }
        if !line.trim().is_empty() && !line.starts_with('#') {
            current.push(line.to_string());
        }
    }

    if let Some(last) = names.last() {
        seal(&mut bodies, &mut duplicate, last, current);
    }

    if names.len() != bodies.len() {
        return Err(RecordError::CountMismatch {
            headers: names.len(),
            records: bodies.len(),
            duplicate: duplicate.unwrap_or_default(),
        });
    }

    let mut set = RecordSet::new(kind);
    for name in names {
        let body = bodies.remove(&name).unwrap_or_default();
        set.insert(name, body)?;
    }
    Ok(set)
}

fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn seal(
    bodies: &mut HashMap<String, RecordBody>,
    duplicate: &mut Option<String>,
    name: &str,
    body: RecordBody,
) {
    if bodies.insert(name.to_string(), body).is_some() && duplicate.is_none() {
        *duplicate = Some(name.to_string());
    }
}

/// Read `path` from `store` and extract its records.
pub fn extract_file(
    store: &dyn DeclarationStore,
    path: &Path,
    kind: RecordKind,
) -> RecordResult<RecordSet> {
    let text = store.read_to_string(path)?;
    let set = extract_records(&text, kind)?;
    info!(path = %path.display(), %kind, records = set.len(), "extracted records");
    Ok(set)
}
