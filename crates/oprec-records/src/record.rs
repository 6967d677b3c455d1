//! Core record types: [`RecordKind`] and the insertion-ordered [`RecordSet`].
//!
//! A record is a named, ordered list of raw lines taken verbatim from a
//! declaration file (header line included, terminators kept). A
//! [`RecordSet`] keeps the names in first-appearance order next to a
//! name-to-body map, so the order a file was read in is the order it is
//! written back in.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RecordError, RecordResult};

/// The raw lines of one record, line terminators included.
pub type RecordBody = Vec<String>;

static FORWARD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- op\s*:\s*(\S+)").expect("valid forward header pattern"));

static BACKWARD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^- backward_op\s*:\s*(\S+)").expect("valid backward header pattern")
});

/// Which declaration flavour a file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Forward operators, headed by `- op: <name>`.
    Forward,
    /// Backward operators, headed by `- backward_op: <name>`.
    Backward,
}

impl RecordKind {
    /// Select the kind from the `backward` flag used on the command line.
    pub fn from_backward_flag(backward: bool) -> Self {
        if backward {
            Self::Backward
        } else {
            Self::Forward
        }
    }

    /// If `line` is a record header of this kind, return the record name.
    ///
    /// The pattern is anchored at the start of the line only; anything after
    /// the first whitespace-free token is ignored.
    pub fn header_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        let pattern = match self {
            Self::Forward => &*FORWARD_HEADER,
            Self::Backward => &*BACKWARD_HEADER,
        };
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

/// An insertion-ordered map from record name to record body.
///
/// Invariant: every name in `order` is a key of `bodies` exactly once, and
/// `order.len() == bodies.len()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSet {
    kind: RecordKind,
    order: Vec<String>,
    bodies: HashMap<String, RecordBody>,
}

impl RecordSet {
    /// Create an empty set of the given kind.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            order: Vec::new(),
            bodies: HashMap::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Record names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Record names in byte-wise lexicographic order.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names = self.order.clone();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    /// Look up the body of a record.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.bodies.get(name).map(Vec::as_slice)
    }

    /// Look up the body of a record, failing with [`RecordError::MissingName`].
    pub fn require(&self, name: &str) -> RecordResult<&[String]> {
        self.get(name).ok_or_else(|| RecordError::MissingName {
            name: name.to_string(),
        })
    }

    /// Append a record at the end of the order.
    ///
    /// Fails with [`RecordError::DuplicateName`] if the name is already
    /// present; the set is left unchanged in that case.
    pub fn insert(&mut self, name: impl Into<String>, body: RecordBody) -> RecordResult<()> {
        let name = name.into();
        if self.bodies.contains_key(&name) {
            return Err(RecordError::DuplicateName { name });
        }
        self.order.push(name.clone());
        self.bodies.insert(name, body);
        Ok(())
    }

    /// Remove a record, returning its body.
    pub fn remove(&mut self, name: &str) -> RecordResult<RecordBody> {
        let body = self
            .bodies
            .remove(name)
            .ok_or_else(|| RecordError::MissingName {
                name: name.to_string(),
            })?;
        self.order.retain(|n| n != name);
        Ok(body)
    }

    /// Iterate over `(name, body)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.order.iter().map(move |name| {
            let body = self.bodies.get(name).map(Vec::as_slice).unwrap_or(&[]);
            (name.as_str(), body)
        })
    }
}
