//! Consistency classification between dygraph and static declarations.
//!
//! Names are partitioned into shared and per-side unique sets, shared
//! records are compared line-for-line, and forward operators are only
//! promoted to the canonical set when none of their backward variants
//! diverge.

use std::collections::HashSet;

use oprec_records::{RecordKind, RecordSet};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ReconcileError, ReconcileResult};

/// Default derivative suffixes appended to a forward name.
pub const DEFAULT_GRAD_SUFFIXES: [&str; 3] = ["_grad", "_double_grad", "_triple_grad"];

/// Names partitioned by membership in two declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Split {
    /// Names present in both, in the order of the first declaration.
    pub shared: Vec<String>,
    /// Names only in the first declaration, in its order.
    pub unique_a: Vec<String>,
    /// Names only in the second declaration, in its order.
    pub unique_b: Vec<String>,
}

/// Shared names partitioned by body equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub consistent: Vec<String>,
    pub inconsistent: Vec<String>,
}

/// Forward and backward names cleared for the canonical set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
}

/// Partition two name lists into shared and unique names.
///
/// # Examples
///
/// ```
/// use oprec_reconcile::split_shared_and_unique;
///
/// let a: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
/// let b: Vec<String> = ["b", "c", "d"].iter().map(|s| s.to_string()).collect();
/// let split = split_shared_and_unique(&a, &b);
/// assert_eq!(split.shared, vec!["b", "c"]);
/// assert_eq!(split.unique_a, vec!["a"]);
/// assert_eq!(split.unique_b, vec!["d"]);
/// ```
pub fn split_shared_and_unique(names_a: &[String], names_b: &[String]) -> Split {
    let in_a: HashSet<&str> = names_a.iter().map(String::as_str).collect();
    let in_b: HashSet<&str> = names_b.iter().map(String::as_str).collect();

    let (shared, unique_a): (Vec<String>, Vec<String>) = names_a
        .iter()
        .cloned()
        .partition(|name| in_b.contains(name.as_str()));
    let unique_b = names_b
        .iter()
        .filter(|name| !in_a.contains(name.as_str()))
        .cloned()
        .collect();

    Split {
        shared,
        unique_a,
        unique_b,
    }
}

/// Compare the bodies of every shared name.
///
/// Equality is exact: same lines, same order, same whitespace and
/// terminators. A shared name missing from either set is an error.
pub fn compare_shared(
    shared: &[String],
    dygraph: &RecordSet,
    static_: &RecordSet,
) -> ReconcileResult<Comparison> {
    let mut comparison = Comparison::default();
    for name in shared {
        let dy = dygraph.get(name).ok_or_else(|| ReconcileError::MissingRecord {
            name: name.clone(),
            side: "dygraph",
        })?;
        let st = static_.get(name).ok_or_else(|| ReconcileError::MissingRecord {
            name: name.clone(),
            side: "static",
        })?;
        if dy == st {
            comparison.consistent.push(name.clone());
        } else {
            debug!(record = %name, "bodies differ");
            comparison.inconsistent.push(name.clone());
        }
    }
    Ok(comparison)
}

/// Backward names derived from a forward name: trailing underscores are
/// stripped before each suffix is appended.
///
/// ```
/// use oprec_reconcile::backward_names;
///
/// let suffixes = vec!["_grad".to_string(), "_double_grad".to_string()];
/// assert_eq!(backward_names("add_", &suffixes), vec!["add_grad", "add_double_grad"]);
/// ```
pub fn backward_names(forward: &str, suffixes: &[String]) -> Vec<String> {
    let base = forward.trim_end_matches('_');
    suffixes.iter().map(|suffix| format!("{base}{suffix}")).collect()
}

/// Promote consistent forward ops whose backward variants are all
/// consistent or absent.
///
/// A single inconsistent variant vetoes the forward op together with every
/// variant already collected for it. Forward ops without any backward
/// variant are promoted. An in-place op and its base (`relu_` and `relu`)
/// derive the same variants, which are promoted once.
pub fn promote_backward_linked(
    consistent_fwd: &[String],
    consistent_bw: &[String],
    inconsistent_bw: &[String],
    suffixes: &[String],
) -> Promotion {
    let consistent_bw: HashSet<&str> = consistent_bw.iter().map(String::as_str).collect();
    let inconsistent_bw: HashSet<&str> = inconsistent_bw.iter().map(String::as_str).collect();

    let mut promotion = Promotion::default();
    let mut promoted_bw: HashSet<String> = HashSet::new();
    'forward: for op in consistent_fwd {
        let mut linked = Vec::new();
        for bw in backward_names(op, suffixes) {
            if inconsistent_bw.contains(bw.as_str()) {
                debug!(op = %op, backward = %bw, "backward variant inconsistent; not promoting");
                continue 'forward;
            }
            if consistent_bw.contains(bw.as_str()) {
                linked.push(bw);
            }
        }
        promotion.forward.push(op.clone());
        for bw in linked {
            if promoted_bw.insert(bw.clone()) {
                promotion.backward.push(bw);
            } else {
                debug!(op = %op, backward = %bw, "backward variant already promoted");
            }
        }
    }
    promotion
}

/// Split and comparison results for one declaration pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consistency {
    pub kind: RecordKind,
    pub dygraph_count: usize,
    pub static_count: usize,
    pub split: Split,
    pub comparison: Comparison,
}

/// Counts for one declaration pair, as reported to the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsistencyCounts {
    pub kind: String,
    pub dygraph: usize,
    #[serde(rename = "static")]
    pub static_: usize,
    pub shared: usize,
    pub dygraph_unique: usize,
    pub static_unique: usize,
    pub consistent: usize,
    pub inconsistent: usize,
}

impl Consistency {
    pub fn counts(&self) -> ConsistencyCounts {
        ConsistencyCounts {
            kind: self.kind.to_string(),
            dygraph: self.dygraph_count,
            static_: self.static_count,
            shared: self.split.shared.len(),
            dygraph_unique: self.split.unique_a.len(),
            static_unique: self.split.unique_b.len(),
            consistent: self.comparison.consistent.len(),
            inconsistent: self.comparison.inconsistent.len(),
        }
    }
}

/// Split and compare one dygraph/static declaration pair.
pub fn verify_consistency(dygraph: &RecordSet, static_: &RecordSet) -> ReconcileResult<Consistency> {
    let kind = dygraph.kind();
    let split = split_shared_and_unique(dygraph.names(), static_.names());
    let comparison = compare_shared(&split.shared, dygraph, static_)?;

    info!(
        %kind,
        dygraph = dygraph.len(),
        static_ = static_.len(),
        shared = split.shared.len(),
        consistent = comparison.consistent.len(),
        inconsistent = comparison.inconsistent.len(),
        "verified consistency"
    );

    Ok(Consistency {
        kind,
        dygraph_count: dygraph.len(),
        static_count: static_.len(),
        split,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oprec_records::extract_records;
    use proptest::prelude::*;

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|n| n.to_string()).collect()
    }

    fn suffixes() -> Vec<String> {
        DEFAULT_GRAD_SUFFIXES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_example() {
        let split = split_shared_and_unique(&names(&["a", "b", "c"]), &names(&["b", "c", "d"]));
        assert_eq!(split.shared, names(&["b", "c"]));
        assert_eq!(split.unique_a, names(&["a"]));
        assert_eq!(split.unique_b, names(&["d"]));
    }

    #[test]
    fn split_preserves_each_side_order() {
        let split = split_shared_and_unique(&names(&["z", "y", "x", "w"]), &names(&["v", "x", "z", "u"]));
        assert_eq!(split.shared, names(&["z", "x"]));
        assert_eq!(split.unique_a, names(&["y", "w"]));
        assert_eq!(split.unique_b, names(&["v", "u"]));
    }

    #[test]
    fn split_empty_sides() {
        let split = split_shared_and_unique(&[], &names(&["a"]));
        assert!(split.shared.is_empty());
        assert!(split.unique_a.is_empty());
        assert_eq!(split.unique_b, names(&["a"]));
    }

    #[test]
    fn compare_exact_equality() {
        let dy = extract_records("- op: a\nx: 1\n- op: b\nx: 1\n- op: c\nx: 1\n", RecordKind::Forward).unwrap();
        let st = extract_records("- op: a\nx: 1\n- op: b\nx: 2\n- op: c\nx: 1 \n", RecordKind::Forward).unwrap();
        let cmp = compare_shared(&names(&["a", "b", "c"]), &dy, &st).unwrap();
        assert_eq!(cmp.consistent, names(&["a"]));
        assert_eq!(cmp.inconsistent, names(&["b", "c"]));
    }

    #[test]
    fn compare_ignores_blank_and_comment_differences() {
        let dy = extract_records("- op: a\n\nx: 1\n", RecordKind::Forward).unwrap();
        let st = extract_records("# generated\n- op: a\n# note\nx: 1\n\n\n", RecordKind::Forward).unwrap();
        let cmp = compare_shared(&names(&["a"]), &dy, &st).unwrap();
        assert_eq!(cmp.consistent, names(&["a"]));
    }

    #[test]
    fn compare_missing_shared_record_fails() {
        let dy = extract_records("- op: a\n", RecordKind::Forward).unwrap();
        let st = extract_records("- op: b\n", RecordKind::Forward).unwrap();
        let err = compare_shared(&names(&["a"]), &dy, &st).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingRecord { side: "static", .. }));
    }

    #[test]
    fn backward_names_strip_trailing_underscores_only() {
        assert_eq!(
            backward_names("relu_", &suffixes()),
            names(&["relu_grad", "relu_double_grad", "relu_triple_grad"])
        );
        assert_eq!(backward_names("add__", &suffixes())[0], "add_grad");
        assert_eq!(backward_names("_x_", &suffixes())[0], "_x_grad");
    }

    #[test]
    fn promote_with_absent_variant() {
        let promotion = promote_backward_linked(
            &names(&["relu"]),
            &names(&["relu_grad"]),
            &[],
            &suffixes(),
        );
        assert_eq!(promotion.forward, names(&["relu"]));
        assert_eq!(promotion.backward, names(&["relu_grad"]));
    }

    #[test]
    fn inconsistent_variant_vetoes() {
        let promotion = promote_backward_linked(
            &names(&["relu"]),
            &[],
            &names(&["relu_grad"]),
            &suffixes(),
        );
        assert!(promotion.forward.is_empty());
        assert!(promotion.backward.is_empty());
    }

    #[test]
    fn late_veto_discards_collected_variants() {
        let promotion = promote_backward_linked(
            &names(&["tanh", "exp"]),
            &names(&["tanh_grad", "tanh_double_grad", "exp_grad"]),
            &names(&["tanh_triple_grad"]),
            &suffixes(),
        );
        assert_eq!(promotion.forward, names(&["exp"]));
        assert_eq!(promotion.backward, names(&["exp_grad"]));
    }

    #[test]
    fn promote_without_backward_ops() {
        let promotion = promote_backward_linked(&names(&["shape", "assign_"]), &[], &[], &suffixes());
        assert_eq!(promotion.forward, names(&["shape", "assign_"]));
        assert!(promotion.backward.is_empty());
    }

    #[test]
    fn inplace_forward_links_to_base_backward() {
        let promotion = promote_backward_linked(
            &names(&["relu_"]),
            &names(&["relu_grad"]),
            &[],
            &suffixes(),
        );
        assert_eq!(promotion.backward, names(&["relu_grad"]));
    }

    #[test]
    fn shared_variants_promoted_once() {
        let promotion = promote_backward_linked(
            &names(&["relu", "relu_"]),
            &names(&["relu_grad", "relu_double_grad"]),
            &[],
            &suffixes(),
        );
        assert_eq!(promotion.forward, names(&["relu", "relu_"]));
        assert_eq!(promotion.backward, names(&["relu_grad", "relu_double_grad"]));
    }

    #[test]
    fn verify_consistency_counts() {
        let dy = extract_records("- op: a\n- op: b\nx: 1\n- op: c\n", RecordKind::Forward).unwrap();
        let st = extract_records("- op: b\nx: 2\n- op: a\n- op: d\n", RecordKind::Forward).unwrap();
        let consistency = verify_consistency(&dy, &st).unwrap();
        let counts = consistency.counts();
        assert_eq!(counts.kind, "forward");
        assert_eq!(counts.dygraph, 3);
        assert_eq!(counts.static_, 3);
        assert_eq!(counts.shared, 2);
        assert_eq!(counts.dygraph_unique, 1);
        assert_eq!(counts.static_unique, 1);
        assert_eq!(consistency.comparison.consistent, names(&["a"]));
        assert_eq!(consistency.comparison.inconsistent, names(&["b"]));
    }

    fn name_list() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::btree_set("[a-f]{1,3}", 0..16)
            .prop_map(|s| s.into_iter().collect())
    }

    fn record_set(entries: &[(String, u8)]) -> RecordSet {
        let mut set = RecordSet::new(RecordKind::Forward);
        for (name, value) in entries {
            let body = vec![format!("- op: {name}\n"), format!("  x: {value}\n")];
            set.insert(name.clone(), body).unwrap();
        }
        set
    }

    fn bodies() -> impl Strategy<Value = Vec<(String, u8)>> {
        proptest::collection::btree_map("[a-f]{1,3}", 0u8..3, 0..16)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn comparison_partitions_shared(a in bodies(), b in bodies()) {
            let dygraph = record_set(&a);
            let static_ = record_set(&b);
            let split = split_shared_and_unique(dygraph.names(), static_.names());
            let comparison = compare_shared(&split.shared, &dygraph, &static_).unwrap();

            for name in &comparison.consistent {
                prop_assert!(!comparison.inconsistent.contains(name));
                prop_assert_eq!(dygraph.get(name), static_.get(name));
            }
            for name in &comparison.inconsistent {
                prop_assert_ne!(dygraph.get(name), static_.get(name));
            }
            let mut classified: Vec<&String> = comparison
                .consistent
                .iter()
                .chain(comparison.inconsistent.iter())
                .collect();
            classified.sort();
            let mut shared: Vec<&String> = split.shared.iter().collect();
            shared.sort();
            prop_assert_eq!(classified, shared);
        }

        #[test]
        fn split_is_a_partition(a in name_list(), b in name_list()) {
            let split = split_shared_and_unique(&a, &b);
            for name in a.iter().chain(b.iter()) {
                let hits = [&split.shared, &split.unique_a, &split.unique_b]
                    .iter()
                    .filter(|part| part.contains(name))
                    .count();
                prop_assert_eq!(hits, 1);
            }
            prop_assert_eq!(split.shared.len() + split.unique_a.len(), a.len());
            prop_assert_eq!(split.shared.len() + split.unique_b.len(), b.len());
        }

        #[test]
        fn promotion_is_monotonic(
            fwd in name_list(),
            bw_ok in name_list(),
            bw_bad in name_list(),
        ) {
            let consistent_bw: Vec<String> = bw_ok.iter().map(|n| format!("{n}_grad")).collect();
            let inconsistent_bw: Vec<String> = bw_bad
                .iter()
                .filter(|n| !bw_ok.contains(*n))
                .map(|n| format!("{n}_grad"))
                .collect();
            let promotion = promote_backward_linked(&fwd, &consistent_bw, &inconsistent_bw, &suffixes());

            for op in &promotion.forward {
                prop_assert!(fwd.contains(op));
                for bw in backward_names(op, &suffixes()) {
                    prop_assert!(!inconsistent_bw.contains(&bw));
                }
            }
            let mut seen = HashSet::new();
            for bw in &promotion.backward {
                prop_assert!(consistent_bw.contains(bw));
                prop_assert!(seen.insert(bw), "{} promoted twice", bw);
            }
        }
    }
}
