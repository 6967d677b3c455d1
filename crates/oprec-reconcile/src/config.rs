use std::path::{Path, PathBuf};

use oprec_records::RecordKind;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};
use crate::reconcile::DEFAULT_GRAD_SUFFIXES;

/// Name lists written to each report subdirectory: shared, dygraph unique,
/// static unique, consistent, inconsistent.
pub(crate) const REPORT_NAME_LISTS: [&str; 5] = [
    "shared_ops.yaml",
    "dygraph_unique_ops.yaml",
    "static_unique_ops.yaml",
    "consistent_ops.yaml",
    "inconsistent_ops.yaml",
];

/// Inconsistent record bodies written to each report subdirectory: dygraph,
/// then static.
pub(crate) const REPORT_RECORD_FILES: [&str; 2] =
    ["inconsistent_dygraph_ops.yaml", "inconsistent_static_ops.yaml"];

pub(crate) fn report_subdir(dir: &Path, kind: RecordKind) -> PathBuf {
    dir.join(match kind {
        RecordKind::Forward => "verify_forward",
        RecordKind::Backward => "verify_backward",
    })
}

/// Locations and rules for one reconciliation run.
///
/// Relative paths are resolved by the [`oprec_records::DeclarationStore`]
/// the run is given, normally against the operator yaml root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Forward declarations used by the dygraph mode.
    pub dygraph_ops: PathBuf,
    /// Forward declarations used by the static mode.
    pub static_ops: PathBuf,
    /// Backward declarations used by the dygraph mode.
    pub dygraph_backward: PathBuf,
    /// Backward declarations used by the static mode.
    pub static_backward: PathBuf,
    /// Canonical forward declarations shared by both modes.
    pub ops: PathBuf,
    /// Canonical backward declarations shared by both modes.
    pub backward: PathBuf,
    /// Name list of forward ops moved to the canonical file.
    pub ops_exclude: PathBuf,
    /// Name list of backward ops moved to the canonical file.
    pub backward_exclude: PathBuf,
    /// When set, split/compare results are also written under this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
    /// Suffixes appended to a forward name to find its backward ops.
    pub grad_suffixes: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            dygraph_ops: PathBuf::from("inconsistent/dygraph_ops.yaml"),
            static_ops: PathBuf::from("inconsistent/static_ops.yaml"),
            dygraph_backward: PathBuf::from("inconsistent/dygraph_backward.yaml"),
            static_backward: PathBuf::from("inconsistent/static_backward.yaml"),
            ops: PathBuf::from("ops.yaml"),
            backward: PathBuf::from("backward.yaml"),
            ops_exclude: PathBuf::from("legacy/ops_exclude.yaml"),
            backward_exclude: PathBuf::from("legacy/backward_exclude.yaml"),
            report_dir: None,
            grad_suffixes: DEFAULT_GRAD_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ReconcileConfig {
    /// Parse a TOML config. Missing keys fall back to the defaults.
    pub fn from_toml_str(text: &str) -> ReconcileResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ReconcileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> ReconcileResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ReconcileError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Every file a run with `report_dir` set writes under it.
    pub fn report_paths(&self) -> Vec<PathBuf> {
        let Some(dir) = &self.report_dir else {
            return Vec::new();
        };
        [RecordKind::Forward, RecordKind::Backward]
            .into_iter()
            .flat_map(|kind| {
                let sub = report_subdir(dir, kind);
                REPORT_NAME_LISTS
                    .iter()
                    .chain(REPORT_RECORD_FILES.iter())
                    .map(move |file| sub.join(file))
            })
            .collect()
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> ReconcileResult<String> {
        toml::to_string_pretty(self).map_err(|e| ReconcileError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ReconcileResult<()> {
        if self.grad_suffixes.is_empty() {
            return Err(ReconcileError::Config("grad_suffixes must not be empty".into()));
        }
        if let Some(suffix) = self.grad_suffixes.iter().find(|s| s.is_empty()) {
            return Err(ReconcileError::Config(format!(
                "grad_suffixes contains an empty suffix: {suffix:?}"
            )));
        }

        // Every file is read once and written once; two roles on one path
        // would make the second write clobber the first.
        let paths = [
            &self.dygraph_ops,
            &self.static_ops,
            &self.dygraph_backward,
            &self.static_backward,
            &self.ops,
            &self.backward,
            &self.ops_exclude,
            &self.backward_exclude,
        ];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                if a == b {
                    return Err(ReconcileError::Config(format!(
                        "path used twice: {}",
                        a.display()
                    )));
                }
            }
        }
        if let Some(clash) = self.report_paths().into_iter().find(|r| paths.contains(&r)) {
            return Err(ReconcileError::Config(format!(
                "report file overwrites a declaration file: {}",
                clash.display()
            )));
        }
        Ok(())
    }
}
