//! Package samples and the dataset layout they are discovered from:
//! `<dataset root>/<date partition>/<package dir>/`.

mod file;

pub use file::{looks_binary, SampleTree, SourceFile};

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Declared class of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Benign,
    Malicious,
    Unknown,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Benign => "benign",
            Label::Malicious => "malicious",
            Label::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSample {
    pub path: PathBuf,
    pub label: Label,
    /// Name of the date partition directory the sample was collected under
    pub date_partition: Option<String>,
}

impl PackageSample {
    pub fn new(path: impl Into<PathBuf>, label: Label) -> Self {
        let path = path.into();
        let date_partition = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            path,
            label,
            date_partition,
        }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| ExtractError::filesystem(dir, e))? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

/// Sibling directories of `sample` in its parent, excluding the sample itself
pub fn sibling_dirs(sample: &Path) -> Result<Vec<PathBuf>> {
    let Some(parent) = sample.parent() else {
        return Ok(Vec::new());
    };
    let own = sample.file_name();
    Ok(sorted_subdirs(parent)?
        .into_iter()
        .filter(|d| d.file_name() != own)
        .collect())
}

/// Every `<date>/<package>` directory under a dataset root, in sorted order.
///
/// A missing root is fatal; an unreadable date partition is logged and skipped.
pub fn discover_samples(root: &Path, label: Label) -> Result<Vec<PackageSample>> {
    if !root.is_dir() {
        return Err(ExtractError::MissingDatasetRoot(root.to_path_buf()));
    }
    let mut samples = Vec::new();
    for date_dir in sorted_subdirs(root)? {
        match sorted_subdirs(&date_dir) {
            Ok(packages) => {
                tracing::debug!(date = %date_dir.display(), packages = packages.len(), "date partition");
                samples.extend(packages.into_iter().map(|p| PackageSample::new(p, label)));
            }
            Err(e) => tracing::warn!(date = %date_dir.display(), error = %e, "skipping date partition"),
        }
    }
    Ok(samples)
}
