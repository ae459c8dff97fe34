//! Extractor configuration. Every field has a default so a partial JSON file is valid.

use crate::corpus::Label;
use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Dataset layout: root dir and the declared per-label roots under it
    pub dataset: DatasetConfig,
    /// Where the combined table (and optional per-package tables) go
    pub output: OutputConfig,
    /// Analyzer parameters and pattern lists
    pub analysis: AnalysisConfig,
    /// Worker threads for extraction; 0 lets rayon decide
    pub workers: usize,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub dir: PathBuf,
    pub roots: Vec<DatasetRootConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRootConfig {
    /// Sub-directory of `dataset.dir` holding `<date>/<package>/` trees
    pub name: String,
    pub label: Label,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Combined feature table
    pub path: PathBuf,
    /// When set, also write `<dir>/<label>/<date>/<package>/change-features.csv`
    pub per_package_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Dependency names considered network/process capable (substring match, lowercase)
    pub suspicious_packages: Vec<String>,
    /// File extensions (without dot) analyzed as scripts
    pub script_extensions: Vec<String>,
    /// Files whose decoded text is not longer than this are left out of entropy stats
    pub entropy_min_chars: usize,
    /// Minified heuristic: fewer lines than this...
    pub minified_max_lines: usize,
    /// ...and more characters than this
    pub minified_min_chars: usize,
    /// Leading bytes inspected by the binary classifier
    pub binary_probe_bytes: usize,
    /// Scripts larger than this skip syntax analysis
    pub max_parse_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            output: OutputConfig::default(),
            analysis: AnalysisConfig::default(),
            workers: 0,
            log: LogConfig::default(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("Dataset"),
            roots: vec![
                DatasetRootConfig {
                    name: "BenignDataset".to_string(),
                    label: Label::Benign,
                },
                DatasetRootConfig {
                    name: "MaliciousDataset".to_string(),
                    label: Label::Malicious,
                },
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Features").join("features.csv"),
            per_package_dir: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            suspicious_packages: [
                "request",
                "axios",
                "node-fetch",
                "fs-extra",
                "shelljs",
                "child_process",
                "exec",
                "spawn",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            script_extensions: ["js", "mjs", "cjs", "jsx", "ts", "tsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            entropy_min_chars: 100,
            minified_max_lines: 5,
            minified_min_chars: 500,
            binary_probe_bytes: 1024,
            max_parse_bytes: 4 * 1024 * 1024,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ExtractorConfig {
    /// Load from a JSON file. A missing file gives the defaults; an unreadable
    /// or invalid one is a `Config` error so the caller can report it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&data).map_err(|e| ExtractError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Every declared root under the dataset dir, with its label
    pub fn dataset_roots(&self) -> Vec<(PathBuf, Label)> {
        self.dataset
            .roots
            .iter()
            .map(|r| (self.dataset.dir.join(&r.name), r.label))
            .collect()
    }
}
