//! Error taxonomy for feature extraction.
//!
//! Only [`ExtractError::MissingDatasetRoot`] and output failures are fatal to a
//! batch; every other variant is recovered where it happens and turned into
//! default features by [`recover`].

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A file could not be read (permission, I/O). The file is treated as empty.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Script content is not syntactically valid (or crashed the parser).
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Package descriptor missing or malformed.
    #[error("invalid package descriptor {path}: {reason}")]
    Descriptor { path: PathBuf, reason: String },

    /// The sample directory (or part of it) vanished or cannot be listed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declared dataset root does not exist. Fatal.
    #[error("dataset root not found: {0}")]
    MissingDatasetRoot(PathBuf),

    #[error("output error: {0}")]
    Output(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ExtractError {
    pub fn parse(path: &Path, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn descriptor(path: &Path, reason: impl Into<String>) -> Self {
        Self::Descriptor {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn filesystem(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short machine-friendly kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileRead { .. } => "file_read",
            Self::Parse { .. } => "parse",
            Self::Descriptor { .. } => "descriptor",
            Self::Filesystem { .. } => "filesystem",
            Self::MissingDatasetRoot(_) => "missing_dataset_root",
            Self::Output(_) => "output",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Run one fallible sub-analysis; on failure log the cause and substitute the
/// analyzer's declared default record.
pub fn recover<T, F>(analyzer: &str, sample: &Path, default: impl FnOnce() -> T, f: F) -> T
where
    F: FnOnce() -> Result<T>,
{
    match f() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                analyzer,
                sample = %sample.display(),
                kind = e.kind(),
                error = %e,
                "sub-analysis failed; using defaults"
            );
            default()
        }
    }
}
