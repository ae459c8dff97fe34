//! Per-file reading and classification, and the sorted walk of one sample tree.

use crate::error::{ExtractError, Result};
use crate::scan::entropy::shannon_entropy;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One file of a sample, decoded. Lives only while the file is being scanned.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Path relative to the sample root
    pub rel_path: PathBuf,
    /// Lossy UTF-8 decode of the file bytes
    pub content: String,
    pub size: u64,
    pub is_binary: bool,
    pub entropy: f64,
    /// Lowercase extension without the dot; empty when absent
    pub extension: String,
}

impl SourceFile {
    /// Read and classify `root/rel_path`. I/O failures are logged and yield an
    /// empty, non-binary file.
    pub fn read(root: &Path, rel_path: &Path, binary_probe_bytes: usize) -> Self {
        let extension = rel_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let bytes = match std::fs::read(root.join(rel_path)) {
            Ok(b) => b,
            Err(source) => {
                let e = ExtractError::FileRead {
                    path: rel_path.to_path_buf(),
                    source,
                };
                tracing::warn!(sample = %root.display(), kind = e.kind(), error = %e, "treating file as empty");
                return Self {
                    rel_path: rel_path.to_path_buf(),
                    extension,
                    ..Self::default()
                };
            }
        };

        let is_binary = looks_binary(&bytes, binary_probe_bytes);
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let entropy = shannon_entropy(&content);
        Self {
            rel_path: rel_path.to_path_buf(),
            size: bytes.len() as u64,
            content,
            is_binary,
            entropy,
            extension,
        }
    }
}

/// Any byte above the 7-bit range within the first `probe` bytes
pub fn looks_binary(bytes: &[u8], probe: usize) -> bool {
    bytes.iter().take(probe).any(|b| *b > 127)
}

/// Listing of one sample directory
#[derive(Debug, Clone, Default)]
pub struct SampleTree {
    pub root: PathBuf,
    /// Regular files, relative to `root`, in walk (name-sorted) order
    pub files: Vec<PathBuf>,
    /// Directories below the root
    pub dir_count: usize,
}

impl SampleTree {
    /// Walk the sample. A missing or unlistable root is a filesystem error;
    /// unreadable entries below it are logged and skipped.
    pub fn walk(root: &Path) -> Result<Self> {
        let meta = std::fs::metadata(root).map_err(|e| ExtractError::filesystem(root, e))?;
        if !meta.is_dir() {
            return Err(ExtractError::filesystem(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "sample is not a directory"),
            ));
        }

        let mut tree = SampleTree {
            root: root.to_path_buf(),
            ..Self::default()
        };
        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(sample = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            if entry.file_type().is_dir() {
                tree.dir_count += 1;
            } else if entry.file_type().is_file() {
                tree.files.push(rel.to_path_buf());
            }
        }
        Ok(tree)
    }

    /// `package.json` at the root, else the first one found in walk order
    pub fn descriptor_path(&self) -> Option<PathBuf> {
        let root_descriptor = Path::new("package.json");
        if self.files.iter().any(|f| f == root_descriptor) {
            return Some(self.root.join(root_descriptor));
        }
        self.files
            .iter()
            .find(|f| f.file_name().is_some_and(|n| n == "package.json"))
            .map(|f| self.root.join(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_and_classifies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.JS"), "console.log('hi')").unwrap();
        fs::write(dir.path().join("b.bin"), [0u8, 200, 255, 3]).unwrap();

        let a = SourceFile::read(dir.path(), Path::new("a.JS"), 1024);
        assert_eq!(a.extension, "js");
        assert!(!a.is_binary);
        assert_eq!(a.size, 17);
        assert!(a.entropy > 0.0);

        let b = SourceFile::read(dir.path(), Path::new("b.bin"), 1024);
        assert!(b.is_binary);
    }

    #[test]
    fn unreadable_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let f = SourceFile::read(dir.path(), Path::new("missing.js"), 1024);
        assert!(f.content.is_empty());
        assert!(!f.is_binary);
        assert_eq!(f.entropy, 0.0);
        assert_eq!(f.extension, "js");
    }

    #[test]
    fn binary_probe_is_bounded() {
        let mut bytes = vec![b'a'; 2048];
        bytes[1500] = 0xff;
        assert!(!looks_binary(&bytes, 1024));
        assert!(looks_binary(&bytes, 2048));
    }

    #[test]
    fn walk_lists_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib/inner")).unwrap();
        fs::write(dir.path().join("index.js"), "x").unwrap();
        fs::write(dir.path().join("lib/inner/package.json"), "{}").unwrap();

        let tree = SampleTree::walk(dir.path()).unwrap();
        assert_eq!(tree.dir_count, 2);
        assert_eq!(tree.files.len(), 2);
        assert_eq!(
            tree.descriptor_path(),
            Some(dir.path().join("lib/inner/package.json"))
        );

        fs::write(dir.path().join("package.json"), "{}").unwrap();
        let tree = SampleTree::walk(dir.path()).unwrap();
        assert_eq!(tree.descriptor_path(), Some(dir.path().join("package.json")));
    }

    #[test]
    fn walk_missing_root_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SampleTree::walk(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), "filesystem");
    }
}
