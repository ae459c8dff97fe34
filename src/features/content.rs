//! Per-file scanning (entropy, lexical, syntax) and its order-independent reduction.

use crate::config::AnalysisConfig;
use crate::corpus::SourceFile;
use crate::error::recover;
use crate::scan::{
    is_minified, obfuscation_score, CapabilityCounts, CapabilityTable, CategoryCounts, EntropyStats, LexicalScanner,
    PatternCategory, PatternSet, ScriptLanguage, SyntaxMatcher,
};
use std::path::{Path, PathBuf};

/// What one file contributes to its sample. Holds no file content.
#[derive(Debug, Clone, Default)]
pub struct FileScan {
    pub rel_path: PathBuf,
    pub size: u64,
    pub is_binary: bool,
    pub extension: String,
    pub entropy: f64,
    /// Decoded length in characters
    pub chars: usize,
    pub minified: bool,
    pub is_script: bool,
    pub patterns: CategoryCounts,
    pub capabilities: CapabilityCounts,
    pub parse_failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFeatures {
    pub patterns: CategoryCounts,
    pub capabilities: CapabilityCounts,
    pub parse_error_files: u64,
    pub entropy: EntropyStats,
    pub minified_files: u64,
    pub minified_ratio: f64,
    pub base64_density: f64,
    pub eval_density: f64,
    pub obfuscation_score: f64,
}

pub struct ContentAnalyzer {
    lexical: LexicalScanner,
    syntax: SyntaxMatcher,
    script_extensions: Vec<String>,
    entropy_min_chars: usize,
    minified_max_lines: usize,
    minified_min_chars: usize,
    binary_probe_bytes: usize,
    max_parse_bytes: usize,
}

impl ContentAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_tables(config, PatternSet::source_defaults(), CapabilityTable::default())
    }

    pub fn with_tables(config: &AnalysisConfig, patterns: PatternSet, capabilities: CapabilityTable) -> Self {
        Self {
            lexical: LexicalScanner::new(patterns),
            syntax: SyntaxMatcher::new(capabilities),
            script_extensions: config.script_extensions.iter().map(|e| e.to_lowercase()).collect(),
            entropy_min_chars: config.entropy_min_chars,
            minified_max_lines: config.minified_max_lines,
            minified_min_chars: config.minified_min_chars,
            binary_probe_bytes: config.binary_probe_bytes,
            max_parse_bytes: config.max_parse_bytes,
        }
    }

    fn is_script_extension(&self, ext: &str) -> bool {
        self.script_extensions.iter().any(|e| e == ext)
    }

    /// Read one file and compute its contribution. Never fails: read errors
    /// give an empty file, parse errors zero only the syntax part.
    pub fn scan_file(&self, root: &Path, rel_path: &Path) -> FileScan {
        let file = SourceFile::read(root, rel_path, self.binary_probe_bytes);
        let scan = self.scan_source(root, &file);
        tracing::debug!(
            file = %rel_path.display(),
            binary = scan.is_binary,
            script = scan.is_script,
            entropy = scan.entropy,
            "scanned file"
        );
        scan
    }

    pub fn scan_source(&self, root: &Path, file: &SourceFile) -> FileScan {
        let chars = file.content.chars().count();
        let is_script = self.is_script_extension(&file.extension) && !file.content.is_empty();
        let minified = is_minified(&file.content, self.minified_max_lines, self.minified_min_chars);

        let mut scan = FileScan {
            rel_path: file.rel_path.clone(),
            size: file.size,
            is_binary: file.is_binary,
            extension: file.extension.clone(),
            entropy: file.entropy,
            chars,
            minified,
            is_script,
            ..FileScan::default()
        };
        if !is_script {
            return scan;
        }

        scan.patterns = self.lexical.scan(&file.content);

        if file.content.len() > self.max_parse_bytes {
            tracing::debug!(file = %file.rel_path.display(), size = file.size, "script too large for syntax analysis");
            return scan;
        }
        let language = ScriptLanguage::from_extension(&file.extension);
        let path = root.join(&file.rel_path);
        match recover("syntax", &path, || None, || {
            self.syntax.analyze(&file.rel_path, &file.content, language).map(Some)
        }) {
            Some(capabilities) => scan.capabilities = capabilities,
            None => scan.parse_failed = true,
        }
        scan
    }

    /// Reduce per-file scans. Sums and multiset statistics only, so the
    /// result does not depend on scan order.
    pub fn aggregate(&self, scans: &[FileScan]) -> ContentFeatures {
        let mut out = ContentFeatures::default();
        let mut entropies = Vec::new();
        let mut script_files = 0u64;
        let mut minified_scripts = 0u64;

        for s in scans {
            if s.chars > self.entropy_min_chars {
                entropies.push(s.entropy);
            }
            if s.minified {
                out.minified_files += 1;
            }
            if s.is_script {
                script_files += 1;
                if s.minified {
                    minified_scripts += 1;
                }
                out.patterns.merge(&s.patterns);
                out.capabilities.merge(&s.capabilities);
                if s.parse_failed {
                    out.parse_error_files += 1;
                }
            }
        }

        out.entropy = EntropyStats::from_values(&entropies);
        if script_files > 0 {
            let n = script_files as f64;
            out.minified_ratio = minified_scripts as f64 / n;
            out.base64_density = out.patterns.get(PatternCategory::Base64) as f64 / n;
            out.eval_density = out.patterns.get(PatternCategory::Eval) as f64 / n;
        }
        out.obfuscation_score = obfuscation_score(out.minified_ratio, out.base64_density, out.eval_density);
        out
    }
}
