//! Syntax-tree capability matching for JavaScript and TypeScript.
//!
//! Each call site is classified against an ordered rule table and counted in
//! the first matching capability only. Member expressions get a separate PII
//! pass (cookie access, password-like property names). A file that does not
//! parse cleanly contributes nothing: the caller gets a [`ExtractError::Parse`].
//!
//! Parsers are not shareable, so each worker thread keeps its own in a
//! thread-local and reuses it for every file it handles.

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tree_sitter::{Node, Parser, TreeCursor};

/// Maximum depth to prevent runaway traversal on pathological trees
pub const MAX_AST_DEPTH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    FileAccess,
    EnvAccess,
    ProcessExec,
    NetworkAccess,
    Crypto,
    DynamicCode,
    DataEncoding,
    CookieAccess,
    PasswordAccess,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityCounts(BTreeMap<Capability, u64>);

impl CapabilityCounts {
    pub fn get(&self, capability: Capability) -> u64 {
        self.0.get(&capability).copied().unwrap_or(0)
    }

    fn bump(&mut self, capability: Capability) {
        *self.0.entry(capability).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &CapabilityCounts) {
        for (cap, n) in &other.0 {
            *self.0.entry(*cap).or_insert(0) += n;
        }
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

/// Call-target rule: every `requires` substring must occur, and at least one
/// of `any_of` when it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRule {
    pub capability: Capability,
    pub requires: Vec<String>,
    pub any_of: Vec<String>,
}

impl CallRule {
    pub fn new(capability: Capability, requires: &[&str], any_of: &[&str]) -> Self {
        Self {
            capability,
            requires: requires.iter().map(|s| s.to_string()).collect(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, target: &str) -> bool {
        self.requires.iter().all(|r| target.contains(r.as_str()))
            && (self.any_of.is_empty() || self.any_of.iter().any(|a| target.contains(a.as_str())))
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityTable {
    /// Evaluated in order; first match wins
    pub call_rules: Vec<CallRule>,
    /// Exact member-expression texts counted as cookie access
    pub cookie_members: Vec<String>,
    /// Lowercase substrings of a property name counted as password access
    pub password_markers: Vec<String>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        use Capability::*;
        Self {
            call_rules: vec![
                CallRule::new(FileAccess, &["fs."], &["read", "write", "unlink"]),
                CallRule::new(EnvAccess, &["process.env"], &[]),
                CallRule::new(ProcessExec, &[], &["exec", "spawn"]),
                CallRule::new(NetworkAccess, &[], &["http.", "https.", "fetch"]),
                CallRule::new(Crypto, &["crypto."], &[]),
                CallRule::new(DynamicCode, &[], &["eval", "Function", "setTimeout", "setInterval"]),
                CallRule::new(
                    DataEncoding,
                    &[],
                    &["encodeURIComponent", "decodeURIComponent", "btoa", "atob"],
                ),
            ],
            cookie_members: vec!["document.cookie".to_string()],
            password_markers: vec!["password".to_string(), "passwd".to_string()],
        }
    }
}

impl CapabilityTable {
    pub fn classify_call(&self, target: &str) -> Option<Capability> {
        self.call_rules
            .iter()
            .find(|r| r.matches(target))
            .map(|r| r.capability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptLanguage {
    JavaScript,
    TypeScript,
    Tsx,
}

impl ScriptLanguage {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            _ => Self::JavaScript,
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

thread_local! {
    static PARSERS: RefCell<HashMap<ScriptLanguage, Parser>> = RefCell::new(HashMap::new());
}

fn parse_with_local_parser(language: ScriptLanguage, text: &str) -> std::result::Result<tree_sitter::Tree, String> {
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        if !parsers.contains_key(&language) {
            let mut parser = Parser::new();
            parser
                .set_language(&language.grammar())
                .map_err(|e| format!("grammar rejected: {e}"))?;
            parsers.insert(language, parser);
        }
        let Some(parser) = parsers.get_mut(&language) else {
            return Err("parser unavailable".to_string());
        };

        // Hostile input has crashed tree-sitter before; contain it to this file
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| parser.parse(text, None)));
        match result {
            Ok(Some(tree)) => Ok(tree),
            Ok(None) => Err("parser returned no tree".to_string()),
            Err(_) => {
                parsers.remove(&language);
                Err("parser panicked".to_string())
            }
        }
    })
}

/// Stateless matcher; the capability table is shared read-only across workers.
#[derive(Debug, Clone, Default)]
pub struct SyntaxMatcher {
    table: CapabilityTable,
}

impl SyntaxMatcher {
    pub fn new(table: CapabilityTable) -> Self {
        Self { table }
    }

    /// Parse `text` and count capabilities. Fails with a parse error if the
    /// tree contains error nodes; counts from such a file are discarded.
    pub fn analyze(&self, path: &Path, text: &str, language: ScriptLanguage) -> Result<CapabilityCounts> {
        let tree = parse_with_local_parser(language, text).map_err(|reason| ExtractError::parse(path, reason))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(ExtractError::parse(path, "syntax error in script"));
        }

        let mut cursor = root.walk();
        let (counts, depth_limit_hit) = self.visit(&mut cursor, text.as_bytes());
        if depth_limit_hit {
            tracing::debug!(path = %path.display(), "syntax traversal hit depth limit");
        }
        Ok(counts)
    }

    /// Iterative pre-order walk returning a fresh count map. Subtrees below
    /// `MAX_AST_DEPTH` are skipped; their siblings are still visited.
    fn visit(&self, cursor: &mut TreeCursor, source: &[u8]) -> (CapabilityCounts, bool) {
        let mut counts = CapabilityCounts::default();
        let mut depth = 0usize;
        let mut depth_limit_hit = false;

        loop {
            let node = cursor.node();
            match node.kind() {
                "call_expression" => {
                    if let Some(cap) = self.classify_call_node(&node, source) {
                        counts.bump(cap);
                    }
                }
                "member_expression" => self.check_member(&node, source, &mut counts),
                _ => {}
            }

            if depth < MAX_AST_DEPTH {
                if cursor.goto_first_child() {
                    depth += 1;
                    continue;
                }
            } else if node.child_count() > 0 {
                depth_limit_hit = true;
            }
            if cursor.goto_next_sibling() {
                continue;
            }
            loop {
                if !cursor.goto_parent() {
                    return (counts, depth_limit_hit);
                }
                depth = depth.saturating_sub(1);
                if cursor.goto_next_sibling() {
                    break;
                }
            }
        }
    }

    fn classify_call_node(&self, node: &Node, source: &[u8]) -> Option<Capability> {
        let func = node.child_by_field_name("function")?;
        let target = func.utf8_text(source).ok()?;
        self.table.classify_call(target)
    }

    fn check_member(&self, node: &Node, source: &[u8], counts: &mut CapabilityCounts) {
        if let Ok(text) = node.utf8_text(source) {
            if self.table.cookie_members.iter().any(|m| m == text) {
                counts.bump(Capability::CookieAccess);
            }
        }
        if let Some(prop) = node.child_by_field_name("property") {
            if let Ok(name) = prop.utf8_text(source) {
                let name = name.to_lowercase();
                if self.table.password_markers.iter().any(|m| name.contains(m.as_str())) {
                    counts.bump(Capability::PasswordAccess);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_js(code: &str) -> Result<CapabilityCounts> {
        SyntaxMatcher::default().analyze(Path::new("t.js"), code, ScriptLanguage::JavaScript)
    }

    #[test]
    fn classifies_calls_by_priority() {
        let code = r#"
            const fs = require('fs');
            fs.readFileSync('/etc/hosts');
            fs.writeFile('out', data, cb);
            require('child_process').exec('id');
            spawn('sh');
            https.get('https://example.com');
            fetch(url);
            crypto.createHash('sha256');
            eval(code);
            setTimeout(run, 10);
            btoa(secret);
        "#;
        let c = analyze_js(code).unwrap();
        assert_eq!(c.get(Capability::FileAccess), 2);
        assert_eq!(c.get(Capability::ProcessExec), 2);
        assert_eq!(c.get(Capability::NetworkAccess), 2);
        assert_eq!(c.get(Capability::Crypto), 1);
        assert_eq!(c.get(Capability::DynamicCode), 2);
        assert_eq!(c.get(Capability::DataEncoding), 1);
    }

    #[test]
    fn first_rule_wins() {
        // Matches both file access and dynamic code; counted once as file access
        let table = CapabilityTable::default();
        assert_eq!(table.classify_call("fs.readFileSync"), Some(Capability::FileAccess));
        assert_eq!(table.classify_call("fs.stat"), None);
        assert_eq!(table.classify_call("child.exec"), Some(Capability::ProcessExec));

        let c = analyze_js("fs.writeFile(evalPath, x);").unwrap();
        assert_eq!(c.total(), 1);
        assert_eq!(c.get(Capability::FileAccess), 1);
    }

    #[test]
    fn pii_member_access() {
        let code = r#"
            const c = document.cookie;
            user.password = form.userPasswd;
            const s = document.title;
        "#;
        let c = analyze_js(code).unwrap();
        assert_eq!(c.get(Capability::CookieAccess), 1);
        assert_eq!(c.get(Capability::PasswordAccess), 2);
    }

    #[test]
    fn invalid_script_is_parse_error() {
        let err = analyze_js("function (( { eval(").unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn deep_nesting_does_not_hide_later_calls() {
        let levels = MAX_AST_DEPTH + 50;
        let code = format!("var a = {}1{}; eval(x);", "[".repeat(levels), "]".repeat(levels));
        let c = analyze_js(&code).unwrap();
        assert_eq!(c.get(Capability::DynamicCode), 1);

        let shallow = analyze_js("var a = [[1]]; eval(x);").unwrap();
        assert_eq!(shallow.get(Capability::DynamicCode), 1);
    }

    #[test]
    fn typescript_grammar() {
        let code = "const x: number = 1; function f(a: string): void { fetch(a); }";
        let c = SyntaxMatcher::default()
            .analyze(Path::new("t.ts"), code, ScriptLanguage::TypeScript)
            .unwrap();
        assert_eq!(c.get(Capability::NetworkAccess), 1);
    }

    #[test]
    fn empty_script_has_no_capabilities() {
        let c = analyze_js("").unwrap();
        assert_eq!(c.total(), 0);
    }

    #[test]
    fn substituted_table() {
        let table = CapabilityTable {
            call_rules: vec![CallRule::new(Capability::Crypto, &[], &["hash"])],
            cookie_members: vec![],
            password_markers: vec![],
        };
        let c = SyntaxMatcher::new(table)
            .analyze(Path::new("t.js"), "hash(x); eval(y); document.cookie;", ScriptLanguage::JavaScript)
            .unwrap();
        assert_eq!(c.get(Capability::Crypto), 1);
        assert_eq!(c.get(Capability::DynamicCode), 0);
        assert_eq!(c.get(Capability::CookieAccess), 0);
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(ScriptLanguage::from_extension("ts"), ScriptLanguage::TypeScript);
        assert_eq!(ScriptLanguage::from_extension("tsx"), ScriptLanguage::Tsx);
        assert_eq!(ScriptLanguage::from_extension("mjs"), ScriptLanguage::JavaScript);
    }
}
