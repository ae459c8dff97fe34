//! Content scanners: entropy, lexical pattern counting, syntax capability matching.

pub mod entropy;
pub mod lexical;
pub mod syntax;

pub use entropy::{shannon_entropy, EntropyStats};
pub use lexical::{
    is_minified, line_count, obfuscation_score, CategoryCount, CategoryCounts, LexicalScanner, PatternCategory, PatternSet,
};
pub use syntax::{CallRule, Capability, CapabilityCounts, CapabilityTable, ScriptLanguage, SyntaxMatcher};
