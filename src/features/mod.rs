//! Feature record assembly and the canonical schema.
//!
//! Analyzers produce typed sub-records; [`FeatureSet::entries`] is the single
//! place that names features, so every key has exactly one owner and the key
//! order is fixed.

mod content;
mod descriptor;
mod history;
mod pipeline;
mod structure;

pub use content::{ContentAnalyzer, ContentFeatures, FileScan};
pub use descriptor::{DescriptorAnalyzer, DescriptorFeatures, InstallScriptFeatures, PackageDescriptor};
pub use history::{classify_version, version_velocity, HistoryFeatures, UpdateType, VersionHistoryAnalyzer};
pub use pipeline::FeatureExtractor;
pub use structure::StructureFeatures;

use crate::corpus::Label;
use crate::scan::{Capability, PatternCategory};

/// Provenance columns appended after the numeric features
pub const PROVENANCE_COLUMNS: [&str; 3] = ["package_type", "collection_date", "analysis_timestamp"];

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Every numeric feature of one sample, grouped by owning analyzer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub structure: StructureFeatures,
    pub descriptor: DescriptorFeatures,
    pub history: HistoryFeatures,
    pub content: ContentFeatures,
    pub install: InstallScriptFeatures,
}

impl FeatureSet {
    /// Combine the sub-records. Field ownership is disjoint, nothing can collide.
    pub fn merge(
        structure: StructureFeatures,
        descriptor: DescriptorFeatures,
        history: HistoryFeatures,
        content: ContentFeatures,
        install: InstallScriptFeatures,
    ) -> Self {
        Self {
            structure,
            descriptor,
            history,
            content,
            install,
        }
    }

    /// `(name, value)` pairs in canonical order
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let s = &self.structure;
        let d = &self.descriptor;
        let h = &self.history;
        let c = &self.content;
        let p = &c.patterns;
        let a = &c.capabilities;
        let i = &self.install;

        vec![
            ("file_count", s.file_count as f64),
            ("dir_count", s.dir_count as f64),
            ("total_size_kb", s.total_size_kb),
            ("has_node_modules", flag(s.has_node_modules)),
            ("js_file_ratio", s.js_file_ratio),
            ("json_file_ratio", s.json_file_ratio),
            ("js_files_in_root", s.js_files_in_root as f64),
            ("hidden_files", s.hidden_files as f64),
            ("max_file_size_kb", s.max_file_size_kb),
            ("binary_files", s.binary_files as f64),
            ("has_readme", flag(s.has_readme)),
            ("has_license", flag(s.has_license)),
            ("dependencies_count", d.dependencies_count as f64),
            ("dev_dependencies_count", d.dev_dependencies_count as f64),
            ("total_dependencies_count", d.total_dependencies_count as f64),
            ("dependency_ratio", d.dependency_ratio),
            ("suspicious_dependencies_count", d.suspicious_dependencies_count as f64),
            ("scripts_count", d.scripts_count as f64),
            ("has_preinstall", flag(d.has_preinstall)),
            ("has_postinstall", flag(d.has_postinstall)),
            ("has_preuninstall", flag(d.has_preuninstall)),
            ("has_install_script", flag(d.has_install_script)),
            ("is_first_version", flag(h.is_first_version)),
            ("has_other_versions_today", flag(h.has_other_versions_today)),
            ("is_rapid_update", flag(h.is_rapid_update)),
            ("version_velocity", h.version_velocity),
            ("maintenance_score", h.maintenance_score),
            ("time_between_updates", h.time_between_updates as f64),
            ("update_type", h.update_type as u8 as f64),
            ("fs_read_count", p.get(PatternCategory::FsRead) as f64),
            ("fs_write_count", p.get(PatternCategory::FsWrite) as f64),
            ("fs_delete_count", p.get(PatternCategory::FsDelete) as f64),
            ("http_request_count", p.get(PatternCategory::HttpRequest) as f64),
            ("fetch_count", p.get(PatternCategory::Fetch) as f64),
            ("socket_count", p.get(PatternCategory::Socket) as f64),
            ("exec_count", p.get(PatternCategory::Exec) as f64),
            ("spawn_count", p.get(PatternCategory::Spawn) as f64),
            ("fork_count", p.get(PatternCategory::Fork) as f64),
            ("password_access", p.get(PatternCategory::Password) as f64),
            ("cookie_access", p.get(PatternCategory::Cookie) as f64),
            ("env_variable_access", p.get(PatternCategory::EnvRead) as f64),
            ("base64_pattern_count", p.get(PatternCategory::Base64) as f64),
            ("eval_usage_count", p.get(PatternCategory::Eval) as f64),
            ("ast_file_access", a.get(Capability::FileAccess) as f64),
            ("ast_env_access", a.get(Capability::EnvAccess) as f64),
            ("ast_process_exec", a.get(Capability::ProcessExec) as f64),
            ("ast_network_access", a.get(Capability::NetworkAccess) as f64),
            ("ast_crypto_usage", a.get(Capability::Crypto) as f64),
            ("ast_dynamic_code", a.get(Capability::DynamicCode) as f64),
            ("ast_data_encoding", a.get(Capability::DataEncoding) as f64),
            ("ast_cookie_access", a.get(Capability::CookieAccess) as f64),
            ("ast_password_access", a.get(Capability::PasswordAccess) as f64),
            ("parse_error_files", c.parse_error_files as f64),
            ("max_entropy", c.entropy.max),
            ("avg_entropy", c.entropy.avg),
            ("entropy_variance", c.entropy.variance),
            ("minified_files", c.minified_files as f64),
            ("minified_ratio", c.minified_ratio),
            ("base64_density", c.base64_density),
            ("eval_density", c.eval_density),
            ("obfuscation_score", c.obfuscation_score),
            ("has_install_command", flag(i.has_install_command)),
            ("base64_in_install_script", i.base64 as f64),
            ("domain_in_install_script", i.domains as f64),
            ("network_in_install_script", i.network as f64),
            ("process_env_in_install_script", i.process_env as f64),
            ("file_ops_in_install_script", i.file_ops as f64),
            ("shell_exec_in_install_script", i.shell_exec as f64),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries().into_iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }
}

/// Canonical feature names, in column order
pub fn feature_names() -> Vec<&'static str> {
    FeatureSet::default().entries().into_iter().map(|(k, _)| k).collect()
}

/// Full table header: features then provenance
pub fn header() -> Vec<&'static str> {
    let mut h = feature_names();
    h.extend(PROVENANCE_COLUMNS);
    h
}

/// One assembled, immutable row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub features: FeatureSet,
    pub label: Label,
    pub collection_date: String,
    pub analysis_timestamp: String,
}

impl FeatureRecord {
    /// Cells in [`header`] order
    pub fn to_row(&self) -> Vec<String> {
        let mut row: Vec<String> = self.features.entries().into_iter().map(|(_, v)| v.to_string()).collect();
        row.push(self.label.to_string());
        row.push(self.collection_date.clone());
        row.push(self.analysis_timestamp.clone());
        row
    }

    /// `(column, cell)` pairs, features then provenance
    pub fn columns(&self) -> Vec<(&'static str, String)> {
        header().into_iter().zip(self.to_row()).collect()
    }
}
