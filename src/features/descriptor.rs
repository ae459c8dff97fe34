//! package.json parsing, dependency/hook features, and install-script analysis.

use crate::config::AnalysisConfig;
use crate::corpus::SampleTree;
use crate::error::{ExtractError, Result};
use crate::scan::{LexicalScanner, PatternCategory, PatternSet};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed package descriptor. Wrong-typed fields read as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
    pub optional_dependencies: BTreeMap<String, String>,
    pub bundled_dependencies: Vec<String>,
    /// hook name -> command text
    pub scripts: BTreeMap<String, String>,
}

impl Default for PackageDescriptor {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            version: "0.0.0".to_string(),
            dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            peer_dependencies: BTreeMap::new(),
            optional_dependencies: BTreeMap::new(),
            bundled_dependencies: Vec::new(),
            scripts: BTreeMap::new(),
        }
    }
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

impl PackageDescriptor {
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(text).map_err(|e| ExtractError::descriptor(path, e.to_string()))?;
        let Value::Object(obj) = &doc else {
            return Err(ExtractError::descriptor(path, "descriptor is not a JSON object"));
        };

        let defaults = Self::default();
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.name);
        let version = obj
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.version);

        let mut bundled = string_list(obj.get("bundledDependencies"));
        bundled.extend(string_list(obj.get("bundleDependencies")));

        Ok(Self {
            name,
            version,
            dependencies: string_map(obj.get("dependencies")),
            dev_dependencies: string_map(obj.get("devDependencies")),
            peer_dependencies: string_map(obj.get("peerDependencies")),
            optional_dependencies: string_map(obj.get("optionalDependencies")),
            bundled_dependencies: bundled,
            scripts: string_map(obj.get("scripts")),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::descriptor(path, e.to_string()))?;
        Self::parse(path, &String::from_utf8_lossy(&bytes))
    }

    /// Find the sample's descriptor and load it
    pub fn locate(tree: &SampleTree) -> Result<Self> {
        let path = tree
            .descriptor_path()
            .ok_or_else(|| ExtractError::descriptor(&tree.root.join("package.json"), "no package.json in sample"))?;
        Self::load(&path)
    }

    pub fn total_dependencies(&self) -> usize {
        self.dependencies.len()
            + self.dev_dependencies.len()
            + self.peer_dependencies.len()
            + self.optional_dependencies.len()
            + self.bundled_dependencies.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorFeatures {
    pub dependencies_count: u64,
    pub dev_dependencies_count: u64,
    pub total_dependencies_count: u64,
    pub dependency_ratio: f64,
    pub suspicious_dependencies_count: u64,
    pub scripts_count: u64,
    pub has_preinstall: bool,
    pub has_postinstall: bool,
    pub has_preuninstall: bool,
    pub has_install_script: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallScriptFeatures {
    pub has_install_command: bool,
    pub base64: u64,
    pub domains: u64,
    pub network: u64,
    pub process_env: u64,
    pub file_ops: u64,
    pub shell_exec: u64,
}

pub struct DescriptorAnalyzer {
    suspicious_packages: Vec<String>,
    install_scanner: LexicalScanner,
    /// Hooks whose name contains this marker are install-related
    install_hook_marker: String,
}

impl DescriptorAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_patterns(config, PatternSet::install_script_defaults())
    }

    pub fn with_patterns(config: &AnalysisConfig, install_patterns: PatternSet) -> Self {
        Self {
            suspicious_packages: config.suspicious_packages.iter().map(|p| p.to_lowercase()).collect(),
            install_scanner: LexicalScanner::new(install_patterns),
            install_hook_marker: "install".to_string(),
        }
    }

    pub fn features(&self, desc: &PackageDescriptor) -> DescriptorFeatures {
        let deps = desc.dependencies.len();
        let total = desc.total_dependencies();
        let suspicious = desc
            .dependencies
            .keys()
            .filter(|name| {
                let name = name.to_lowercase();
                self.suspicious_packages.iter().any(|s| name.contains(s.as_str()))
            })
            .count();

        DescriptorFeatures {
            dependencies_count: deps as u64,
            dev_dependencies_count: desc.dev_dependencies.len() as u64,
            total_dependencies_count: total as u64,
            dependency_ratio: if total > 0 { deps as f64 / total as f64 } else { 0.0 },
            suspicious_dependencies_count: suspicious as u64,
            scripts_count: desc.scripts.len() as u64,
            has_preinstall: desc.scripts.contains_key("preinstall"),
            has_postinstall: desc.scripts.contains_key("postinstall"),
            has_preuninstall: desc.scripts.contains_key("preuninstall"),
            has_install_script: desc.scripts.contains_key("install"),
        }
    }

    /// Concatenated text of every install-related hook
    pub fn install_script_text(&self, desc: &PackageDescriptor) -> Option<String> {
        let hooks: Vec<&str> = desc
            .scripts
            .iter()
            .filter(|(name, _)| name.contains(self.install_hook_marker.as_str()))
            .map(|(_, cmd)| cmd.as_str())
            .collect();
        if hooks.is_empty() {
            None
        } else {
            Some(hooks.join("\n"))
        }
    }

    pub fn install_script_features(&self, desc: &PackageDescriptor) -> InstallScriptFeatures {
        let Some(text) = self.install_script_text(desc) else {
            return InstallScriptFeatures::default();
        };
        let c = self.install_scanner.scan(&text);
        InstallScriptFeatures {
            has_install_command: true,
            base64: c.get(PatternCategory::Base64),
            domains: c.get(PatternCategory::Url),
            network: c.get(PatternCategory::NetworkKeyword),
            process_env: c.get(PatternCategory::EnvRead),
            file_ops: c.get(PatternCategory::FileOps),
            shell_exec: c.get(PatternCategory::ShellExec),
        }
    }
}
