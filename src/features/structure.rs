//! File-tree shape of a sample.

use super::content::FileScan;
use crate::corpus::SampleTree;
use std::path::Component;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureFeatures {
    pub file_count: u64,
    pub dir_count: u64,
    pub total_size_kb: f64,
    pub has_node_modules: bool,
    pub js_file_ratio: f64,
    pub json_file_ratio: f64,
    pub js_files_in_root: u64,
    pub hidden_files: u64,
    pub max_file_size_kb: f64,
    pub binary_files: u64,
    pub has_readme: bool,
    pub has_license: bool,
}

impl StructureFeatures {
    pub fn from_scans(tree: &SampleTree, scans: &[FileScan]) -> Self {
        let mut out = StructureFeatures {
            file_count: scans.len() as u64,
            dir_count: tree.dir_count as u64,
            ..Self::default()
        };

        let mut total_bytes = 0u64;
        let mut max_bytes = 0u64;
        let mut js = 0u64;
        let mut json = 0u64;

        for s in scans {
            total_bytes += s.size;
            max_bytes = max_bytes.max(s.size);
            if s.is_binary {
                out.binary_files += 1;
            }

            let in_root = s.rel_path.components().count() == 1;
            match s.extension.as_str() {
                "js" => {
                    js += 1;
                    if in_root {
                        out.js_files_in_root += 1;
                    }
                }
                "json" => json += 1,
                _ => {}
            }

            if s.rel_path.to_string_lossy().starts_with('.') {
                out.hidden_files += 1;
            }
            if s
                .rel_path
                .components()
                .any(|c| matches!(c, Component::Normal(n) if n == "node_modules"))
            {
                out.has_node_modules = true;
            }

            let lower = s.rel_path.to_string_lossy().to_lowercase();
            out.has_readme |= lower.contains("readme");
            out.has_license |= lower.contains("license");
        }

        let denom = scans.len().max(1) as f64;
        out.total_size_kb = total_bytes as f64 / 1024.0;
        out.max_file_size_kb = max_bytes as f64 / 1024.0;
        out.js_file_ratio = js as f64 / denom;
        out.json_file_ratio = json as f64 / denom;
        out
    }
}
