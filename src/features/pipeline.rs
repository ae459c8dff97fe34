//! Per-sample pipeline: walk → per-file scans → sub-analyzers → one record.

use super::{
    ContentAnalyzer, ContentFeatures, DescriptorAnalyzer, FeatureRecord, FeatureSet, FileScan, HistoryFeatures,
    PackageDescriptor, StructureFeatures, VersionHistoryAnalyzer,
};
use crate::config::AnalysisConfig;
use crate::corpus::{PackageSample, SampleTree};
use crate::error::{recover, Result};
use chrono::Local;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

pub struct FeatureExtractor {
    content: ContentAnalyzer,
    descriptor: DescriptorAnalyzer,
    history: VersionHistoryAnalyzer,
}

impl FeatureExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            content: ContentAnalyzer::new(config),
            descriptor: DescriptorAnalyzer::new(config),
            history: VersionHistoryAnalyzer,
        }
    }

    /// Build from explicitly constructed analyzers (e.g. substituted pattern tables)
    pub fn from_parts(content: ContentAnalyzer, descriptor: DescriptorAnalyzer) -> Self {
        Self {
            content,
            descriptor,
            history: VersionHistoryAnalyzer,
        }
    }

    /// Extract one record. Only a vanished/unlistable sample directory is an
    /// error; every sub-analysis failure degrades to that analyzer's defaults.
    pub fn extract(&self, sample: &PackageSample) -> Result<FeatureRecord> {
        let start = Instant::now();
        let path = sample.path.as_path();
        let tree = SampleTree::walk(path)?;

        let scans: Vec<FileScan> = tree
            .files
            .par_iter()
            .map(|rel| self.content.scan_file(&tree.root, rel))
            .collect();
        debug!(sample = %path.display(), files = scans.len(), "scanned files");

        let structure = StructureFeatures::from_scans(&tree, &scans);
        let content: ContentFeatures = self.content.aggregate(&scans);

        let descriptor = recover("descriptor", path, PackageDescriptor::default, || {
            PackageDescriptor::locate(&tree)
        });
        let descriptor_features = self.descriptor.features(&descriptor);
        let install = self.descriptor.install_script_features(&descriptor);

        let history = recover("version_history", path, HistoryFeatures::default, || {
            self.history.analyze(path, &descriptor.version)
        });

        let now = Local::now();
        let record = FeatureRecord {
            features: FeatureSet::merge(structure, descriptor_features, history, content, install),
            label: sample.label,
            collection_date: sample
                .date_partition
                .clone()
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            analysis_timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        info!(
            sample = %path.display(),
            package = %descriptor.name,
            version = %descriptor.version,
            label = %sample.label,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "extracted features"
        );
        Ok(record)
    }
}
