//! Batch extraction over the declared dataset roots into one table.

use crate::config::ExtractorConfig;
use crate::corpus::{discover_samples, PackageSample};
use crate::error::Result;
use crate::features::{FeatureExtractor, FeatureRecord};
use crate::output::{write_package_table, FeatureTableWriter};
use rayon::prelude::*;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub written: u64,
    pub skipped: usize,
    pub interrupted: bool,
}

/// Extract every sample under every declared root and write one row each.
///
/// All roots are checked before any work starts: a missing root is fatal.
/// A failed sample is logged and skipped. When `stop` is raised, samples not
/// yet started are skipped and what was extracted is still written.
pub fn run_batch<W: Write>(
    config: &ExtractorConfig,
    extractor: &FeatureExtractor,
    table: &mut FeatureTableWriter<W>,
    stop: &AtomicBool,
) -> Result<BatchSummary> {
    let mut roots = Vec::new();
    for (root, label) in config.dataset_roots() {
        let samples = discover_samples(&root, label)?;
        info!(root = %root.display(), label = %label, samples = samples.len(), "dataset root");
        roots.push(samples);
    }

    let mut summary = BatchSummary::default();
    for samples in roots {
        summary.discovered += samples.len();
        let results: Vec<(&PackageSample, Option<FeatureRecord>)> = samples
            .par_iter()
            .map(|sample| {
                if stop.load(Ordering::Relaxed) {
                    return (sample, None);
                }
                match extractor.extract(sample) {
                    Ok(record) => (sample, Some(record)),
                    Err(e) => {
                        warn!(sample = %sample.path.display(), kind = e.kind(), error = %e, "sample skipped");
                        (sample, None)
                    }
                }
            })
            .collect();

        for (sample, record) in results {
            let Some(record) = record else {
                summary.skipped += 1;
                continue;
            };
            table.write(&record)?;
            if let Some(dir) = &config.output.per_package_dir {
                if let Err(e) = write_package_table(dir, sample, &record) {
                    warn!(sample = %sample.path.display(), error = %e, "per-package table not written");
                }
            }
        }
        table.flush()?;
    }

    summary.written = table.rows();
    summary.interrupted = stop.load(Ordering::Relaxed);
    Ok(summary)
}
