//! npm-features entrypoint: walks the declared dataset roots and writes one
//! combined feature table. Continues past any single-sample failure; halts
//! only when a declared dataset root is missing.

use clap::Parser;
use npm_features::{
    batch::run_batch, config::ExtractorConfig, features::FeatureExtractor, logging::StructuredLogger,
    output::FeatureTableWriter,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "npm-features", about = "Extract static features from npm package datasets")]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "NPM_FEATURES_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Root directory holding the declared dataset roots
    #[arg(long)]
    dataset_dir: Option<PathBuf>,

    /// Combined feature table
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write one feature,value table per package under this directory
    #[arg(long)]
    per_package_dir: Option<PathBuf>,

    /// Extraction threads (0 = one per core)
    #[arg(long)]
    workers: Option<usize>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

static STOP: AtomicBool = AtomicBool::new(false);

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let (mut config, config_error) = match ExtractorConfig::load(&cli.config) {
        Ok(c) => (c, None),
        Err(e) => (ExtractorConfig::default(), Some(e)),
    };
    if let Some(dir) = cli.dataset_dir {
        config.dataset.dir = dir;
    }
    if let Some(path) = cli.output {
        config.output.path = path;
    }
    if cli.per_package_dir.is_some() {
        config.output.per_package_dir = cli.per_package_dir;
    }
    if let Some(n) = cli.workers {
        config.workers = n;
    }
    if cli.log_json {
        config.log.json = true;
    }

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = config_error {
        warn!(config = %cli.config.display(), error = %e, "config not usable, using defaults");
    }
    info!(dataset = %config.dataset.dir.display(), output = %config.output.path.display(), "npm-features starting");

    if config.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build_global()?;
    }

    if let Err(e) = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    }) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }

    let extractor = FeatureExtractor::new(&config.analysis);
    let mut table = FeatureTableWriter::create(&config.output.path)?;
    let summary = run_batch(&config, &extractor, &mut table, &STOP)?;

    info!(
        discovered = summary.discovered,
        written = summary.written,
        skipped = summary.skipped,
        interrupted = summary.interrupted,
        output = %config.output.path.display(),
        "feature extraction complete"
    );
    Ok(())
}
