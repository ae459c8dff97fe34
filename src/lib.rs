//! npm-features: static feature extraction for npm package classification.
//!
//! Modular structure:
//! - [`corpus`]: Samples, dataset layout, per-file reading and classification
//! - [`scan`]: Entropy, lexical pattern counting, syntax capability matching
//! - [`features`]: Per-analyzer sub-records and the fixed-schema record
//! - [`output`]: CSV feature tables
//! - [`batch`]: Extraction over the declared dataset roots
//! - [`logging`]: Structured logging

pub mod batch;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod logging;
pub mod output;
pub mod scan;

pub use batch::{run_batch, BatchSummary};
pub use config::ExtractorConfig;
pub use corpus::{Label, PackageSample};
pub use error::{ExtractError, Result};
pub use features::{FeatureExtractor, FeatureRecord, FeatureSet};
pub use logging::StructuredLogger;
pub use output::FeatureTableWriter;
