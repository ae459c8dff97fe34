//! Tabular output of feature records: one combined table plus optional
//! per-package `feature,value` tables.

mod table;

pub use table::{write_package_table, FeatureTableWriter};
