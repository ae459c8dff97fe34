//! CSV writers. The header is written once, up front, so every row of a
//! table has the same shape.

use crate::corpus::PackageSample;
use crate::error::Result;
use crate::features::{header, FeatureRecord};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct FeatureTableWriter<W: Write> {
    inner: csv::Writer<W>,
    rows: u64,
}

impl FeatureTableWriter<File> {
    /// Create (truncate) the table at `path`, creating parent directories
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::new(File::create(path)?)
    }
}

impl<W: Write> FeatureTableWriter<W> {
    pub fn new(writer: W) -> Result<Self> {
        let mut inner = csv::Writer::from_writer(writer);
        inner.write_record(header())?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write(&mut self, record: &FeatureRecord) -> Result<()> {
        self.inner.write_record(record.to_row())?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| crate::error::ExtractError::Io(e.into_error()))
    }
}

/// Write `<dir>/<label>/<date>/<package>/change-features.csv` as `feature,value` rows
pub fn write_package_table(dir: &Path, sample: &PackageSample, record: &FeatureRecord) -> Result<PathBuf> {
    let out_dir = dir
        .join(sample.label.as_str())
        .join(&record.collection_date)
        .join(sample.name());
    std::fs::create_dir_all(&out_dir)?;
    let path = out_dir.join("change-features.csv");

    let mut w = csv::Writer::from_path(&path)?;
    w.write_record(["feature", "value"])?;
    for (column, cell) in record.columns() {
        w.write_record([column, cell.as_str()])?;
    }
    w.flush()?;
    Ok(path)
}
