//! CSV output.
//!
//! The header row always comes from the record type's [`CsvRecord::FIELDS`],
//! never from the first record, so every file of one kind has the same
//! columns in the same order.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ExportError;

/// A flat record with a fixed column list.
///
/// `FIELDS` must match the serialized field names in declaration order.
pub trait CsvRecord: Serialize {
    /// Header row.
    const FIELDS: &'static [&'static str];
}

/// How [`export_to_csv`] treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Truncate, then write header and rows.
    #[default]
    Overwrite,
    /// Add rows at the end. The header is written only when the file is new
    /// or empty.
    Append,
}

/// Write `records` to `path`. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`ExportError::NoData`] without touching the file when `records`
/// is empty, and `Io`/`Csv` errors when writing fails.
#[instrument(skip(records, path), fields(path = %path.display(), rows = records.len()))]
pub fn export_to_csv<R: CsvRecord>(
    records: &[R],
    path: &Path,
    mode: ExportMode,
) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }

    let (file, write_header) = match mode {
        ExportMode::Overwrite => (File::create(path)?, true),
        ExportMode::Append => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let empty = file.metadata()?.len() == 0;
            (file, empty)
        }
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if write_header {
        writer.write_record(R::FIELDS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!(write_header, "CSV batch written");
    Ok(records.len())
}

/// Incremental export of one run into one file.
///
/// The first non-empty batch truncates the file and writes the header;
/// later batches append. A file left over from an earlier run is therefore
/// replaced rather than extended.
#[derive(Debug)]
pub struct AppendSession {
    path: PathBuf,
    batches: usize,
    rows: usize,
}

impl AppendSession {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batches: 0,
            rows: 0,
        }
    }

    /// Write one batch. Empty batches are skipped and leave the file alone.
    ///
    /// # Errors
    ///
    /// Returns `Io`/`Csv` errors when writing fails.
    pub fn write<R: CsvRecord>(&mut self, records: &[R]) -> Result<usize, ExportError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mode = if self.batches == 0 {
            ExportMode::Overwrite
        } else {
            ExportMode::Append
        };
        let written = export_to_csv(records, &self.path, mode)?;
        self.batches += 1;
        self.rows += written;
        Ok(written)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-empty batches written so far.
    #[must_use]
    pub const fn batches(&self) -> usize {
        self.batches
    }

    /// Rows written so far, excluding the header.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Finish the session.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoData`] when no rows were written.
    pub fn finish(self) -> Result<usize, ExportError> {
        if self.rows == 0 {
            return Err(ExportError::NoData);
        }
        Ok(self.rows)
    }
}
