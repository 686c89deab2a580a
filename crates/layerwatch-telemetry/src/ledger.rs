//! Upload ledger
//!
//! Append-only CSV file with one `"<job name>","<completion date>"` row per
//! uploaded job. It is only read back for display.

use chrono::{DateTime, Local};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use layerwatch_core::{UploadError, UploadRecord};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// File name of the ledger inside the data folder
pub const LEDGER_FILE: &str = "uploaded_print_list.csv";

/// Date format of the completion column, e.g. `Monday, March 04, 2024`
pub const COMPLETION_DATE_FORMAT: &str = "%A, %B %d, %Y";

/// Local record of uploaded jobs
#[derive(Debug, Clone)]
pub struct UploadLedger {
    path: PathBuf,
}

impl UploadLedger {
    /// Ledger stored in `data_folder`
    pub fn new(data_folder: &Path) -> Self {
        Self {
            path: data_folder.join(LEDGER_FILE),
        }
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the record for a job completed at `when`
    pub fn record(job_name: &str, when: DateTime<Local>) -> UploadRecord {
        UploadRecord {
            job_name: job_name.to_string(),
            completion_date: when.format(COMPLETION_DATE_FORMAT).to_string(),
        }
    }

    /// Append one row
    pub fn append(&self, record: &UploadRecord) -> Result<(), UploadError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.error(e))?;

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(file);
        writer
            .write_record([record.job_name.as_str(), record.completion_date.as_str()])
            .map_err(|e| self.error(e))?;
        writer.flush().map_err(|e| self.error(e))
    }

    /// All rows in file order; a missing ledger has no rows
    pub fn rows(&self) -> Result<Vec<UploadRecord>, UploadError> {
        let mut reader = match ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
        {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(self.error(e)),
        };

        let mut rows = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(|e| self.error(e))?;
            match (row.get(0), row.get(1)) {
                (Some(job_name), Some(completion_date)) => rows.push(UploadRecord {
                    job_name: job_name.to_string(),
                    completion_date: completion_date.to_string(),
                }),
                _ => tracing::warn!("Skipping malformed ledger row {}: {:?}", index + 1, row),
            }
        }
        Ok(rows)
    }

    fn error(&self, e: impl std::fmt::Display) -> UploadError {
        UploadError::Ledger {
            reason: format!("{}: {}", self.path.display(), e),
        }
    }
}

fn is_not_found(e: &csv::Error) -> bool {
    matches!(e.kind(), csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}
