use std::fs;
use std::path::{Path, PathBuf};

use super::{EvidenceTable, LoadedTable, TableBackend, SUMMARY_VIEW_NAME};
use crate::domain::canonical_headers;
use crate::error::AppError;

/// Evidence table persisted as a single UTF-8 CSV file with a header row.
///
/// The summary view lives in a sidecar file next to it: `<stem>.resumo_final.csv`.
#[derive(Debug, Clone)]
pub struct CsvTableFile {
    path: PathBuf,
}

impl CsvTableFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn summary_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("evidencias");
        self.path.with_file_name(format!("{stem}.resumo_final.csv"))
    }

    fn ensure_parent(path: &Path) -> Result<(), AppError> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(|e| {
                AppError::new("STORE_WRITE_FAILED", "Failed to create table directory")
                    .with_details(format!("path={}; err={}", dir.display(), e))
            }),
            _ => Ok(()),
        }
    }

    /// Write to a temp file then rename over the destination.
    fn swap_in(path: &Path, bytes: Vec<u8>) -> Result<(), AppError> {
        Self::ensure_parent(path)?;
        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, &bytes).map_err(|e| {
            AppError::new("STORE_WRITE_FAILED", "Failed to write evidence table")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::new("STORE_WRITE_FAILED", "Failed to finalize evidence table write")
                .with_details(format!(
                    "tmp={}; dest={}; err={}",
                    tmp.display(),
                    path.display(),
                    e
                ))
        })
    }
}

fn encode_failed(e: impl std::fmt::Display) -> AppError {
    AppError::new("STORE_WRITE_FAILED", "Failed to encode evidence table as CSV")
        .with_details(e.to_string())
}

impl TableBackend for CsvTableFile {
    fn location(&self) -> &Path {
        self.path.as_path()
    }

    fn exists(&self) -> Result<bool, AppError> {
        Ok(self.path.is_file())
    }

    fn load(&self) -> Result<LoadedTable, AppError> {
        let bytes = fs::read(&self.path).map_err(|e| {
            AppError::new("STORE_READ_FAILED", "Failed to read evidence table")
                .with_details(format!("path={}; err={}", self.path.display(), e))
        })?;

        // Tolerate a leading BOM from spreadsheet exports.
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body);

        let columns = rdr
            .headers()
            .map_err(|e| {
                AppError::new("STORE_READ_FAILED", "Failed to read evidence table header")
                    .with_details(format!("path={}; err={}", self.path.display(), e))
            })?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let rec = result.map_err(|e| {
                AppError::new("STORE_READ_FAILED", "Failed to parse evidence table row")
                    .with_details(format!("path={}; row={}; err={}", self.path.display(), idx, e))
            })?;
            rows.push(rec.iter().map(str::to_string).collect());
        }

        Ok(LoadedTable { columns, rows })
    }

    fn save(&self, table: &EvidenceTable) -> Result<(), AppError> {
        // Header is written explicitly so an empty table still carries the schema.
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(canonical_headers()).map_err(encode_failed)?;
        for row in table.rows() {
            wtr.serialize(row).map_err(encode_failed)?;
        }
        let bytes = wtr.into_inner().map_err(encode_failed)?;
        Self::swap_in(&self.path, bytes)
    }

    fn write_summary(&self, text: &str) -> Result<(), AppError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["Resumo"]).map_err(encode_failed)?;
        wtr.write_record([text]).map_err(encode_failed)?;
        let bytes = wtr.into_inner().map_err(encode_failed)?;
        let path = self.summary_path();
        Self::swap_in(&path, bytes)?;
        tracing::info!(view = SUMMARY_VIEW_NAME, path = %path.display(), "wrote summary view");
        Ok(())
    }
}
