pub mod csv_file;
pub mod sqlite;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{canonical_headers, EvidenceColumn, EvidenceRow};
use crate::error::AppError;

pub use csv_file::CsvTableFile;
pub use sqlite::SqliteTable;

/// Name of the secondary view holding the consolidated free-text summary.
pub const SUMMARY_VIEW_NAME: &str = "Resumo Final";

/// A table exactly as found on disk, before reconciliation to the fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Whole-table persistence. Implementations read everything and overwrite everything;
/// there are no partial writes.
pub trait TableBackend {
    fn location(&self) -> &Path;
    fn exists(&self) -> Result<bool, AppError>;
    fn load(&self) -> Result<LoadedTable, AppError>;
    fn save(&self, table: &EvidenceTable) -> Result<(), AppError>;
    fn write_summary(&self, text: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Sqlite,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(TableFormat::Csv),
            Some("sqlite") | Some("sqlite3") | Some("db") => Ok(TableFormat::Sqlite),
            _ => Err(AppError::new(
                "CONFIG_INVALID",
                "Evidence table path must end in .csv, .sqlite, .sqlite3 or .db",
            )
            .with_details(format!("path={}", path.display()))),
        }
    }
}

pub fn open_backend(path: &Path) -> Result<Box<dyn TableBackend>, AppError> {
    Ok(match TableFormat::from_path(path)? {
        TableFormat::Csv => Box::new(CsvTableFile::new(path.to_path_buf())),
        TableFormat::Sqlite => Box::new(SqliteTable::new(path.to_path_buf())),
    })
}

/// Ordered evidence rows under the fixed five-column schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTable {
    rows: Vec<EvidenceRow>,
}

/// Column changes made while fitting a loaded table to the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub added_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.added_columns.is_empty() && self.dropped_columns.is_empty()
    }
}

impl EvidenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<EvidenceRow>) -> Self {
        Self { rows }
    }

    /// Fit a loaded table to the schema: missing columns become empty, extra columns go.
    pub fn reconcile(loaded: &LoadedTable) -> (Self, Reconciliation) {
        let positions: Vec<Option<usize>> = EvidenceColumn::ALL
            .iter()
            .map(|col| loaded.columns.iter().position(|c| c.trim() == col.header()))
            .collect();

        let added_columns = EvidenceColumn::ALL
            .iter()
            .zip(&positions)
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| c.header().to_string())
            .collect();
        let dropped_columns = loaded
            .columns
            .iter()
            .filter(|c| EvidenceColumn::from_header(c.trim()).is_none())
            .cloned()
            .collect();

        let rows = loaded
            .rows
            .iter()
            .map(|cells| {
                let cell = |i: usize| {
                    positions[i]
                        .and_then(|p| cells.get(p))
                        .cloned()
                        .unwrap_or_default()
                };
                EvidenceRow::from_cells([cell(0), cell(1), cell(2), cell(3), cell(4)])
            })
            .collect();

        (
            Self { rows },
            Reconciliation {
                added_columns,
                dropped_columns,
            },
        )
    }

    pub fn rows(&self) -> &[EvidenceRow] {
        &self.rows
    }

    pub fn columns(&self) -> [&'static str; 5] {
        canonical_headers()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        EvidenceColumn::ALL.len()
    }

    pub fn contains(&self, row: &EvidenceRow) -> bool {
        self.rows.iter().any(|r| r == row)
    }

    pub fn push(&mut self, row: EvidenceRow) {
        self.rows.push(row);
    }

    /// Drop all-empty rows, then exact duplicates keeping the first occurrence.
    /// Returns how many rows were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<EvidenceRow> = HashSet::with_capacity(before);
        self.rows
            .retain(|r| !r.is_blank() && seen.insert(r.clone()));
        before - self.rows.len()
    }

    /// Row count per distinct evidence type, most frequent first, ties by name.
    pub fn type_distribution(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for r in &self.rows {
            *counts.entry(r.evidence_type.as_str()).or_default() += 1;
        }
        let mut out: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }
}
