use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalRecord, EvidenceRow};
use crate::error::AppError;
use crate::table::{open_backend, EvidenceTable, Reconciliation, TableBackend};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeReport {
    pub created: bool,
    pub reconciliation: Reconciliation,
    pub row_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendOutcome {
    Inserted,
    /// An identical row already existed anywhere in the table.
    Duplicate,
    /// The record projected to an all-empty row.
    Blank,
}

/// Append-only evidence table with schema enforcement and full-row duplicate suppression.
///
/// Every `append` is a read-modify-write of the whole table, so duplicates are detected
/// against everything ever stored at this location, not only the current run.
pub struct EvidenceStore {
    backend: Box<dyn TableBackend>,
}

impl EvidenceStore {
    /// Open the store at `path`, picking the backend from the file extension.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        Ok(Self {
            backend: open_backend(path)?,
        })
    }

    pub fn with_backend(backend: Box<dyn TableBackend>) -> Self {
        Self { backend }
    }

    pub fn location(&self) -> &Path {
        self.backend.location()
    }

    /// Create the table if absent, otherwise reconcile it to the schema and persist it back.
    pub fn initialize(&self) -> Result<InitializeReport, AppError> {
        if !self.backend.exists()? {
            self.backend.save(&EvidenceTable::new())?;
            tracing::info!(path = %self.location().display(), "created evidence table");
            return Ok(InitializeReport {
                created: true,
                reconciliation: Reconciliation::default(),
                row_count: 0,
            });
        }

        let loaded = self.backend.load()?;
        let (mut table, reconciliation) = EvidenceTable::reconcile(&loaded);
        let removed = table.compact();
        self.backend.save(&table)?;

        if !reconciliation.is_noop() || removed > 0 {
            tracing::info!(
                path = %self.location().display(),
                added = ?reconciliation.added_columns,
                dropped = ?reconciliation.dropped_columns,
                removed_rows = removed,
                "reconciled existing evidence table"
            );
        }

        Ok(InitializeReport {
            created: false,
            reconciliation,
            row_count: table.row_count(),
        })
    }

    /// Current table, reconciled to the schema. A missing table reads as empty.
    pub fn read_table(&self) -> Result<EvidenceTable, AppError> {
        if !self.backend.exists()? {
            return Ok(EvidenceTable::new());
        }
        let loaded = self.backend.load()?;
        Ok(EvidenceTable::reconcile(&loaded).0)
    }

    pub fn append(&self, record: &CanonicalRecord) -> Result<AppendOutcome, AppError> {
        let row = EvidenceRow::project(record);
        if row.is_blank() {
            return Ok(AppendOutcome::Blank);
        }

        let mut table = self.read_table()?;
        let outcome = if table.contains(&row) {
            AppendOutcome::Duplicate
        } else {
            AppendOutcome::Inserted
        };
        table.push(row);
        table.compact();
        self.backend.save(&table)?;
        Ok(outcome)
    }

    /// Store a free-text consolidated summary in the secondary "Resumo Final" view.
    pub fn finalize_summary(&self, text: &str) -> Result<(), AppError> {
        self.backend.write_summary(text)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;
    use crate::table::LoadedTable;

    /// In-memory backend; clones share state so a test can watch what the store did.
    #[derive(Clone, Default)]
    struct MemoryBackend {
        path: PathBuf,
        table: Rc<RefCell<Option<LoadedTable>>>,
        saves: Rc<Cell<usize>>,
        fail_saves: bool,
    }

    impl TableBackend for MemoryBackend {
        fn location(&self) -> &Path {
            &self.path
        }

        fn exists(&self) -> Result<bool, AppError> {
            Ok(self.table.borrow().is_some())
        }

        fn load(&self) -> Result<LoadedTable, AppError> {
            self.table
                .borrow()
                .clone()
                .ok_or_else(|| AppError::new("STORE_READ_FAILED", "missing"))
        }

        fn save(&self, table: &EvidenceTable) -> Result<(), AppError> {
            if self.fail_saves {
                return Err(AppError::new("STORE_WRITE_FAILED", "disk full"));
            }
            self.saves.set(self.saves.get() + 1);
            *self.table.borrow_mut() = Some(LoadedTable {
                columns: table.columns().iter().map(|c| c.to_string()).collect(),
                rows: table
                    .rows()
                    .iter()
                    .map(|r| r.cells().iter().map(|c| c.to_string()).collect())
                    .collect(),
            });
            Ok(())
        }

        fn write_summary(&self, _text: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn record(pairs: &[(&str, &str)]) -> CanonicalRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn blank_record_never_touches_the_backend() {
        let backend = MemoryBackend {
            path: PathBuf::from("memoria.csv"),
            ..MemoryBackend::default()
        };
        let store = EvidenceStore::with_backend(Box::new(backend.clone()));
        store.initialize().unwrap();
        assert_eq!(backend.saves.get(), 1);

        let outcome = store.append(&record(&[("Observação", "x")])).unwrap();
        assert_eq!(outcome, AppendOutcome::Blank);
        assert_eq!(backend.saves.get(), 1);

        store.append(&record(&[("Resumo", "sinal pago")])).unwrap();
        assert_eq!(backend.saves.get(), 2);
        assert_eq!(store.read_table().unwrap().row_count(), 1);
        assert_eq!(store.location(), Path::new("memoria.csv"));
    }

    #[test]
    fn save_failure_propagates_from_append() {
        let backend = MemoryBackend {
            fail_saves: true,
            ..MemoryBackend::default()
        };
        let store = EvidenceStore::with_backend(Box::new(backend));
        let err = store.append(&record(&[("Trecho", "fls. 3")])).unwrap_err();
        assert_eq!(err.code, "STORE_WRITE_FAILED");
    }
}
