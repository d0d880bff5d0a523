use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};

use super::{EvidenceTable, LoadedTable, TableBackend, SUMMARY_VIEW_NAME};
use crate::domain::canonical_headers;
use crate::error::AppError;

const EVIDENCE_TABLE: &str = "evidencias";
const SUMMARY_TABLE: &str = "resumo_final";

/// Evidence table persisted in a SQLite file. Each save replaces the whole table inside
/// one transaction; the summary view is a separate one-row table.
#[derive(Debug, Clone)]
pub struct SqliteTable {
    path: PathBuf,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn db_failed(message: &str, e: rusqlite::Error) -> AppError {
    AppError::new("STORE_DB_FAILED", message).with_details(e.to_string())
}

fn cell_text(v: ValueRef<'_>) -> String {
    match v {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

impl SqliteTable {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> Result<Connection, AppError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::new("STORE_WRITE_FAILED", "Failed to create table directory")
                    .with_details(format!("path={}; err={}", dir.display(), e))
            })?;
        }
        Connection::open(&self.path).map_err(|e| {
            AppError::new("STORE_DB_FAILED", "Failed to open SQLite evidence table")
                .with_details(format!("path={}; err={}", self.path.display(), e))
        })
    }

    fn has_table(conn: &Connection, name: &str) -> Result<bool, AppError> {
        conn.query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| db_failed("Failed to inspect SQLite schema", e))
    }
}

impl TableBackend for SqliteTable {
    fn location(&self) -> &Path {
        self.path.as_path()
    }

    fn exists(&self) -> Result<bool, AppError> {
        // Opening would create the file, so check the filesystem first.
        if !self.path.is_file() {
            return Ok(false);
        }
        let conn = self.open()?;
        Self::has_table(&conn, EVIDENCE_TABLE)
    }

    fn load(&self) -> Result<LoadedTable, AppError> {
        let conn = self.open()?;
        if !Self::has_table(&conn, EVIDENCE_TABLE)? {
            return Err(AppError::new("STORE_READ_FAILED", "Evidence table not found")
                .with_details(format!("path={}; table={}", self.path.display(), EVIDENCE_TABLE)));
        }

        let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_ident(EVIDENCE_TABLE));
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| db_failed("Failed to query evidence table", e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(cell_text))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| db_failed("Failed to query evidence table", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| db_failed("Failed to read evidence row", e))?;

        Ok(LoadedTable { columns, rows })
    }

    fn save(&self, table: &EvidenceTable) -> Result<(), AppError> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| db_failed("Failed to begin evidence table write", e))?;

        let headers = canonical_headers();
        let column_defs = headers
            .iter()
            .map(|h| format!("{} TEXT NOT NULL DEFAULT ''", quote_ident(h)))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {t}; CREATE TABLE {t} ({column_defs});",
            t = quote_ident(EVIDENCE_TABLE)
        ))
        .map_err(|e| db_failed("Failed to recreate evidence table", e))?;

        {
            let insert = format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                quote_ident(EVIDENCE_TABLE),
                headers.iter().map(|h| quote_ident(h)).collect::<Vec<_>>().join(", ")
            );
            let mut stmt = tx
                .prepare(&insert)
                .map_err(|e| db_failed("Failed to prepare evidence insert", e))?;
            for row in table.rows() {
                stmt.execute(row.cells())
                    .map_err(|e| db_failed("Failed to insert evidence row", e))?;
            }
        }

        tx.commit()
            .map_err(|e| db_failed("Failed to commit evidence table write", e))
    }

    fn write_summary(&self, text: &str) -> Result<(), AppError> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| db_failed("Failed to begin summary write", e))?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {t} (resumo TEXT NOT NULL); DELETE FROM {t};",
            t = quote_ident(SUMMARY_TABLE)
        ))
        .map_err(|e| db_failed("Failed to prepare summary table", e))?;
        tx.execute(
            &format!("INSERT INTO {} (resumo) VALUES (?1)", quote_ident(SUMMARY_TABLE)),
            [text],
        )
        .map_err(|e| db_failed("Failed to write summary", e))?;
        tx.commit()
            .map_err(|e| db_failed("Failed to commit summary write", e))?;

        tracing::info!(view = SUMMARY_VIEW_NAME, path = %self.path.display(), "wrote summary view");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EvidenceRow;

    fn read_summary(path: &Path) -> Option<String> {
        let conn = Connection::open(path).unwrap();
        conn.query_row(
            &format!("SELECT resumo FROM {}", quote_ident(SUMMARY_TABLE)),
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .unwrap()
    }

    #[test]
    fn summary_table_holds_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ev.sqlite");
        let backend = SqliteTable::new(path.clone());
        backend.save(&EvidenceTable::new()).unwrap();
        backend.write_summary("primeiro").unwrap();
        backend.write_summary("segundo").unwrap();
        assert_eq!(read_summary(&path).as_deref(), Some("segundo"));
    }

    #[test]
    fn save_then_load_keeps_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteTable::new(dir.path().join("ev.db"));
        let rows = vec![
            EvidenceRow {
                evidence_type: "Pagamento".to_string(),
                ..EvidenceRow::default()
            },
            EvidenceRow {
                evidence_type: "Contrato".to_string(),
                ..EvidenceRow::default()
            },
        ];
        backend.save(&EvidenceTable::from_rows(rows)).unwrap();
        let loaded = backend.load().unwrap();
        assert_eq!(loaded.columns, canonical_headers().to_vec());
        assert_eq!(loaded.rows[0][0], "Pagamento");
        assert_eq!(loaded.rows[1][0], "Contrato");
    }
}
