//! History store: append, list, delete.

use crate::error::MemoryError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use symcheck_types::history::HistoryRecord;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT id, symptoms, result, model_used, timestamp FROM symptom_history";

/// SQLite-backed store of analysis attempts.
///
/// Holds only the database path. Cloning is cheap and clones share the
/// same file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    db_path: PathBuf,
}

impl HistoryStore {
    /// Open (creating if needed) the store at `db_path`.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let store = Self {
            db_path: db_path.into(),
        };
        store.init()?;
        Ok(store)
    }

    /// Path of the backing database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, MemoryError> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn init(&self) -> Result<(), MemoryError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = self.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS symptom_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symptoms TEXT NOT NULL,
                result TEXT NOT NULL,
                model_used TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_symptom_history_timestamp ON symptom_history(timestamp DESC);
            "#,
        )?;
        debug!(path = %self.db_path.display(), journal_mode = %mode, "History store ready");
        Ok(())
    }

    /// Persist a new record stamped with the current UTC time.
    pub fn append(
        &self,
        symptoms: &str,
        result: &str,
        model_used: &str,
    ) -> Result<HistoryRecord, MemoryError> {
        let conn = self.connect()?;
        let timestamp = Utc::now().trunc_subsecs(6);
        conn.execute(
            "INSERT INTO symptom_history (symptoms, result, model_used, timestamp) VALUES (?, ?, ?, ?)",
            params![symptoms, result, model_used, encode_timestamp(&timestamp)],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, model = %model_used, "History entry stored");

        Ok(HistoryRecord {
            id,
            symptoms: symptoms.to_string(),
            result: result.to_string(),
            model_used: model_used.to_string(),
            timestamp,
        })
    }

    /// All records, newest first, optionally filtered by a case-insensitive
    /// keyword matched against symptoms and result. An empty keyword is no
    /// filter.
    pub fn list(&self, keyword: Option<&str>) -> Result<Vec<HistoryRecord>, MemoryError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY timestamp DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], read_row)?;

        let keyword = keyword.filter(|k| !k.is_empty());
        let mut records = Vec::new();
        for row in rows {
            let record = decode_row(row?)?;
            if keyword.map_or(true, |k| record.matches_keyword(k)) {
                records.push(record);
            }
        }
        Ok(records)
    }

    #[cfg(test)]
    fn get(&self, id: i64) -> Result<Option<HistoryRecord>, MemoryError> {
        use rusqlite::OptionalExtension;
        let conn = self.connect()?;
        let row = conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?"), [id], read_row)
            .optional()?;
        row.map(decode_row).transpose()
    }

    #[cfg(test)]
    fn count(&self) -> Result<u64, MemoryError> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM symptom_history", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Remove one record. `NotFound` leaves the store untouched.
    pub fn delete_one(&self, id: i64) -> Result<(), MemoryError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM symptom_history WHERE id = ?", [id])?;
        if removed == 0 {
            return Err(MemoryError::NotFound(id));
        }
        info!(id, "History entry deleted");
        Ok(())
    }

    /// Remove every record, returning how many were removed.
    pub fn delete_all(&self) -> Result<usize, MemoryError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM symptom_history", [])?;
        info!(removed, "History cleared");
        Ok(removed)
    }
}

type RawRow = (i64, String, String, String, String);

fn read_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn decode_row((id, symptoms, result, model_used, ts): RawRow) -> Result<HistoryRecord, MemoryError> {
    let timestamp = DateTime::parse_from_rfc3339(&ts)
        .map_err(|e| MemoryError::Corrupt {
            id,
            reason: format!("timestamp '{ts}': {e}"),
        })?
        .with_timezone(&Utc);
    Ok(HistoryRecord {
        id,
        symptoms,
        result,
        model_used,
        timestamp,
    })
}

/// Fixed-width RFC 3339 so lexical order in SQLite matches time order.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
