use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};
use toolgate_core::ToolGateError;

use crate::backend::AuditBackend;
use crate::record::AuditRecord;

fn to_backend_error(e: rusqlite::Error) -> ToolGateError {
    ToolGateError::BackendUnavailable(format!("audit sqlite: {e}"))
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS audit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL,
    tool TEXT,
    user TEXT,
    profile TEXT,
    args TEXT,
    result TEXT,
    error TEXT,
    duration_ms INTEGER,
    prev_hash TEXT,
    hash TEXT
)";

/// `rusqlite`-backed audit trail, schema per spec.md §9. Each insert is its
/// own transaction; the last `hash`/row id is read back on startup to seed
/// the chain.
pub struct SqlAuditBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqlAuditBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ToolGateError> {
        let conn = Connection::open(path).map_err(to_backend_error)?;
        conn.execute(SCHEMA, []).map_err(to_backend_error)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn open_in_memory() -> Result<Self, ToolGateError> {
        let conn = Connection::open_in_memory().map_err(to_backend_error)?;
        conn.execute(SCHEMA, []).map_err(to_backend_error)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }
}

#[async_trait::async_trait]
impl AuditBackend for SqlAuditBackend {
    async fn append(&self, record: &AuditRecord) -> Result<(), ToolGateError> {
        let conn = self.conn.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ToolGateError> {
            let args = record.args.as_ref().map(serde_json::to_string).transpose()?;
            let result = record.result.as_ref().map(serde_json::to_string).transpose()?;
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().map_err(to_backend_error)?;
            tx.execute(
                "INSERT INTO audit (id, ts, tool, user, profile, args, result, error, duration_ms, prev_hash, hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id as i64,
                    record.ts,
                    record.tool,
                    record.user,
                    record.profile,
                    args,
                    result,
                    record.error,
                    record.duration_ms as i64,
                    record.prev_hash,
                    record.hash,
                ],
            )
            .map_err(to_backend_error)?;
            tx.commit().map_err(to_backend_error)?;
            Ok(())
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("audit insert task panicked: {e}")))?
    }

    async fn last_state(&self) -> Result<(u64, String), ToolGateError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(u64, String), ToolGateError> {
            let guard = conn.lock().unwrap();
            let row: Option<(i64, String)> = guard
                .query_row("SELECT id, hash FROM audit ORDER BY id DESC LIMIT 1", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()
                .map_err(to_backend_error)?;
            Ok(row.map(|(id, hash)| (id as u64, hash)).unwrap_or((0, String::new())))
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("audit last-state task panicked: {e}")))?
    }
}
