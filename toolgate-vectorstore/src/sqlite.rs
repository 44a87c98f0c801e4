use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use toolgate_core::ToolGateError;

use crate::{check_dimension, cosine_similarity, normalize, VectorHit, VectorStore};

fn to_backend_error(e: rusqlite::Error) -> ToolGateError {
    ToolGateError::BackendUnavailable(format!("vectorstore sqlite: {e}"))
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn unix_millis(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

/// rusqlite-backed vector store (spec.md §4.4): rows of `(id, scope, vector,
/// result, expires_at)`, an expires-at index and a scope index. The bundled
/// engine has no native vector extension, so the similarity scan itself is
/// plain Rust over rows fetched for the scope; this sits behind the same
/// [`VectorStore`] trait as [`crate::InMemoryVectorStore`] so swapping in a
/// real vector-extension backend later is a drop-in.
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorStore {
    pub fn open(path: &str) -> Result<Self, ToolGateError> {
        let conn = Connection::open(path).map_err(to_backend_error)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn open_in_memory() -> Result<Self, ToolGateError> {
        let conn = Connection::open_in_memory().map_err(to_backend_error)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn init_schema(conn: &Connection) -> Result<(), ToolGateError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS vector_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scope TEXT NOT NULL,
                vector BLOB NOT NULL,
                result TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_vector_records_scope ON vector_records(scope);
            CREATE INDEX IF NOT EXISTS idx_vector_records_expires_at ON vector_records(expires_at);
            CREATE TABLE IF NOT EXISTS vector_scope_dims (
                scope TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL
            );",
        )
        .map_err(to_backend_error)
    }

    /// Fixes `scope`'s vector dimension on its first insert and rejects a
    /// later vector whose length differs (spec.md §3).
    fn check_and_record_dimension(
        conn: &Connection,
        scope: &str,
        vector_len: usize,
    ) -> Result<(), ToolGateError> {
        let recorded: Option<i64> = conn
            .query_row(
                "SELECT dimension FROM vector_scope_dims WHERE scope = ?1",
                params![scope],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_backend_error)?;

        let dim = check_dimension(recorded.map(|d| d as usize), vector_len, scope)?;

        conn.execute(
            "INSERT INTO vector_scope_dims (scope, dimension) VALUES (?1, ?2)
             ON CONFLICT(scope) DO NOTHING",
            params![scope, dim as i64],
        )
        .map_err(to_backend_error)?;
        Ok(())
    }

    fn recorded_dimension(conn: &Connection, scope: &str) -> Result<Option<usize>, ToolGateError> {
        conn.query_row(
            "SELECT dimension FROM vector_scope_dims WHERE scope = ?1",
            params![scope],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(to_backend_error)
        .map(|opt| opt.map(|d| d as usize))
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add(
        &self,
        scope: &str,
        vector: Vec<f32>,
        value: Value,
        ttl: Duration,
    ) -> Result<(), ToolGateError> {
        let conn = self.conn.clone();
        let scope = scope.to_string();
        let normalized = normalize(&vector);
        let result_json = serde_json::to_string(&value)?;
        let expires_at = unix_millis(SystemTime::now() + ttl);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            Self::check_and_record_dimension(&conn, &scope, normalized.len())?;
            conn.execute(
                "INSERT INTO vector_records (scope, vector, result, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![scope, vector_to_bytes(&normalized), result_json, expires_at],
            )
            .map_err(to_backend_error)
            .map(|_| ())
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("vectorstore blocking task: {e}")))?
    }

    async fn search(
        &self,
        scope: &str,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<VectorHit>, ToolGateError> {
        let conn = self.conn.clone();
        let scope = scope.to_string();
        let query = normalize(query);
        let now = unix_millis(SystemTime::now());

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            if let Some(dim) = Self::recorded_dimension(&conn, &scope)? {
                check_dimension(Some(dim), query.len(), &scope)?;
            }

            let mut stmt = conn
                .prepare("SELECT vector, result FROM vector_records WHERE scope = ?1 AND expires_at > ?2")
                .map_err(to_backend_error)?;
            let rows = stmt
                .query_map(params![scope, now], |row| {
                    let vector_bytes: Vec<u8> = row.get(0)?;
                    let result_json: String = row.get(1)?;
                    Ok((vector_bytes, result_json))
                })
                .map_err(to_backend_error)?;

            let mut scored: Vec<(f32, Value)> = Vec::new();
            for row in rows {
                let (vector_bytes, result_json) = row.map_err(to_backend_error)?;
                let vector = bytes_to_vector(&vector_bytes);
                let similarity = cosine_similarity(&query, &vector);
                if similarity >= threshold {
                    let value: Value = serde_json::from_str(&result_json)?;
                    scored.push((similarity, value));
                }
            }

            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(k);

            Ok(scored
                .into_iter()
                .map(|(similarity, value)| VectorHit { value, similarity })
                .collect())
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("vectorstore blocking task: {e}")))?
    }

    async fn clear(&self) -> Result<(), ToolGateError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.execute("DELETE FROM vector_records", []).map_err(to_backend_error)?;
            conn.execute("DELETE FROM vector_scope_dims", []).map_err(to_backend_error).map(|_| ())
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("vectorstore blocking task: {e}")))?
    }

    async fn prune(&self, scope: &str) -> Result<(), ToolGateError> {
        let conn = self.conn.clone();
        let scope = scope.to_string();
        let now = unix_millis(SystemTime::now());
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.execute(
                "DELETE FROM vector_records WHERE scope = ?1 AND expires_at <= ?2",
                params![scope, now],
            )
            .map_err(to_backend_error)
            .map(|_| ())
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("vectorstore blocking task: {e}")))?
    }
}
