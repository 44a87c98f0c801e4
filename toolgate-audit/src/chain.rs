use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::Mutex;
use toolgate_core::ToolGateError;

use crate::backend::AuditBackend;
use crate::record::{build_record, AuditRecord};

/// Serializes record construction so `prev_hash` is always a consistent
/// read-modify-write (spec.md §9 "Hash-chain concurrency"): a `Mutex` guards
/// the running `prev_hash`, while `id` is a separate atomic counter since it
/// only needs to be monotonic, not part of the critical section.
pub struct AuditChain {
    prev_hash: Mutex<String>,
    next_id: AtomicU64,
}

impl AuditChain {
    /// `seed_hash` is the last record's hash recovered from the backend at
    /// startup, or empty string for a fresh chain.
    pub fn new(seed_hash: String, next_id: u64) -> Self {
        Self { prev_hash: Mutex::new(seed_hash), next_id: AtomicU64::new(next_id) }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn next_record(
        &self,
        tool: String,
        user: Option<String>,
        profile: Option<String>,
        args: Option<Value>,
        result: Option<Value>,
        error: Option<String>,
        duration_ms: u64,
    ) -> AuditRecord {
        let mut prev = self.prev_hash.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = build_record(id, tool, user, profile, args, result, error, duration_ms, prev.clone());
        *prev = record.hash.clone();
        record
    }
}

/// Builds a chain seeded from whatever the backend already holds.
pub async fn recover_chain(backend: &dyn AuditBackend) -> Result<AuditChain, ToolGateError> {
    let (last_id, last_hash) = backend.last_state().await?;
    Ok(AuditChain::new(last_hash, last_id + 1))
}
