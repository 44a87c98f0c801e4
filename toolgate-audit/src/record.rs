use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// One audit entry (spec.md §3 `AuditRecord`, §6). `prev_hash`/`hash` form the
/// tamper-evident chain: flipping any byte of record *k* invalidates
/// `hash(k)` and every hash after it.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: u64,
    pub ts: String,
    pub tool: String,
    pub user: Option<String>,
    pub profile: Option<String>,
    pub args: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub prev_hash: String,
    pub hash: String,
}

#[allow(clippy::too_many_arguments)]
pub fn build_record(
    id: u64,
    tool: String,
    user: Option<String>,
    profile: Option<String>,
    args: Option<Value>,
    result: Option<Value>,
    error: Option<String>,
    duration_ms: u64,
    prev_hash: String,
) -> AuditRecord {
    let ts = Utc::now().to_rfc3339();
    let hash = compute_hash(id, &ts, &tool, &user, &profile, &args, &result, &error, duration_ms, &prev_hash);
    AuditRecord { id, ts, tool, user, profile, args, result, error, duration_ms, prev_hash, hash }
}

/// `"v1:" + hex(SHA-256(json_array_of_first_9_fields_plus_prev_hash)))`
/// (spec.md §9). Record 0's `prev_hash` is the empty string.
#[allow(clippy::too_many_arguments)]
fn compute_hash(
    id: u64,
    ts: &str,
    tool: &str,
    user: &Option<String>,
    profile: &Option<String>,
    args: &Option<Value>,
    result: &Option<Value>,
    error: &Option<String>,
    duration_ms: u64,
    prev_hash: &str,
) -> String {
    let array = serde_json::json!([id, ts, tool, user, profile, args, result, error, duration_ms, prev_hash]);
    let bytes = serde_json::to_vec(&array).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("v1:{}", hex::encode(hasher.finalize()))
}
