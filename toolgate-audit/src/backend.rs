use toolgate_core::ToolGateError;

use crate::record::AuditRecord;

/// Storage contract for audit records (spec.md §4.6). Implementations own
/// serializing and appending one record at a time; the caller serializes
/// record construction (so `prev_hash` is always read-modify-write under a
/// single lock) separately via [`crate::chain::AuditChain`].
#[async_trait::async_trait]
pub trait AuditBackend: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), ToolGateError>;

    /// `(id, hash)` of the most recently written record, or `(0, "")` if the
    /// backend is empty. Read once at construction to seed the chain.
    async fn last_state(&self) -> Result<(u64, String), ToolGateError>;
}
