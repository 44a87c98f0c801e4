//! Vector storage for semantic caching (spec.md C4): insert `(scope, vector,
//! value, expires_at)`, k-NN by cosine similarity, TTL eviction.
//!
//! `scope` is normally the tool name, keeping cross-tool lookups independent.
//! Vectors are assumed unit-normalized by the embedding provider; the store
//! normalizes on insert if they aren't, so similarity stays a plain dot
//! product.

use std::time::{Duration, SystemTime};

use toolgate_core::ToolGateError;

mod memory;
mod sqlite;

pub use memory::InMemoryVectorStore;
pub use sqlite::SqliteVectorStore;

/// One hit returned by [`VectorStore::search`]: the stored value and its
/// cosine similarity to the query (1.0 = identical direction).
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub value: serde_json::Value,
    pub similarity: f32,
}

#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(
        &self,
        scope: &str,
        vector: Vec<f32>,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), ToolGateError>;

    async fn search(
        &self,
        scope: &str,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<VectorHit>, ToolGateError>;

    async fn clear(&self) -> Result<(), ToolGateError>;

    /// Drop expired and (if over a capacity bound) least-recently-used
    /// records for `scope`. The in-memory store compacts automatically;
    /// this is exposed for callers that want to force it. Default no-op for
    /// backends where storage-level TTL indexes make it unnecessary.
    async fn prune(&self, _scope: &str) -> Result<(), ToolGateError> {
        Ok(())
    }
}

pub(crate) fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / norm).collect()
}

/// `a` and `b` must be the same length (the stores enforce this per scope
/// before ever calling through to here); panics on mismatch rather than
/// silently truncating to the shorter vector.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "cosine_similarity called with mismatched vector lengths");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Checks `vector`'s length against `recorded`, the scope's dimension as of
/// its first insert. `recorded` is `None` for a scope that has never been
/// written to, in which case `vector`'s length becomes that dimension.
pub(crate) fn check_dimension(
    recorded: Option<usize>,
    vector_len: usize,
    scope: &str,
) -> Result<usize, ToolGateError> {
    match recorded {
        None => Ok(vector_len),
        Some(dim) if dim == vector_len => Ok(dim),
        Some(dim) => Err(ToolGateError::ConfigInvalid(format!(
            "scope '{scope}' was initialized with {dim}-dimensional vectors, got {vector_len}"
        ))),
    }
}

pub(crate) fn is_expired(expires_at: SystemTime) -> bool {
    SystemTime::now() >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_vector() {
        let v = normalize(&[3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_identical_unit_vectors_is_one() {
        let v = normalize(&[1.0, 2.0, 3.0]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        let a = normalize(&[1.0, 0.0]);
        let b = normalize(&[0.0, 1.0]);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn check_dimension_records_the_first_length_seen() {
        assert_eq!(check_dimension(None, 384, "svc.tool").unwrap(), 384);
    }

    #[test]
    fn check_dimension_accepts_a_matching_length() {
        assert_eq!(check_dimension(Some(384), 384, "svc.tool").unwrap(), 384);
    }

    #[test]
    fn check_dimension_rejects_a_mismatched_length() {
        let err = check_dimension(Some(384), 256, "svc.tool").unwrap_err();
        assert!(matches!(err, ToolGateError::ConfigInvalid(_)));
    }
}
