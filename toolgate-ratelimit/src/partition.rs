use sha2::{Digest, Sha256};
use toolgate_core::RequestContext;

use crate::config::PartitionStrategy;

/// Derives the partition component of a limiter key (spec.md §4.5).
/// Falls back to `"anonymous"` when the chosen strategy's context field is
/// absent, so a single limiter key is still shared by all such callers
/// rather than silently bypassing the limit.
pub fn partition_key(ctx: &RequestContext, strategy: PartitionStrategy) -> String {
    match strategy {
        PartitionStrategy::Ip => ctx.peer_ip.clone().unwrap_or_else(|| "anonymous".to_string()),
        PartitionStrategy::User => match &ctx.user_id {
            Some(id) => hash_with_salt("auth:", id),
            None => "anonymous".to_string(),
        },
        PartitionStrategy::ApiKey => match &ctx.api_key {
            Some(key) => hash_with_salt("apikey:", key),
            None => "anonymous".to_string(),
        },
        PartitionStrategy::Global => "global".to_string(),
    }
}

fn hash_with_salt(salt: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
