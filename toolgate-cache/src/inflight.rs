use std::future::Future;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use toolgate_core::{ExecutionResult, ToolGateError};

/// Coalesces concurrent callers sharing the same cache key into a single
/// downstream call (spec.md §4.3 step 5): the first caller runs `f`; any
/// caller that arrives while it's in flight subscribes to the result instead
/// of calling `f` again. Cancellation of one subscriber never cancels the
/// shared work since the leader owns it independently.
#[derive(Default)]
pub struct SingleFlightGroup {
    inflight: DashMap<String, broadcast::Sender<Result<ExecutionResult, ToolGateError>>>,
}

impl SingleFlightGroup {
    pub fn new() -> Self {
        Self { inflight: DashMap::new() }
    }

    pub async fn run<F>(&self, key: &str, f: F) -> Result<ExecutionResult, ToolGateError>
    where
        F: Future<Output = Result<ExecutionResult, ToolGateError>>,
    {
        let mut receiver = None;
        let mut is_leader = false;

        match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                receiver = Some(entry.get().subscribe());
            }
            Entry::Vacant(entry) => {
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx);
                is_leader = true;
            }
        }

        if let Some(mut rx) = receiver {
            return rx
                .recv()
                .await
                .unwrap_or_else(|_| Err(ToolGateError::Internal("single-flight channel closed".into())));
        }

        debug_assert!(is_leader);
        let result = f.await;

        if let Some((_, tx)) = self.inflight.remove(key) {
            let _ = tx.send(result.clone());
        }

        result
    }
}
