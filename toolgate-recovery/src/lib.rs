//! Retries a failed tool call with LLM-suggested argument repair (spec.md
//! C9).

mod client;
mod middleware;
mod repair;

pub use client::{RecoveryLlmClient, RecoveryLlmClientFactory};
pub use middleware::{RecoveryConfig, RecoveryMiddleware};
pub use repair::{build_prompt, parse_repaired_arguments};
