//! toolgate — a single dependency that re-exports the whole middleware
//! pipeline core through feature flags. Import everything you need with:
//!
//! ```ignore
//! use toolgate::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature         | Default | Crate                    |
//! |-----------------|---------|--------------------------|
//! | `redact`        | **yes** | `toolgate-redact`        |
//! | `cache`         | **yes** | `toolgate-cache`         |
//! | `ratelimit`     | **yes** | `toolgate-ratelimit`     |
//! | `audit`         | **yes** | `toolgate-audit`         |
//! | `observability` | **yes** | `toolgate-observability` |
//! | `policy`        | **yes** | `toolgate-policy`        |
//! | `tokenizer`     | no      | `toolgate-tokenizer`     |
//! | `embeddings`    | no      | `toolgate-embeddings`    |
//! | `vectorstore`   | no      | `toolgate-vectorstore`   |
//! | `recovery`      | no      | `toolgate-recovery`      |
//! | `context`       | no      | `toolgate-context`       |
//! | `full`          | no      | All of the above         |

pub mod wiring;

pub use toolgate_core::*;

#[cfg(feature = "redact")]
pub use toolgate_redact;

#[cfg(feature = "tokenizer")]
pub use toolgate_tokenizer;

#[cfg(feature = "embeddings")]
pub use toolgate_embeddings;

#[cfg(feature = "vectorstore")]
pub use toolgate_vectorstore;

#[cfg(feature = "cache")]
pub use toolgate_cache;

#[cfg(feature = "ratelimit")]
pub use toolgate_ratelimit;

#[cfg(feature = "audit")]
pub use toolgate_audit;

#[cfg(feature = "recovery")]
pub use toolgate_recovery;

#[cfg(feature = "context")]
pub use toolgate_context;

#[cfg(feature = "observability")]
pub use toolgate_observability;

#[cfg(feature = "policy")]
pub use toolgate_policy;

/// Unified prelude — `use toolgate::prelude::*` pulls in the core pipeline
/// types plus every enabled feature crate's middleware and config types.
pub mod prelude {
    pub use toolgate_core::prelude::*;

    #[cfg(feature = "redact")]
    pub use toolgate_redact::{DlpConfig, DlpMiddleware};

    #[cfg(feature = "cache")]
    pub use toolgate_cache::CacheMiddleware;

    #[cfg(feature = "ratelimit")]
    pub use toolgate_ratelimit::RateLimitMiddleware;

    #[cfg(feature = "audit")]
    pub use toolgate_audit::{AuditBackend, AuditMiddleware};

    #[cfg(feature = "recovery")]
    pub use toolgate_recovery::{RecoveryLlmClientFactory, RecoveryMiddleware};

    #[cfg(feature = "context")]
    pub use toolgate_context::ContextMiddleware;

    #[cfg(feature = "observability")]
    pub use toolgate_observability::{MetricsMiddleware, MetricsSink, TracingMiddleware};

    #[cfg(feature = "policy")]
    pub use toolgate_policy::{
        CallPolicyMiddleware, CallPolicyProvider, GuardrailMiddleware, RbacMiddleware,
        SsoGateMiddleware, SsoValidator,
    };
}
