use std::fmt;

/// Error kinds produced by the pipeline core and its middlewares.
///
/// See spec.md §7 for the propagation rules: middlewares never mask upstream
/// errors unless they explicitly transform them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolGateError {
    /// Startup-fatal: a middleware's configuration blob failed to validate or
    /// deserialize. Surfaced from [`crate::registry::Registry::build`].
    #[error("config invalid: {0}")]
    ConfigInvalid(String),

    /// A backend dependency (Redis, SQL, an HTTP embedding provider, the LLM
    /// client) is unavailable. Callers decide fail-open vs fail-closed; this
    /// variant only carries the fact and a human-readable reason.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A policy gate (call-policy, RBAC, guardrail, SSO) denied the request.
    #[error("execution denied by policy: {0}")]
    PolicyDenied(String),

    /// The rate limiter blocked the request. The message names the scope.
    #[error("{0}")]
    RateLimitExceeded(String),

    /// The upstream tool call itself failed. Passed through unchanged after
    /// metrics/audit observe it.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// An upstream error smart-recovery judges worth retrying with rewritten
    /// arguments.
    #[error("recoverable upstream error: {0}")]
    RecoverableUpstream(String),

    /// The request's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// Anything else. Logged with full context; surfaced to callers as a
    /// generic message correlated by request id.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolGateError {
    /// The short classification used by metrics middleware's `error_kind` label.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ToolGateError::ConfigInvalid(_) => "config_invalid",
            ToolGateError::BackendUnavailable(_) => "backend_unavailable",
            ToolGateError::PolicyDenied(_) => "policy_denied",
            ToolGateError::RateLimitExceeded(_) => "rate_limit_exceeded",
            ToolGateError::Upstream(_) => "execution_failed",
            ToolGateError::RecoverableUpstream(_) => "execution_failed",
            ToolGateError::Cancelled => "context_canceled",
            ToolGateError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for ToolGateError {
    fn from(err: serde_json::Error) -> Self {
        ToolGateError::Internal(format!("json: {err}"))
    }
}

impl From<std::io::Error> for ToolGateError {
    fn from(err: std::io::Error) -> Self {
        ToolGateError::BackendUnavailable(format!("io: {err}"))
    }
}

/// A single validation failure surfaced while building a middleware's typed
/// config struct from its configuration blob.
#[derive(Debug, Clone)]
pub struct ConfigFieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
