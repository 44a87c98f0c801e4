use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

/// The identity resolved from a validated bearer/session token, attached to
/// the request context for downstream RBAC (spec.md §4.10).
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub user_id: String,
    pub profile_id: Option<String>,
    pub roles: Vec<String>,
}

/// Token introspection is an external collaborator — narrow on purpose.
#[async_trait::async_trait]
pub trait SsoValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<ResolvedIdentity, ToolGateError>;
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SsoGateConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Validates the context's credential against an injected [`SsoValidator`]
/// and attaches the resolved identity before running the remainder of the
/// chain, so downstream RBAC sees `user_id`/`profile_id`/`roles`. Absent or
/// invalid tokens fail closed when enabled (spec.md §4.10). The bearer token
/// is carried in `RequestContext::api_key` — the only opaque per-request
/// credential field the core exposes.
pub struct SsoGateMiddleware {
    config: SsoGateConfig,
    validator: Box<dyn SsoValidator>,
}

impl SsoGateMiddleware {
    pub fn new(config: SsoGateConfig, validator: Box<dyn SsoValidator>) -> Self {
        Self { config, validator }
    }
}

impl ExecutionMiddleware for SsoGateMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            if !self.config.enabled {
                return next.run(ctx, req).await;
            }

            let Some(token) = ctx.api_key.clone() else {
                return Err(ToolGateError::PolicyDenied("missing bearer token for SSO-protected service".to_string()));
            };

            let identity = match self.validator.validate(&token).await {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(error = %e, "SSO token validation failed");
                    return Err(ToolGateError::PolicyDenied("invalid SSO token".to_string()));
                }
            };

            let mut resolved_ctx = ctx.with_user(identity.user_id).with_roles(identity.roles);
            if let Some(profile_id) = identity.profile_id {
                resolved_ctx = resolved_ctx.with_profile(profile_id);
            }

            next.run(resolved_ctx, req).await
        })
    }

    fn name(&self) -> &'static str {
        "sso-gate"
    }
}
