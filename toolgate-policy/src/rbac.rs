use std::collections::HashMap;

use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

/// A profile a service can be assigned: matched by id (`ctx.profile_id`) or
/// by the requester holding one of its `required_roles` (spec.md §4.10).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProfileDefinition {
    pub id: String,
    #[serde(default)]
    pub required_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RbacConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Profiles assigned per service. A service absent from this map, or
    /// mapped to an empty list, has no profiles ("simple-mode").
    #[serde(default)]
    pub service_profiles: HashMap<String, Vec<ProfileDefinition>>,
}

/// Extracts user, profile, and roles from the request context and checks
/// them against the profiles assigned to the target service (spec.md §4.10).
pub struct RbacMiddleware {
    config: RbacConfig,
}

impl RbacMiddleware {
    pub fn new(config: RbacConfig) -> Self {
        Self { config }
    }
}

impl ExecutionMiddleware for RbacMiddleware {
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

            let profiles = self.config.service_profiles.get(&ctx.service_id).map(Vec::as_slice).unwrap_or(&[]);
            if profiles.is_empty() {
                // Simple-mode: no profiles assigned, authenticated or
                // anonymous requests both pass.
                return next.run(ctx, req).await;
            }

            let Some(user_id) = ctx.user_id.clone() else {
                return Err(ToolGateError::PolicyDenied(format!(
                    "authentication required for service {}",
                    ctx.service_id
                )));
            };

            let matches = profiles.iter().any(|p| {
                ctx.profile_id.as_deref() == Some(p.id.as_str())
                    || p.required_roles.iter().any(|required| ctx.roles.iter().any(|held| held == required))
            });

            if matches {
                next.run(ctx, req).await
            } else {
                Err(ToolGateError::PolicyDenied(format!(
                    "user {user_id} does not match any profile assigned to service {}",
                    ctx.service_id
                )))
            }
        })
    }

    fn name(&self) -> &'static str {
        "rbac"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use toolgate_core::pipeline::{ExecutionPipeline, ExecutionUpstream};
    use toolgate_core::request::ExecutionRequest as Req;

    use super::*;

    fn upstream_ok() -> Box<ExecutionUpstream> {
        Box::new(|_ctx, _req| Box::pin(async move { Ok(serde_json::json!({"ok": true})) }))
    }

    async fn run(middleware: RbacMiddleware, ctx: RequestContext) -> Result<serde_json::Value, ToolGateError> {
        let mws: Vec<Arc<dyn ExecutionMiddleware>> = vec![Arc::new(middleware)];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream = upstream_ok();
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));
        pipeline.run(ctx, req, &upstream).await
    }

    #[tokio::test]
    async fn service_with_no_profiles_passes_anonymous_requests() {
        let config = RbacConfig { enabled: true, service_profiles: HashMap::new() };
        let ctx = RequestContext::new("r1", "svc");
        assert!(run(RbacMiddleware::new(config), ctx).await.is_ok());
    }

    #[tokio::test]
    async fn service_with_profiles_denies_unauthenticated_requests() {
        let mut service_profiles = HashMap::new();
        service_profiles.insert("svc".to_string(), vec![ProfileDefinition { id: "p1".to_string(), required_roles: vec![] }]);
        let config = RbacConfig { enabled: true, service_profiles };
        let ctx = RequestContext::new("r1", "svc");
        assert!(matches!(run(RbacMiddleware::new(config), ctx).await, Err(ToolGateError::PolicyDenied(_))));
    }

    #[tokio::test]
    async fn matching_profile_by_id_passes() {
        let mut service_profiles = HashMap::new();
        service_profiles.insert("svc".to_string(), vec![ProfileDefinition { id: "p1".to_string(), required_roles: vec![] }]);
        let config = RbacConfig { enabled: true, service_profiles };
        let ctx = RequestContext::new("r1", "svc").with_user("u1").with_profile("p1");
        assert!(run(RbacMiddleware::new(config), ctx).await.is_ok());
    }

    #[tokio::test]
    async fn matching_required_role_passes_without_profile_id() {
        let mut service_profiles = HashMap::new();
        service_profiles.insert(
            "svc".to_string(),
            vec![ProfileDefinition { id: "p1".to_string(), required_roles: vec!["admin".to_string()] }],
        );
        let config = RbacConfig { enabled: true, service_profiles };
        let ctx = RequestContext::new("r1", "svc").with_user("u1").with_roles(vec!["admin".to_string()]);
        assert!(run(RbacMiddleware::new(config), ctx).await.is_ok());
    }

    #[tokio::test]
    async fn authenticated_user_matching_nothing_is_denied() {
        let mut service_profiles = HashMap::new();
        service_profiles.insert(
            "svc".to_string(),
            vec![ProfileDefinition { id: "p1".to_string(), required_roles: vec!["admin".to_string()] }],
        );
        let config = RbacConfig { enabled: true, service_profiles };
        let ctx = RequestContext::new("r1", "svc").with_user("u1");
        assert!(matches!(run(RbacMiddleware::new(config), ctx).await, Err(ToolGateError::PolicyDenied(_))));
    }
}
