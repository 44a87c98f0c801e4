use tokio_util::sync::CancellationToken;

/// Ambient per-request data threaded explicitly through the chain (spec.md §3,
/// §5). Never stored in component-scoped fields — each request gets its own
/// `RequestContext` built by the adapter at the edge of the pipeline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub service_id: String,
    pub user_id: Option<String>,
    pub profile_id: Option<String>,
    pub roles: Vec<String>,
    pub api_key: Option<String>,
    pub peer_ip: Option<String>,
    pub cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            service_id: service_id.into(),
            user_id: None,
            profile_id: None,
            roles: Vec::new(),
            api_key: None,
            peer_ip: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
