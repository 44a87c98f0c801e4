//! The `http` registry kind (spec.md §4.1): a request/response wrapper around
//! whatever sits below the MCP-method dispatch. The actual framing (HTTP,
//! JSON-RPC, SSE) is out of scope for this crate (spec.md §1) — these types
//! are the narrow interface a transport embedder wraps, just rich enough to
//! let `http`-kind middlewares (e.g. a guardrail scanning raw POST bodies)
//! exist and be registered alongside `method`-kind ones.

use bytes::Bytes;

use crate::error::ToolGateError;
use crate::pipeline::BoxFuture;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: Bytes::from(serde_json::to_vec(body).unwrap_or_default()),
        }
    }
}

pub type HttpUpstream =
    dyn Fn(HttpRequest) -> BoxFuture<'static, Result<HttpResponse, ToolGateError>> + Send + Sync;

pub trait HttpMiddleware: Send + Sync {
    fn handle<'a>(
        &'a self,
        req: HttpRequest,
        next: HttpNext<'a>,
    ) -> BoxFuture<'a, Result<HttpResponse, ToolGateError>>;

    fn name(&self) -> &'static str;
}

pub struct HttpNext<'a> {
    middlewares: &'a [std::sync::Arc<dyn HttpMiddleware>],
    upstream: &'a HttpUpstream,
}

impl<'a> HttpNext<'a> {
    pub fn new(middlewares: &'a [std::sync::Arc<dyn HttpMiddleware>], upstream: &'a HttpUpstream) -> Self {
        Self { middlewares, upstream }
    }

    pub fn run(self, req: HttpRequest) -> BoxFuture<'a, Result<HttpResponse, ToolGateError>> {
        Box::pin(async move {
            match self.middlewares.split_first() {
                Some((mw, rest)) => {
                    let next = HttpNext { middlewares: rest, upstream: self.upstream };
                    mw.handle(req, next).await
                }
                None => (self.upstream)(req).await,
            }
        })
    }
}
