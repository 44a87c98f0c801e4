//! The two call models described in spec.md §1/§6: a per-call wrapper around
//! the inbound method surface, and a per-tool-execution wrapper around
//! [`ExecutionRequest`]. Both are composed the same way: each middleware
//! implements an `around(ctx, request, next)` pattern (grounded in the
//! corpus's `Interceptor::around` trait) and `next` runs the remainder of the
//! chain, terminating in the upstream call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::ToolGateError;
use crate::request::{ExecutionRequest, ExecutionResult, ToolGateRequest, ToolGateResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A terminal upstream call for the tool-execution chain: resolves and
/// invokes the actual tool. Supplied by the embedder (the tool manager is out
/// of scope for this crate — spec.md §1).
pub type ExecutionUpstream =
    dyn Fn(RequestContext, ExecutionRequest) -> BoxFuture<'static, Result<ExecutionResult, ToolGateError>>
        + Send
        + Sync;

/// One middleware in the tool-execution chain (spec.md §4.3-§4.9 as applied to
/// `ExecutionRequest`).
pub trait ExecutionMiddleware: Send + Sync {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>>;

    /// Stable name used by the registry for selection/disable lists.
    fn name(&self) -> &'static str;
}

/// The remainder of the execution chain after the current middleware.
///
/// `Copy` since it is only ever two borrowed references: middlewares that
/// need to invoke the remainder more than once (smart-recovery's retry loop)
/// can call `next.run(...)` repeatedly without threading ownership through a
/// loop by hand.
#[derive(Clone, Copy)]
pub struct ExecutionNext<'a> {
    middlewares: &'a [Arc<dyn ExecutionMiddleware>],
    upstream: &'a ExecutionUpstream,
}

impl<'a> ExecutionNext<'a> {
    pub fn new(middlewares: &'a [Arc<dyn ExecutionMiddleware>], upstream: &'a ExecutionUpstream) -> Self {
        Self { middlewares, upstream }
    }

    pub fn run(
        self,
        ctx: RequestContext,
        req: ExecutionRequest,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            match self.middlewares.split_first() {
                Some((mw, rest)) => {
                    let next = ExecutionNext { middlewares: rest, upstream: self.upstream };
                    mw.execute(ctx, req, next).await
                }
                None => (self.upstream)(ctx, req).await,
            }
        })
    }
}

/// Runs a fully assembled execution chain against a terminal upstream call.
pub struct ExecutionPipeline {
    middlewares: Vec<Arc<dyn ExecutionMiddleware>>,
}

impl ExecutionPipeline {
    pub fn new(middlewares: Vec<Arc<dyn ExecutionMiddleware>>) -> Self {
        Self { middlewares }
    }

    pub async fn run(
        &self,
        ctx: RequestContext,
        req: ExecutionRequest,
        upstream: &ExecutionUpstream,
    ) -> Result<ExecutionResult, ToolGateError> {
        let next = ExecutionNext::new(&self.middlewares, upstream);
        next.run(ctx, req).await
    }
}

// ---------------------------------------------------------------------------
// Method (inbound) surface
// ---------------------------------------------------------------------------

pub type MethodUpstream =
    dyn Fn(RequestContext, ToolGateRequest) -> BoxFuture<'static, Result<ToolGateResult, ToolGateError>>
        + Send
        + Sync;

/// One middleware in the MCP-method chain (logging, auth, RBAC, DLP, metrics,
/// rate-limit, caching, call-policy, audit, smart-recovery — spec.md §2).
pub trait MethodMiddleware: Send + Sync {
    fn handle<'a>(
        &'a self,
        ctx: RequestContext,
        req: ToolGateRequest,
        next: MethodNext<'a>,
    ) -> BoxFuture<'a, Result<ToolGateResult, ToolGateError>>;

    fn name(&self) -> &'static str;
}

pub struct MethodNext<'a> {
    middlewares: &'a [Arc<dyn MethodMiddleware>],
    upstream: &'a MethodUpstream,
}

impl<'a> MethodNext<'a> {
    pub fn new(middlewares: &'a [Arc<dyn MethodMiddleware>], upstream: &'a MethodUpstream) -> Self {
        Self { middlewares, upstream }
    }

    pub fn run(
        self,
        ctx: RequestContext,
        req: ToolGateRequest,
    ) -> BoxFuture<'a, Result<ToolGateResult, ToolGateError>> {
        Box::pin(async move {
            match self.middlewares.split_first() {
                Some((mw, rest)) => {
                    let next = MethodNext { middlewares: rest, upstream: self.upstream };
                    mw.handle(ctx, req, next).await
                }
                None => (self.upstream)(ctx, req).await,
            }
        })
    }
}

pub struct MethodPipeline {
    middlewares: Vec<Arc<dyn MethodMiddleware>>,
}

impl MethodPipeline {
    pub fn new(middlewares: Vec<Arc<dyn MethodMiddleware>>) -> Self {
        Self { middlewares }
    }

    pub async fn run(
        &self,
        ctx: RequestContext,
        req: ToolGateRequest,
        upstream: &MethodUpstream,
    ) -> Result<ToolGateResult, ToolGateError> {
        let next = MethodNext::new(&self.middlewares, upstream);
        next.run(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting {
        name: &'static str,
        counter: Arc<AtomicU32>,
    }

    impl ExecutionMiddleware for Counting {
        fn execute<'a>(
            &'a self,
            ctx: RequestContext,
            req: ExecutionRequest,
            next: ExecutionNext<'a>,
        ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            next.run(ctx, req)
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn chain_runs_outer_to_inner_then_upstream() {
        let order = Arc::new(std::sync::Mutex::new(Vec::<&'static str>::new()));

        struct Recording {
            name: &'static str,
            order: Arc<std::sync::Mutex<Vec<&'static str>>>,
        }
        impl ExecutionMiddleware for Recording {
            fn execute<'a>(
                &'a self,
                ctx: RequestContext,
                req: ExecutionRequest,
                next: ExecutionNext<'a>,
            ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
                self.order.lock().unwrap().push(self.name);
                Box::pin(async move { next.run(ctx, req).await })
            }
            fn name(&self) -> &'static str {
                self.name
            }
        }

        let mws: Vec<Arc<dyn ExecutionMiddleware>> = vec![
            Arc::new(Recording { name: "outer", order: order.clone() }),
            Arc::new(Recording { name: "inner", order: order.clone() }),
        ];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream: Box<ExecutionUpstream> = Box::new(|_ctx, _req| {
            Box::pin(async move { Ok(serde_json::json!({"ok": true})) })
        });
        let ctx = RequestContext::new("r1", "svc");
        let req = ExecutionRequest::new("svc.tool", bytes::Bytes::from_static(b"{}"));
        let result = pipeline.run(ctx, req, &*upstream).await.unwrap();
        assert_eq!(result, serde_json::json!({"ok": true}));
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn counting_middleware_invoked_once_per_call() {
        let counter = Arc::new(AtomicU32::new(0));
        let mws: Vec<Arc<dyn ExecutionMiddleware>> =
            vec![Arc::new(Counting { name: "c", counter: counter.clone() })];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream: Box<ExecutionUpstream> =
            Box::new(|_ctx, _req| Box::pin(async move { Ok(serde_json::Value::Null) }));
        let ctx = RequestContext::new("r1", "svc");
        let req = ExecutionRequest::new("svc.tool", bytes::Bytes::from_static(b"{}"));
        pipeline.run(ctx, req, &*upstream).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
