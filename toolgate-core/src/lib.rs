//! Core types shared by every middleware in the toolgate pipeline: the
//! discriminated request/result surfaces, the ambient request context, the
//! crate-wide error enum, canonical-JSON cache keys, and the two chain
//! abstractions (`ExecutionMiddleware` around [`request::ExecutionRequest`],
//! `MethodMiddleware` around the inbound method surface) assembled by the
//! [`registry::Registry`].

pub mod canonical;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod request;
pub mod transport;

pub use canonical::{cache_key, canonical_json_bytes, canonical_json_value};
pub use context::RequestContext;
pub use error::{ConfigFieldError, ToolGateError};
pub use pipeline::{
    BoxFuture, ExecutionMiddleware, ExecutionNext, ExecutionPipeline, ExecutionUpstream,
    MethodMiddleware, MethodNext, MethodPipeline, MethodUpstream,
};
pub use registry::{BuiltChain, MiddlewareConfig, Registry};
pub use request::{
    CacheControl, ContentPart, ExecutionRequest, ExecutionResult, PromptMessage, ResourceContent,
    ToolGateRequest, ToolGateResult,
};
pub use transport::{HttpMiddleware, HttpNext, HttpRequest, HttpResponse, HttpUpstream};

pub mod prelude {
    pub use crate::{
        BoxFuture, CacheControl, ContentPart, ExecutionMiddleware, ExecutionNext, ExecutionPipeline,
        ExecutionRequest, ExecutionResult, ExecutionUpstream, MethodMiddleware, MethodNext,
        MethodPipeline, MethodUpstream, MiddlewareConfig, Registry, RequestContext, ToolGateError,
        ToolGateRequest, ToolGateResult,
    };
}
