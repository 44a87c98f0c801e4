use bytes::Bytes;
use serde_json::Value;

/// Cache-control directive carried on a [`RequestContext`](crate::context::RequestContext).
///
/// Default is `Allow`. `DeleteCache` forces a miss on lookup and evicts the
/// key after the call completes (spec.md §4.3 step 2, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheControl {
    #[default]
    Allow,
    DeleteCache,
}

/// The unit flowing through the tool-execution chain (spec.md §3, §6).
///
/// `tool_name` is fully-qualified `service.tool`. `tool_inputs` is the
/// canonical-JSON argument bytes as received; `arguments` is the parsed form,
/// populated lazily by [`ExecutionRequest::arguments`] the first time a
/// middleware needs structured access (cache key derivation, cost estimation,
/// redaction). Only smart-recovery rewrites either field, via
/// [`ExecutionRequest::set_arguments`].
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub tool_name: String,
    tool_inputs: Bytes,
    arguments: Option<Value>,
    pub cache_control: CacheControl,
}

impl ExecutionRequest {
    pub fn new(tool_name: impl Into<String>, tool_inputs: Bytes) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_inputs,
            arguments: None,
            cache_control: CacheControl::Allow,
        }
    }

    /// The canonical JSON argument bytes exactly as received.
    pub fn tool_inputs(&self) -> &Bytes {
        &self.tool_inputs
    }

    /// The parsed argument map, parsing and caching on first access.
    ///
    /// Returns `None` if `tool_inputs` is not valid JSON (callers should treat
    /// that as an empty-object argument set for canonicalization purposes).
    pub fn arguments(&mut self) -> Option<&Value> {
        if self.arguments.is_none() {
            self.arguments = serde_json::from_slice(&self.tool_inputs).ok();
        }
        self.arguments.as_ref()
    }

    /// Rewrite both the raw and parsed arguments. Used exclusively by
    /// smart-recovery when retrying with LLM-repaired arguments.
    pub fn set_arguments(&mut self, value: Value) {
        self.tool_inputs = Bytes::from(serde_json::to_vec(&value).unwrap_or_default());
        self.arguments = Some(value);
    }
}

/// The opaque result of a tool execution, flowing back up the chain.
pub type ExecutionResult = Value;

/// A piece of tool-result / prompt-message / resource content.
///
/// Non-string content (`Image`, `Blob`) is never redacted (spec.md §4.2).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { data: String, mime_type: String },
    Blob { data: String, mime_type: String },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: ContentPart,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    pub content: ContentPart,
}

/// The inbound method surface, protocol-agnostic (spec.md §6, §9).
///
/// Modeled as a discriminated union so middlewares branch with an exhaustive
/// `match` instead of runtime type assertions.
#[derive(Debug, Clone)]
pub enum ToolGateRequest {
    ToolCall {
        tool_name: String,
        arguments: Bytes,
    },
    PromptGet {
        name: String,
        arguments: std::collections::BTreeMap<String, String>,
    },
    ResourceRead {
        uri: String,
    },
    ListTools,
    Initialize {
        client_info: Value,
    },
}

impl ToolGateRequest {
    pub fn method_name(&self) -> &'static str {
        match self {
            ToolGateRequest::ToolCall { .. } => "tools/call",
            ToolGateRequest::PromptGet { .. } => "prompts/get",
            ToolGateRequest::ResourceRead { .. } => "resources/read",
            ToolGateRequest::ListTools => "tools/list",
            ToolGateRequest::Initialize { .. } => "initialize",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ToolGateResult {
    ToolResult { content: Vec<ContentPart> },
    PromptMessages { messages: Vec<PromptMessage> },
    ResourceContents { contents: Vec<ResourceContent> },
    ToolList { tools: Vec<Value> },
    Initialized { server_info: Value },
}
