//! Pipeline registry (spec.md §4.1, C13).
//!
//! Factories are registered once at process start (and again on reload);
//! `build` is called per reload to assemble the priority-ordered chain from a
//! list of configured middlewares. Registration is rare, lookups during
//! `build` are rare too, but the registry may be read from multiple reload
//! tasks concurrently, hence the `RwLock`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::ToolGateError;
use crate::pipeline::{ExecutionMiddleware, MethodMiddleware};
use crate::transport::HttpMiddleware;

type HttpFactory = Arc<dyn Fn(&Value) -> Result<Arc<dyn HttpMiddleware>, ToolGateError> + Send + Sync>;
type MethodFactory = Arc<dyn Fn(&Value) -> Result<Arc<dyn MethodMiddleware>, ToolGateError> + Send + Sync>;
type ExecutionFactory = Arc<dyn Fn(&Value) -> Result<Arc<dyn ExecutionMiddleware>, ToolGateError> + Send + Sync>;

#[derive(Clone)]
enum Factory {
    Http(HttpFactory),
    Method(MethodFactory),
    Execution(ExecutionFactory),
}

/// `(name, priority, disabled, factory)` — spec.md §3 `RegistryEntry`.
#[derive(Clone)]
struct Entry {
    priority: i32,
    disabled: bool,
    factory: Factory,
}

/// Per-entry activation coming from the surrounding server's middleware
/// configuration: which registered middlewares to instantiate, with what
/// blob, in what (optionally overridden) order.
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    pub name: String,
    pub disabled: bool,
    pub priority_override: Option<i32>,
    pub config: Value,
}

impl MiddlewareConfig {
    pub fn enabled(name: impl Into<String>, config: Value) -> Self {
        Self { name: name.into(), disabled: false, priority_override: None, config }
    }
}

pub struct BuiltChain {
    pub http: Vec<Arc<dyn HttpMiddleware>>,
    pub method: Vec<Arc<dyn MethodMiddleware>>,
    pub execution: Vec<Arc<dyn ExecutionMiddleware>>,
}

/// Concurrent-safe registry of middleware factories (spec.md §5: readers ≫
/// writers, registration at process start and on reload).
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    pub fn register_http(
        &self,
        name: impl Into<String>,
        priority: i32,
        factory: impl Fn(&Value) -> Result<Arc<dyn HttpMiddleware>, ToolGateError> + Send + Sync + 'static,
    ) {
        self.entries.write().unwrap().insert(
            name.into(),
            Entry { priority, disabled: false, factory: Factory::Http(Arc::new(factory)) },
        );
    }

    pub fn register_method(
        &self,
        name: impl Into<String>,
        priority: i32,
        factory: impl Fn(&Value) -> Result<Arc<dyn MethodMiddleware>, ToolGateError> + Send + Sync + 'static,
    ) {
        self.entries.write().unwrap().insert(
            name.into(),
            Entry { priority, disabled: false, factory: Factory::Method(Arc::new(factory)) },
        );
    }

    pub fn register_execution(
        &self,
        name: impl Into<String>,
        priority: i32,
        factory: impl Fn(&Value) -> Result<Arc<dyn ExecutionMiddleware>, ToolGateError> + Send + Sync + 'static,
    ) {
        self.entries.write().unwrap().insert(
            name.into(),
            Entry { priority, disabled: false, factory: Factory::Execution(Arc::new(factory)) },
        );
    }

    /// Disable a registered factory by name so `build` skips it even if a
    /// caller configures it (a hard kill-switch independent of the per-call
    /// `MiddlewareConfig::disabled`).
    pub fn disable(&self, name: &str) {
        if let Some(entry) = self.entries.write().unwrap().get_mut(name) {
            entry.disabled = true;
        }
    }

    /// Assemble the ordered chain: filter disabled entries, select entries
    /// whose name matches a configured middleware, stable-sort by ascending
    /// priority (outermost first, lower priority wraps later / more inner),
    /// instantiate each via its factory. A factory error is fatal for that
    /// middleware and aborts the whole build (spec.md §4.1).
    pub fn build(&self, configs: &[MiddlewareConfig]) -> Result<BuiltChain, ToolGateError> {
        let entries = self.entries.read().unwrap();

        struct Selected<'a> {
            priority: i32,
            config: &'a MiddlewareConfig,
            entry: &'a Entry,
        }

        let mut selected: Vec<Selected> = Vec::new();
        for config in configs {
            if config.disabled {
                continue;
            }
            let Some(entry) = entries.get(&config.name) else {
                return Err(ToolGateError::ConfigInvalid(format!(
                    "no middleware registered under name '{}'",
                    config.name
                )));
            };
            if entry.disabled {
                continue;
            }
            let priority = config.priority_override.unwrap_or(entry.priority);
            selected.push(Selected { priority, config, entry });
        }

        // Stable sort: entries with equal priority keep their configured
        // relative order.
        selected.sort_by_key(|s| s.priority);

        let mut http = Vec::new();
        let mut method = Vec::new();
        let mut execution = Vec::new();
        for s in selected {
            match &s.entry.factory {
                Factory::Http(f) => {
                    let mw = f(&s.config.config).map_err(|e| {
                        ToolGateError::ConfigInvalid(format!("{}: {e}", s.config.name))
                    })?;
                    http.push(mw);
                }
                Factory::Method(f) => {
                    let mw = f(&s.config.config).map_err(|e| {
                        ToolGateError::ConfigInvalid(format!("{}: {e}", s.config.name))
                    })?;
                    method.push(mw);
                }
                Factory::Execution(f) => {
                    let mw = f(&s.config.config).map_err(|e| {
                        ToolGateError::ConfigInvalid(format!("{}: {e}", s.config.name))
                    })?;
                    execution.push(mw);
                }
            }
        }

        Ok(BuiltChain { http, method, execution })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::pipeline::{BoxFuture, MethodNext};
    use crate::request::{ToolGateRequest, ToolGateResult};

    struct Noop(&'static str);
    impl MethodMiddleware for Noop {
        fn handle<'a>(
            &'a self,
            ctx: RequestContext,
            req: ToolGateRequest,
            next: MethodNext<'a>,
        ) -> BoxFuture<'a, Result<ToolGateResult, ToolGateError>> {
            next.run(ctx, req)
        }
        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn build_orders_by_ascending_priority_stably() {
        let registry = Registry::new();
        registry.register_method("b", 20, |_| Ok(Arc::new(Noop("b")) as Arc<dyn MethodMiddleware>));
        registry.register_method("a", 10, |_| Ok(Arc::new(Noop("a")) as Arc<dyn MethodMiddleware>));
        registry.register_method("c", 10, |_| Ok(Arc::new(Noop("c")) as Arc<dyn MethodMiddleware>));

        let configs = vec![
            MiddlewareConfig::enabled("b", Value::Null),
            MiddlewareConfig::enabled("a", Value::Null),
            MiddlewareConfig::enabled("c", Value::Null),
        ];
        let chain = registry.build(&configs).unwrap();
        let names: Vec<&str> = chain.method.iter().map(|m| m.name()).collect();
        // a and c share priority 10; their relative order (a before c, as
        // configured) is preserved by the stable sort. b (priority 20) sorts last.
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[test]
    fn build_skips_disabled_configs() {
        let registry = Registry::new();
        registry.register_method("a", 10, |_| Ok(Arc::new(Noop("a")) as Arc<dyn MethodMiddleware>));
        let configs = vec![MiddlewareConfig {
            name: "a".into(),
            disabled: true,
            priority_override: None,
            config: Value::Null,
        }];
        let chain = registry.build(&configs).unwrap();
        assert!(chain.method.is_empty());
    }

    #[test]
    fn build_errors_on_unknown_middleware_name() {
        let registry = Registry::new();
        let configs = vec![MiddlewareConfig::enabled("missing", Value::Null)];
        let err = registry.build(&configs).unwrap_err();
        assert!(matches!(err, ToolGateError::ConfigInvalid(_)));
    }

    #[test]
    fn priority_override_changes_effective_order() {
        let registry = Registry::new();
        registry.register_method("a", 10, |_| Ok(Arc::new(Noop("a")) as Arc<dyn MethodMiddleware>));
        registry.register_method("b", 20, |_| Ok(Arc::new(Noop("b")) as Arc<dyn MethodMiddleware>));
        let configs = vec![
            MiddlewareConfig::enabled("a", Value::Null),
            MiddlewareConfig {
                name: "b".into(),
                disabled: false,
                priority_override: Some(1),
                config: Value::Null,
            },
        ];
        let chain = registry.build(&configs).unwrap();
        let names: Vec<&str> = chain.method.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
