use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{cache_key, CacheControl, ExecutionResult, RequestContext, ToolGateError};
use toolgate_embeddings::EmbeddingProvider;
use toolgate_vectorstore::{InMemoryVectorStore, SqliteVectorStore, VectorStore};

use crate::config::{CacheBackend, CacheConfigLayers, CacheStrategy, VectorBackend};
use crate::inflight::SingleFlightGroup;
use crate::store::{CacheStore, InMemoryCacheStore};

struct SemanticBackend {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

/// Caching middleware implementing the exact/semantic contract of spec.md
/// §4.3. Construct once per registry build; it owns its exact-cache store,
/// its per-service semantic backends, and its single-flight group.
pub struct CacheMiddleware {
    layers: CacheConfigLayers,
    exact_stores: DashMap<String, Arc<dyn CacheStore>>,
    semantic_backends: DashMap<String, Arc<SemanticBackend>>,
    single_flight: SingleFlightGroup,
}

impl CacheMiddleware {
    pub fn new(layers: CacheConfigLayers) -> Self {
        Self {
            layers,
            exact_stores: DashMap::new(),
            semantic_backends: DashMap::new(),
            single_flight: SingleFlightGroup::new(),
        }
    }

    async fn exact_store_for(
        &self,
        service_id: &str,
        backend: &CacheBackend,
    ) -> Result<Arc<dyn CacheStore>, ToolGateError> {
        if let Some(store) = self.exact_stores.get(service_id) {
            return Ok(store.clone());
        }

        let store: Arc<dyn CacheStore> = match backend {
            CacheBackend::Memory => Arc::new(InMemoryCacheStore::new()),
            CacheBackend::Redis { url } => {
                Arc::new(crate::redis_store::RedisCacheStore::connect(url).await?)
            }
        };

        self.exact_stores.insert(service_id.to_string(), store.clone());
        Ok(store)
    }

    fn semantic_backend_for(
        &self,
        service_id: &str,
        embedding_config: &serde_json::Value,
        vector_backend: &VectorBackend,
    ) -> Result<Arc<SemanticBackend>, ToolGateError> {
        if let Some(backend) = self.semantic_backends.get(service_id) {
            return Ok(backend.clone());
        }

        let provider = toolgate_embeddings::build_provider(embedding_config)?;
        let store: Arc<dyn VectorStore> = match vector_backend {
            VectorBackend::Memory { capacity } => Arc::new(InMemoryVectorStore::new(*capacity)),
            VectorBackend::Sqlite { path } => Arc::new(SqliteVectorStore::open(path)?),
        };

        let backend = Arc::new(SemanticBackend { provider, store });
        self.semantic_backends.insert(service_id.to_string(), backend.clone());
        Ok(backend)
    }
}

impl ExecutionMiddleware for CacheMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            let Some(cfg) = self.layers.resolve(&req.tool_name, &ctx.service_id).cloned() else {
                return next.run(ctx, req).await;
            };
            if !cfg.enabled {
                return next.run(ctx, req).await;
            }

            let delete_after = matches!(req.cache_control, CacheControl::DeleteCache);
            let key = cache_key(&req.tool_name, req.tool_inputs())?;
            let ttl = Duration::from_secs(cfg.ttl_secs);

            match cfg.strategy {
                CacheStrategy::Exact => {
                    let store = self.exact_store_for(&ctx.service_id, &cfg.backend).await?;

                    if delete_after {
                        let result = next.run(ctx, req).await;
                        store.remove(&key).await;
                        return result;
                    }

                    if let Some(cached) = store.get(&key).await {
                        if let Ok(value) = serde_json::from_slice::<ExecutionResult>(&cached) {
                            return Ok(value);
                        }
                    }

                    let result = self
                        .single_flight
                        .run(&key, async move { next.run(ctx, req).await })
                        .await?;

                    if let Ok(bytes) = serde_json::to_vec(&result) {
                        store.set(&key, Bytes::from(bytes), ttl).await;
                    }
                    Ok(result)
                }
                CacheStrategy::Semantic => {
                    let Some(embedding_config) = cfg.embedding.as_ref() else {
                        tracing::warn!(tool = %req.tool_name, "semantic cache enabled without embedding config, bypassing");
                        return next.run(ctx, req).await;
                    };

                    let backend = match self.semantic_backend_for(
                        &ctx.service_id,
                        embedding_config,
                        &cfg.vector_backend,
                    ) {
                        Ok(b) => b,
                        Err(e) => {
                            tracing::warn!(error = %e, "semantic cache backend unavailable, bypassing");
                            return next.run(ctx, req).await;
                        }
                    };

                    let text = String::from_utf8_lossy(req.tool_inputs()).into_owned();
                    let embedding = match backend.provider.embed(&text).await {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "embedding failed, bypassing semantic cache");
                            return next.run(ctx, req).await;
                        }
                    };

                    if let Some(hint) = backend.provider.dimension_hint() {
                        if embedding.len() != hint {
                            tracing::warn!(
                                expected = hint,
                                actual = embedding.len(),
                                "embedding provider returned a vector that doesn't match its own declared dimension, bypassing semantic cache"
                            );
                            return next.run(ctx, req).await;
                        }
                    }

                    if delete_after {
                        let result = next.run(ctx, req).await;
                        return result;
                    }

                    let hits = backend
                        .store
                        .search(&req.tool_name, &embedding, 1, cfg.similarity_threshold)
                        .await?;
                    if let Some(hit) = hits.into_iter().next() {
                        return Ok(hit.value);
                    }

                    let scope = req.tool_name.clone();
                    let result = next.run(ctx, req).await?;
                    let _ = backend.store.add(&scope, embedding, result.clone(), ttl).await;
                    Ok(result)
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "cache"
    }
}
