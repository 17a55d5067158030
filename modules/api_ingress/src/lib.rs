//! REST host module: owns the HTTP router, its middleware stack, the OpenAPI
//! document and the listening socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::{middleware::from_fn, routing::get, Router};
use dashmap::DashMap;
use http::{header, Method};
use modkit::api::{OpenApiRegistry, OperationSpec};
use modkit::{ModuleCtx, RegistryBuilder};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::field::Empty;

mod config;
mod model;
mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
use model::ComponentsRegistry;

pub const MODULE_NAME: &str = "api_ingress";

/// Add the ingress to `b`. `fallback_bind_addr` is used when the module
/// section has no `bind_addr`.
pub fn register(b: &mut RegistryBuilder, fallback_bind_addr: impl Into<String>) -> Arc<ApiIngress> {
    let module = Arc::new(ApiIngress::new(fallback_bind_addr));
    b.add(MODULE_NAME, &[], module.clone())
        .with_rest_host(module.clone())
        .with_stateful(module.clone());
    module
}

pub struct ApiIngress {
    fallback_bind_addr: String,
    config: ArcSwap<ApiIngressConfig>,
    components: ArcSwap<ComponentsRegistry>,
    operation_specs: DashMap<(Method, String), OperationSpec>,
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new("127.0.0.1:8087")
    }
}

impl ApiIngress {
    pub fn new(fallback_bind_addr: impl Into<String>) -> Self {
        Self {
            fallback_bind_addr: fallback_bind_addr.into(),
            config: ArcSwap::from_pointee(ApiIngressConfig::default()),
            components: ArcSwap::from_pointee(ComponentsRegistry::default()),
            operation_specs: DashMap::new(),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    pub fn config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    pub fn bind_addr(&self) -> String {
        self.config
            .load()
            .bind_addr
            .clone()
            .unwrap_or_else(|| self.fallback_bind_addr.clone())
    }

    /// Address actually bound once started (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn operation_count(&self) -> usize {
        self.operation_specs.len()
    }

    /// Current OpenAPI document as JSON.
    pub fn openapi_json(&self) -> Result<serde_json::Value> {
        let components = self.components.load();
        let mut specs: Vec<OperationSpec> =
            self.operation_specs.iter().map(|e| e.value().clone()).collect();
        specs.sort_by(|a, b| (&a.path, a.method.as_str()).cmp(&(&b.path, b.method.as_str())));
        let doc = openapi::build_document(&specs, &components)?;
        Ok(serde_json::to_value(doc)?)
    }

    /// Wrap `router` in the request pipeline. Outermost first: request id
    /// generation and propagation, trace span, request id extension, timeout,
    /// optional CORS, body limit.
    fn apply_middleware(&self, router: Router) -> Router {
        let cfg = self.config();
        let x_request_id = request_id::header();

        let router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        let router = if cfg.cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        let trace = TraceLayer::new_for_http()
            .make_span_with(|req: &http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = Empty,
                    status = Empty,
                    latency_ms = Empty
                )
            })
            .on_response(
                |res: &http::Response<_>, latency: Duration, span: &tracing::Span| {
                    span.record("status", res.status().as_u16());
                    span.record("latency_ms", latency.as_millis() as u64);
                    tracing::debug!("request completed");
                },
            );

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), request_id::MakeReqId))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(trace)
                .layer(from_fn(request_id::push_req_id_to_extensions))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs))),
        )
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg: ApiIngressConfig = ctx.module_config_or_default()?;
        tracing::debug!(?cfg, "api_ingress configured");
        self.config.store(Arc::new(cfg));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl modkit::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        let mut router = router;
        if self.config().enable_docs {
            tracing::info!(operations = self.operation_count(), "Emitting OpenAPI document");
            let doc = Arc::new(self.openapi_json()?);
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let doc = doc.clone();
                        async move { ([(header::CACHE_CONTROL, "no-store")], axum::Json((*doc).clone())) }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        let router = self.apply_middleware(router);
        *self.final_router.lock() = Some(router.clone());
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_operation(&self, spec: &OperationSpec) {
        let key = (spec.method.clone(), spec.path.clone());
        if self.operation_specs.contains_key(&key) {
            tracing::error!(
                method = %spec.method,
                path = %spec.path,
                "Duplicate (method, path) detected; ignoring subsequent registration"
            );
            return;
        }
        tracing::debug!(method = %spec.method, path = %spec.path, "Registered API operation");
        self.operation_specs.insert(key, spec.clone());
    }

    fn ensure_schema_raw(
        &self,
        name: &str,
        schemas: Vec<(String, utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>)>,
    ) -> String {
        self.components.rcu(|current| {
            let mut reg = (**current).clone();
            for (key, schema) in schemas.iter().cloned() {
                reg.register_schema(key, schema);
            }
            reg
        });
        name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl modkit::StatefulModule for ApiIngress {
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let addr = self.bind_addr();
        let router = self
            .final_router
            .lock()
            .take()
            .unwrap_or_else(|| self.apply_middleware(Router::new().route("/health", get(web::health_check))));

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on '{addr}'"))?;
        let local = listener.local_addr()?;
        *self.local_addr.lock() = Some(local);
        tracing::info!(%local, "HTTP server bound");

        let handle = tokio::spawn(async move {
            let shutdown = async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "HTTP server terminated with error");
            }
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let handle = self.server.lock().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(Duration::from_secs(30), handle).await.is_err() {
                tracing::warn!("HTTP server did not stop within 30s");
            }
        }
        Ok(())
    }
}
