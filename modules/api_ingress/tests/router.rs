//! Router built through the REST host lifecycle: prepare, module routes, finalize.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Extension, Path},
    http::{Request, StatusCode},
    Json, Router,
};
use modkit::api::OperationBuilder;
use modkit::{
    ConfigProvider, Module, ModuleCtx, ModuleCtxBuilder, OpenApiRegistry, RestHostModule,
    RestfulModule,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;
use utoipa::ToSchema;

use api_ingress::request_id::XRequestId;
use api_ingress::ApiIngress;

#[derive(Serialize, ToSchema)]
struct Widget {
    id: i32,
    request_id: String,
}

async fn get_widget(
    Path(id): Path<i32>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<Widget> {
    Json(Widget { id, request_id })
}

struct Widgets;

impl RestfulModule for Widgets {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> Result<Router> {
        Ok(OperationBuilder::get("/api/v1/widgets/{id}")
            .operation_id("widgets.get")
            .tag("Widgets")
            .path_param("id", "Widget id", "integer")
            .handler(get_widget)
            .json_response_with_schema::<Widget>(openapi, 200, "Widget")
            .problem_response(openapi, 404, "Not found")
            .register(router, openapi))
    }
}

struct StaticConfig(serde_json::Value);

impl ConfigProvider for StaticConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

async fn build(config: serde_json::Value) -> Result<(Arc<ApiIngress>, Router)> {
    let ingress = Arc::new(ApiIngress::new("127.0.0.1:0"));
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(StaticConfig(config)))
        .build()
        .for_module(api_ingress::MODULE_NAME);
    ingress.init(&ctx).await?;

    let router = ingress.rest_prepare(&ctx, Router::new())?;
    let router = Widgets.register_rest(&ctx, router, ingress.as_registry())?;
    let router = ingress.rest_finalize(&ctx, router)?;
    Ok((ingress, router))
}

async fn body_json(resp: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn health_is_served() -> Result<()> {
    let (_, router) = build(serde_json::json!({})).await?;
    let resp = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_and_visible_to_handlers() -> Result<()> {
    let (_, router) = build(serde_json::json!({})).await?;
    let resp = router
        .oneshot(Request::builder().uri("/api/v1/widgets/7").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let header_id = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_default();
    assert!(!header_id.is_empty());

    let json = body_json(resp).await?;
    assert_eq!(json["id"], 7);
    assert_eq!(json["request_id"], header_id);
    Ok(())
}

#[tokio::test]
async fn incoming_request_id_is_preserved() -> Result<()> {
    let (_, router) = build(serde_json::json!({})).await?;
    let resp = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/widgets/1")
                .header("x-request-id", "abc-123")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
    Ok(())
}

#[tokio::test]
async fn openapi_lists_registered_operations() -> Result<()> {
    let (ingress, router) = build(serde_json::json!({})).await?;
    assert_eq!(ingress.operation_count(), 1);

    let resp = router
        .oneshot(Request::builder().uri("/openapi.json").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let doc = body_json(resp).await?;
    let op = &doc["paths"]["/api/v1/widgets/{id}"]["get"];
    assert_eq!(op["operationId"], "widgets.get");
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/Widget"
    );
    assert!(doc["components"]["schemas"].get("Problem").is_some());
    Ok(())
}

#[tokio::test]
async fn docs_can_be_disabled() -> Result<()> {
    let (_, router) = build(serde_json::json!({ "api_ingress": { "enable_docs": false } })).await?;
    let resp = router
        .clone()
        .oneshot(Request::builder().uri("/openapi.json").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = router
        .oneshot(Request::builder().uri("/docs").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn bind_addr_falls_back_unless_configured() -> Result<()> {
    let (ingress, _) = build(serde_json::json!({})).await?;
    assert_eq!(ingress.bind_addr(), "127.0.0.1:0");

    let (ingress, _) =
        build(serde_json::json!({ "api_ingress": { "bind_addr": "0.0.0.0:9000" } })).await?;
    assert_eq!(ingress.bind_addr(), "0.0.0.0:9000");
    Ok(())
}

#[tokio::test]
async fn serves_over_tcp_until_cancelled() -> Result<()> {
    use modkit::StatefulModule;

    let (ingress, _) = build(serde_json::json!({})).await?;
    let cancel = CancellationToken::new();
    ingress.start(cancel.clone()).await?;
    assert!(ingress.local_addr().is_some());

    cancel.cancel();
    ingress.stop(cancel).await?;
    Ok(())
}
