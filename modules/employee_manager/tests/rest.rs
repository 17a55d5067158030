//! REST surface driven through `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use modkit::api::{OpenApiRegistry, OperationSpec};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use employee_manager::api::rest::routes::register_routes;
use employee_manager::infra::storage::seeder;

use common::{service, test_db};

#[derive(Default)]
struct RecordingRegistry {
    operations: Mutex<Vec<(String, String)>>,
}

impl OpenApiRegistry for RecordingRegistry {
    fn register_operation(&self, spec: &OperationSpec) {
        self.operations
            .lock()
            .push((spec.method.to_string(), spec.path.clone()));
    }

    fn ensure_schema_raw(
        &self,
        name: &str,
        _schemas: Vec<(String, utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>)>,
    ) -> String {
        name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct App {
    router: Router,
    registry: Arc<RecordingRegistry>,
    _db: common::TestDb,
}

async fn seeded_app() -> Result<App> {
    let db = test_db().await?;
    seeder::seed(&db.conn).await?;
    let registry = Arc::new(RecordingRegistry::default());
    let router = register_routes(Router::new(), registry.as_ref(), service(&db))?;
    Ok(App {
        router,
        registry,
        _db: db,
    })
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Result<Request<Body>> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-request-id", "test-req");
    Ok(match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    })
}

async fn send(app: &App, req: Request<Body>) -> Result<(StatusCode, Value)> {
    let resp = app.router.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

#[tokio::test]
async fn every_route_is_documented() -> Result<()> {
    let app = seeded_app().await?;
    let ops = app.registry.operations.lock().clone();
    assert_eq!(ops.len(), 17);
    assert!(ops.contains(&("GET".to_owned(), "/api/v1/employees/paginated".to_owned())));
    assert!(ops.contains(&("PUT".to_owned(), "/api/v1/employees/update-salary".to_owned())));
    assert!(ops.contains(&("GET".to_owned(), "/api/v1/company/statistics".to_owned())));
    Ok(())
}

#[tokio::test]
async fn create_employee_returns_201() -> Result<()> {
    let app = seeded_app().await?;
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/employees",
            Some(json!({
                "departmentId": 1,
                "fullName": "Nina Petrova",
                "birthDate": "1994-02-11",
                "hireDate": "2023-05-02",
                "salary": 61500.5
            })),
        )?,
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["employeeId"], 11);
    assert_eq!(body["departmentName"], "IT Department");
    assert_eq!(body["birthDate"], "1994-02-11");
    assert_eq!(body["salary"], 61500.5);
    Ok(())
}

#[tokio::test]
async fn invalid_create_is_a_problem_with_pointers() -> Result<()> {
    let app = seeded_app().await?;
    let resp = app
        .router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/employees",
            Some(json!({
                "departmentId": 1,
                "fullName": "Too Rich",
                "birthDate": "1990-01-01",
                "hireDate": "2020-01-01",
                "salary": 2000000.0
            })),
        )?)
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/problem+json")
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["title"], "Validation failed");
    assert_eq!(body["code"], "EMPLOYEE_MANAGER_VALIDATION");
    assert_eq!(body["errors"][0]["pointer"], "/salary");
    assert_eq!(body["instance"], "/api/v1/employees");
    assert_eq!(body["request_id"], "test-req");
    Ok(())
}

#[tokio::test]
async fn missing_employee_is_404() -> Result<()> {
    let app = seeded_app().await?;
    let (status, body) = send(&app, request(Method::GET, "/api/v1/employees/999", None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Employee with ID 999 not found");
    assert_eq!(body["type"], "https://errors.example.com/EMPLOYEE_MANAGER_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn paginated_search_over_http() -> Result<()> {
    let app = seeded_app().await?;
    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/employees/paginated?page=1&pageSize=2&department=it&sortField=salary&sortDirection=desc",
            None,
        )?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["hasNext"], true);
    assert_eq!(body["hasPrevious"], false);
    assert_eq!(body["data"][0]["fullName"], "Sarah Johnson");
    assert_eq!(body["data"][1]["fullName"], "Amanda Rodriguez");
    Ok(())
}

#[tokio::test]
async fn page_zero_is_rejected() -> Result<()> {
    let app = seeded_app().await?;
    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/employees/paginated?page=0", None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["pointer"], "/page");
    assert_eq!(body["errors"][0]["detail"], "Page number must be greater than 0");
    Ok(())
}

#[tokio::test]
async fn bulk_operations_return_bare_counts() -> Result<()> {
    let app = seeded_app().await?;

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/v1/employees/update-salary?newSalary=60000&maximumCurrentSalary=58000",
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(1));

    let (status, body) = send(
        &app,
        request(Method::DELETE, "/api/v1/employees/older-than/0", None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Maximum age must be positive");

    let (status, body) = send(
        &app,
        request(Method::DELETE, "/api/v1/employees/older-than/200", None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(0));
    Ok(())
}

#[tokio::test]
async fn department_routes() -> Result<()> {
    let app = seeded_app().await?;

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/departments/by-name/Legal%20Department", None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyName"], "Employee Manager Corp");

    let (status, _) = send(&app, request(Method::DELETE, "/api/v1/departments/1", None)?).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/departments",
            Some(json!({ "companyId": 1, "name": "Quality Assurance" })),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["departmentId"].as_i64().unwrap_or_default();

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/v1/departments/{id}"),
            Some(json!({ "companyId": 1, "name": "QA" })),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "QA");

    let (status, body) = send(
        &app,
        request(Method::DELETE, &format!("/api/v1/departments/{id}"), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    Ok(())
}

#[tokio::test]
async fn company_and_statistics() -> Result<()> {
    let app = seeded_app().await?;

    let (status, body) = send(&app, request(Method::GET, "/api/v1/company", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Employee Manager Corp");

    let (status, body) =
        send(&app, request(Method::GET, "/api/v1/company/statistics", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalEmployees"], 10);
    assert_eq!(body["departments"], 8);
    assert_eq!(body["projectsCompleted"], 45);
    assert_eq!(body["clientSatisfaction"], 98.5);
    Ok(())
}

#[tokio::test]
async fn delete_employee_returns_204() -> Result<()> {
    let app = seeded_app().await?;
    let (status, _) = send(&app, request(Method::DELETE, "/api/v1/employees/3", None)?).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request(Method::GET, "/api/v1/employees/3", None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
