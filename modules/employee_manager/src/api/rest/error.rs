use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use modkit::api::problem::{Problem, ProblemResponse, ValidationError};

use crate::domain::error::DomainError;

/// Path and request id of the current request, attached to every problem.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub path: String,
    pub request_id: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(Self {
            path: parts.uri.path().to_owned(),
            request_id,
        })
    }
}

fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    meta: &RequestMeta,
) -> Problem {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{code}"))
        .with_code(code)
        .with_instance(meta.path.clone());
    match &meta.request_id {
        Some(id) => problem.with_request_id(id.clone()),
        None => problem,
    }
}

/// Map a domain error to an RFC 9457 response.
pub fn map_domain_error(e: &DomainError, meta: &RequestMeta) -> ProblemResponse {
    let problem = match e {
        DomainError::Validation { errors } => from_parts(
            StatusCode::BAD_REQUEST,
            "EMPLOYEE_MANAGER_VALIDATION",
            "Validation failed",
            "One or more validation errors occurred",
            meta,
        )
        .with_errors(
            errors
                .iter()
                .map(|v| ValidationError {
                    detail: v.message.clone(),
                    pointer: format!("/{}", v.field),
                })
                .collect(),
        ),
        DomainError::InvalidArgument { message } => from_parts(
            StatusCode::BAD_REQUEST,
            "EMPLOYEE_MANAGER_INVALID_ARGUMENT",
            "Invalid argument",
            message.clone(),
            meta,
        ),
        DomainError::InvalidOperation { message } => from_parts(
            StatusCode::BAD_REQUEST,
            "EMPLOYEE_MANAGER_INVALID_OPERATION",
            "Invalid operation",
            message.clone(),
            meta,
        ),
        DomainError::NotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "EMPLOYEE_MANAGER_NOT_FOUND",
            "Not found",
            e.to_string(),
            meta,
        ),
        DomainError::Conflict { message } => from_parts(
            StatusCode::CONFLICT,
            "EMPLOYEE_MANAGER_CONFLICT",
            "Conflict",
            message.clone(),
            meta,
        ),
        DomainError::Database { .. } => {
            // details stay in the log
            tracing::error!(error = ?e, path = %meta.path, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "EMPLOYEE_MANAGER_INTERNAL",
                "Internal server error",
                "An unexpected error occurred",
                meta,
            )
        }
    };
    ProblemResponse(problem)
}
