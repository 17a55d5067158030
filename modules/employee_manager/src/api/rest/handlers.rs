use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
    Extension,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::api::rest::dto::{
    CompanyDto, CompanyStatisticsDto, DepartmentCreateReq, DepartmentDto,
    DepartmentUpdateReq, EmployeeCreateReq, EmployeeDto, EmployeePageDto, EmployeeSearchQuery,
    EmployeeUpdateReq, SalaryUpdateQuery,
};
use crate::api::rest::error::{map_domain_error, RequestMeta};
use crate::domain::service::Service;
use modkit::api::problem::ProblemResponse;

type ApiResult<T> = Result<T, ProblemResponse>;

// --- employees ---

pub async fn list_employees(
    Extension(svc): Extension<Arc<Service>>,
    meta: RequestMeta,
) -> ApiResult<Json<Vec<EmployeeDto>>> {
    match svc.list_employees().await {
        Ok(list) => Ok(Json(list.into_iter().map(EmployeeDto::from).collect())),
        Err(e) => {
            error!("Failed to list employees: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn search_employees(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<EmployeeSearchQuery>,
    meta: RequestMeta,
) -> ApiResult<Json<EmployeePageDto>> {
    debug!("Searching employees with query: {:?}", query);
    let (page, search, sort) = query.into_parts();

    match svc.search_employees(page, &search, &sort).await {
        Ok(page) => Ok(Json(EmployeePageDto::from(page))),
        Err(e) => {
            error!("Failed to search employees: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn employees_with_salary_above(
    Extension(svc): Extension<Arc<Service>>,
    Path(minimum_salary): Path<Decimal>,
    meta: RequestMeta,
) -> ApiResult<Json<Vec<EmployeeDto>>> {
    match svc.employees_with_salary_above(minimum_salary).await {
        Ok(list) => Ok(Json(list.into_iter().map(EmployeeDto::from).collect())),
        Err(e) => {
            error!("Failed to list employees above {}: {}", minimum_salary, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn get_employee(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i32>,
    meta: RequestMeta,
) -> ApiResult<Json<EmployeeDto>> {
    match svc.get_employee(id).await {
        Ok(e) => Ok(Json(EmployeeDto::from(e))),
        Err(e) => {
            error!("Failed to get employee {}: {}", id, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn create_employee(
    Extension(svc): Extension<Arc<Service>>,
    meta: RequestMeta,
    Json(req): Json<EmployeeCreateReq>,
) -> ApiResult<(StatusCode, Json<EmployeeDto>)> {
    info!("Creating employee: {:?}", req.full_name);

    match svc.create_employee(req.into()).await {
        Ok(e) => Ok((StatusCode::CREATED, Json(EmployeeDto::from(e)))),
        Err(e) => {
            error!("Failed to create employee: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn update_employee(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i32>,
    meta: RequestMeta,
    Json(req): Json<EmployeeUpdateReq>,
) -> ApiResult<Json<EmployeeDto>> {
    match svc.update_employee(id, req.into()).await {
        Ok(e) => Ok(Json(EmployeeDto::from(e))),
        Err(e) => {
            error!("Failed to update employee {}: {}", id, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn delete_employee(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i32>,
    meta: RequestMeta,
) -> ApiResult<StatusCode> {
    match svc.delete_employee(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete employee {}: {}", id, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn delete_employees_older_than(
    Extension(svc): Extension<Arc<Service>>,
    Path(maximum_age): Path<i32>,
    meta: RequestMeta,
) -> ApiResult<Json<u64>> {
    match svc.delete_employees_older_than(maximum_age).await {
        Ok(count) => Ok(Json(count)),
        Err(e) => {
            error!("Failed to delete employees older than {}: {}", maximum_age, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn update_salary_for_low_paid(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<SalaryUpdateQuery>,
    meta: RequestMeta,
) -> ApiResult<Json<u64>> {
    match svc
        .update_salary_for_low_paid(query.new_salary, query.maximum_current_salary)
        .await
    {
        Ok(count) => Ok(Json(count)),
        Err(e) => {
            error!("Failed to update salaries: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

// --- departments ---

pub async fn list_departments(
    Extension(svc): Extension<Arc<Service>>,
    meta: RequestMeta,
) -> ApiResult<Json<Vec<DepartmentDto>>> {
    match svc.list_departments().await {
        Ok(list) => Ok(Json(list.into_iter().map(DepartmentDto::from).collect())),
        Err(e) => {
            error!("Failed to list departments: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn get_department(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i32>,
    meta: RequestMeta,
) -> ApiResult<Json<DepartmentDto>> {
    match svc.get_department(id).await {
        Ok(d) => Ok(Json(DepartmentDto::from(d))),
        Err(e) => {
            error!("Failed to get department {}: {}", id, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn get_department_by_name(
    Extension(svc): Extension<Arc<Service>>,
    Path(name): Path<String>,
    meta: RequestMeta,
) -> ApiResult<Json<DepartmentDto>> {
    match svc.get_department_by_name(&name).await {
        Ok(d) => Ok(Json(DepartmentDto::from(d))),
        Err(e) => {
            error!("Failed to get department '{}': {}", name, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn create_department(
    Extension(svc): Extension<Arc<Service>>,
    meta: RequestMeta,
    Json(req): Json<DepartmentCreateReq>,
) -> ApiResult<(StatusCode, Json<DepartmentDto>)> {
    info!("Creating department: {:?}", req);

    match svc.create_department(req.into()).await {
        Ok(d) => Ok((StatusCode::CREATED, Json(DepartmentDto::from(d)))),
        Err(e) => {
            error!("Failed to create department: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn update_department(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i32>,
    meta: RequestMeta,
    Json(req): Json<DepartmentUpdateReq>,
) -> ApiResult<Json<DepartmentDto>> {
    match svc.update_department(id, req.into()).await {
        Ok(d) => Ok(Json(DepartmentDto::from(d))),
        Err(e) => {
            error!("Failed to update department {}: {}", id, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn delete_department(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i32>,
    meta: RequestMeta,
) -> ApiResult<StatusCode> {
    match svc.delete_department(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete department {}: {}", id, e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

// --- company ---

pub async fn get_company(
    Extension(svc): Extension<Arc<Service>>,
    meta: RequestMeta,
) -> ApiResult<Json<CompanyDto>> {
    match svc.get_company().await {
        Ok(c) => Ok(Json(CompanyDto::from(c))),
        Err(e) => {
            error!("Failed to get company: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}

pub async fn company_statistics(
    Extension(svc): Extension<Arc<Service>>,
    meta: RequestMeta,
) -> ApiResult<Json<CompanyStatisticsDto>> {
    match svc.company_statistics().await {
        Ok(s) => Ok(Json(CompanyStatisticsDto::from(s))),
        Err(e) => {
            error!("Failed to compute company statistics: {}", e);
            Err(map_domain_error(&e, &meta))
        }
    }
}
