use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

type Op = OperationBuilder<Missing, Missing, ()>;

pub const API_PREFIX: &str = "/api/v1";

fn path(rest: &str) -> String {
    format!("{API_PREFIX}{rest}")
}

pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    let router = register_employee_routes(router, openapi);
    let router = register_department_routes(router, openapi);
    let router = register_company_routes(router, openapi);
    Ok(router.layer(Extension(service)))
}

fn register_employee_routes(mut router: Router, openapi: &dyn OpenApiRegistry) -> Router {
    // GET /employees
    router = Op::get(path("/employees"))
        .operation_id("employee_manager.list_employees")
        .summary("List all employees")
        .description("Every employee with the name of their department")
        .tag("employees")
        .handler(handlers::list_employees)
        .json_list_response::<dto::EmployeeDto>(openapi, 200, "All employees")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /employees/paginated
    router = Op::get(path("/employees/paginated"))
        .operation_id("employee_manager.search_employees")
        .summary("Search employees page by page")
        .description(
            "Filters are ANDed: department and fullName are case-insensitive substrings, \
             birthDate and hireDate exact ISO dates, salary a prefix of the two-decimal amount. \
             sortField is one of departmentName, fullName, birthDate, hireDate, salary; \
             anything else sorts by id.",
        )
        .tag("employees")
        .query_param("page", false, "1-based page number (default 1)", "integer")
        .query_param("pageSize", false, "Rows per page, 1..=50 (default 10)", "integer")
        .query_param("department", false, "Department name contains", "string")
        .query_param("fullName", false, "Full name contains", "string")
        .query_param("birthDate", false, "Exact birth date (YYYY-MM-DD)", "string")
        .query_param("hireDate", false, "Exact hire date (YYYY-MM-DD)", "string")
        .query_param("salary", false, "Salary starts with", "string")
        .query_param("sortField", false, "Sort field", "string")
        .query_param("sortDirection", false, "asc or desc", "string")
        .handler(handlers::search_employees)
        .json_response_with_schema::<dto::EmployeePageDto>(openapi, 200, "One page of employees")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /employees/salary-above/{minimumSalary}
    router = Op::get(path("/employees/salary-above/{minimumSalary}"))
        .operation_id("employee_manager.employees_with_salary_above")
        .summary("Employees earning more than an amount")
        .tag("employees")
        .path_param("minimumSalary", "Exclusive lower bound", "number")
        .handler(handlers::employees_with_salary_above)
        .json_list_response::<dto::EmployeeDto>(openapi, 200, "Matching employees")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /employees/{id}
    router = Op::get(path("/employees/{id}"))
        .operation_id("employee_manager.get_employee")
        .summary("Get employee by ID")
        .tag("employees")
        .path_param("id", "Employee ID", "integer")
        .handler(handlers::get_employee)
        .json_response_with_schema::<dto::EmployeeDto>(openapi, 200, "Employee found")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /employees
    router = Op::post(path("/employees"))
        .operation_id("employee_manager.create_employee")
        .summary("Create an employee")
        .tag("employees")
        .json_request::<dto::EmployeeCreateReq>(openapi, "New employee")
        .handler(handlers::create_employee)
        .json_response_with_schema::<dto::EmployeeDto>(openapi, 201, "Created employee")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // PUT /employees/update-salary
    router = Op::put(path("/employees/update-salary"))
        .operation_id("employee_manager.update_salary_for_low_paid")
        .summary("Raise every salary below a threshold")
        .description("Sets salary to newSalary wherever it is below maximumCurrentSalary")
        .tag("employees")
        .query_param("newSalary", true, "Salary to apply", "number")
        .query_param("maximumCurrentSalary", true, "Exclusive threshold", "number")
        .handler(handlers::update_salary_for_low_paid)
        .json_response(200, "Number of updated employees")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // PUT /employees/{id}
    router = Op::put(path("/employees/{id}"))
        .operation_id("employee_manager.update_employee")
        .summary("Replace an employee")
        .tag("employees")
        .path_param("id", "Employee ID", "integer")
        .json_request::<dto::EmployeeUpdateReq>(openapi, "Employee data")
        .handler(handlers::update_employee)
        .json_response_with_schema::<dto::EmployeeDto>(openapi, 200, "Updated employee")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // DELETE /employees/older-than/{maximumAge}
    router = Op::delete(path("/employees/older-than/{maximumAge}"))
        .operation_id("employee_manager.delete_employees_older_than")
        .summary("Delete employees older than an age")
        .description("Age is the current year minus the birth year")
        .tag("employees")
        .path_param("maximumAge", "Oldest age to keep", "integer")
        .handler(handlers::delete_employees_older_than)
        .json_response(200, "Number of deleted employees")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // DELETE /employees/{id}
    router = Op::delete(path("/employees/{id}"))
        .operation_id("employee_manager.delete_employee")
        .summary("Delete an employee")
        .tag("employees")
        .path_param("id", "Employee ID", "integer")
        .handler(handlers::delete_employee)
        .no_content_response("Deleted")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router
}

fn register_department_routes(mut router: Router, openapi: &dyn OpenApiRegistry) -> Router {
    router = Op::get(path("/departments"))
        .operation_id("employee_manager.list_departments")
        .summary("List all departments")
        .tag("departments")
        .handler(handlers::list_departments)
        .json_list_response::<dto::DepartmentDto>(openapi, 200, "All departments")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = Op::get(path("/departments/by-name/{name}"))
        .operation_id("employee_manager.get_department_by_name")
        .summary("Get department by exact name")
        .tag("departments")
        .path_param("name", "Department name", "string")
        .handler(handlers::get_department_by_name)
        .json_response_with_schema::<dto::DepartmentDto>(openapi, 200, "Department found")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = Op::get(path("/departments/{id}"))
        .operation_id("employee_manager.get_department")
        .summary("Get department by ID")
        .tag("departments")
        .path_param("id", "Department ID", "integer")
        .handler(handlers::get_department)
        .json_response_with_schema::<dto::DepartmentDto>(openapi, 200, "Department found")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = Op::post(path("/departments"))
        .operation_id("employee_manager.create_department")
        .summary("Create a department")
        .tag("departments")
        .json_request::<dto::DepartmentCreateReq>(openapi, "New department")
        .handler(handlers::create_department)
        .json_response_with_schema::<dto::DepartmentDto>(openapi, 201, "Created department")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 409, "Conflict")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = Op::put(path("/departments/{id}"))
        .operation_id("employee_manager.update_department")
        .summary("Rename a department")
        .tag("departments")
        .path_param("id", "Department ID", "integer")
        .json_request::<dto::DepartmentUpdateReq>(openapi, "Department data")
        .handler(handlers::update_department)
        .json_response_with_schema::<dto::DepartmentDto>(openapi, 200, "Updated department")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 409, "Conflict")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = Op::delete(path("/departments/{id}"))
        .operation_id("employee_manager.delete_department")
        .summary("Delete a department without employees")
        .tag("departments")
        .path_param("id", "Department ID", "integer")
        .handler(handlers::delete_department)
        .no_content_response("Deleted")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 409, "Conflict")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router
}

fn register_company_routes(mut router: Router, openapi: &dyn OpenApiRegistry) -> Router {
    router = Op::get(path("/company"))
        .operation_id("employee_manager.get_company")
        .summary("Company profile")
        .tag("company")
        .handler(handlers::get_company)
        .json_response_with_schema::<dto::CompanyDto>(openapi, 200, "The company")
        .problem_response(openapi, 400, "No company configured")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = Op::get(path("/company/statistics"))
        .operation_id("employee_manager.company_statistics")
        .summary("Company statistics")
        .tag("company")
        .handler(handlers::company_statistics)
        .json_response_with_schema::<dto::CompanyStatisticsDto>(openapi, 200, "Statistics")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router
}
