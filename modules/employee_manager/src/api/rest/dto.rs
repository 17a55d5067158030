//! Wire types. JSON is camelCase, dates are `YYYY-MM-DD` and salaries are
//! JSON numbers with two decimals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{
    Company, CompanyStatistics, Department, DepartmentUpdate, Employee, EmployeeUpdate,
    NewDepartment, NewEmployee, Page, PageRequest, SearchCriteria, SortSpec,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub employee_id: i32,
    pub department_id: i32,
    pub department_name: Option<String>,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 75000.0)]
    pub salary: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreateReq {
    pub department_id: i32,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub salary: Decimal,
}

/// Full replacement of an employee, department included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdateReq {
    pub department_id: i32,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub salary: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDto {
    pub department_id: i32,
    pub company_id: i32,
    pub company_name: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCreateReq {
    pub company_id: i32,
    pub name: String,
}

/// Only `name` is applied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentUpdateReq {
    pub company_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    pub company_id: i32,
    pub name: String,
    pub founded: i32,
    pub industry: String,
    pub description: String,
    pub headquarters: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStatisticsDto {
    pub total_employees: u64,
    pub departments: u64,
    pub founded_years: i32,
    pub projects_completed: i32,
    pub client_satisfaction: f64,
    pub annual_revenue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePageDto {
    pub data: Vec<EmployeeDto>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// `GET /employees/paginated` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSearchQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub department: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub hire_date: Option<String>,
    pub salary: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

/// `PUT /employees/update-salary` query string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryUpdateQuery {
    pub new_salary: Decimal,
    pub maximum_current_salary: Decimal,
}

impl From<Employee> for EmployeeDto {
    fn from(e: Employee) -> Self {
        Self {
            employee_id: e.id,
            department_id: e.department_id,
            department_name: e.department_name,
            full_name: e.full_name,
            birth_date: e.birth_date,
            hire_date: e.hire_date,
            salary: e.salary,
        }
    }
}

impl From<EmployeeCreateReq> for NewEmployee {
    fn from(r: EmployeeCreateReq) -> Self {
        Self {
            department_id: r.department_id,
            full_name: r.full_name,
            birth_date: r.birth_date,
            hire_date: r.hire_date,
            salary: r.salary,
        }
    }
}

impl From<EmployeeUpdateReq> for EmployeeUpdate {
    fn from(r: EmployeeUpdateReq) -> Self {
        Self {
            department_id: r.department_id,
            full_name: r.full_name,
            birth_date: r.birth_date,
            hire_date: r.hire_date,
            salary: r.salary,
        }
    }
}

impl From<Department> for DepartmentDto {
    fn from(d: Department) -> Self {
        Self {
            department_id: d.id,
            company_id: d.company_id,
            company_name: d.company_name,
            name: d.name,
        }
    }
}

impl From<DepartmentCreateReq> for NewDepartment {
    fn from(r: DepartmentCreateReq) -> Self {
        Self {
            company_id: r.company_id,
            name: r.name,
        }
    }
}

impl From<DepartmentUpdateReq> for DepartmentUpdate {
    fn from(r: DepartmentUpdateReq) -> Self {
        Self {
            company_id: r.company_id,
            name: r.name,
        }
    }
}

impl From<Company> for CompanyDto {
    fn from(c: Company) -> Self {
        Self {
            company_id: c.id,
            name: c.name,
            founded: c.founded,
            industry: c.industry,
            description: c.description,
            headquarters: c.headquarters,
            website: c.website,
        }
    }
}

impl From<CompanyStatistics> for CompanyStatisticsDto {
    fn from(s: CompanyStatistics) -> Self {
        Self {
            total_employees: s.total_employees,
            departments: s.departments,
            founded_years: s.founded_years,
            projects_completed: s.projects_completed,
            client_satisfaction: s.client_satisfaction,
            annual_revenue: s.annual_revenue,
        }
    }
}

impl From<Page<Employee>> for EmployeePageDto {
    fn from(p: Page<Employee>) -> Self {
        Self {
            data: p.data.into_iter().map(EmployeeDto::from).collect(),
            page: p.page,
            page_size: p.page_size,
            total_items: p.total_items,
            total_pages: p.total_pages,
            has_next: p.has_next,
            has_previous: p.has_previous,
        }
    }
}

impl EmployeeSearchQuery {
    pub fn into_parts(self) -> (PageRequest, SearchCriteria, SortSpec) {
        (
            PageRequest {
                page: self.page,
                page_size: self.page_size,
            },
            SearchCriteria {
                department: self.department,
                full_name: self.full_name,
                birth_date: self.birth_date,
                hire_date: self.hire_date,
                salary: self.salary,
            },
            SortSpec {
                field: self.sort_field,
                direction: self.sort_direction,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_json_is_camel_case_with_numeric_salary() {
        let dto = EmployeeDto::from(Employee {
            id: 3,
            department_id: 1,
            department_name: Some("IT Department".into()),
            full_name: "John Smith".into(),
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 15).unwrap(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            salary: Decimal::new(7_500_050, 2),
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["employeeId"], 3);
        assert_eq!(json["departmentName"], "IT Department");
        assert_eq!(json["birthDate"], "1985-03-15");
        assert_eq!(json["salary"], 75000.5);
    }

    #[test]
    fn create_request_accepts_integer_salaries() {
        let req: EmployeeCreateReq = serde_json::from_value(serde_json::json!({
            "departmentId": 2,
            "fullName": "Ada Lovelace",
            "birthDate": "1990-12-10",
            "hireDate": "2020-01-01",
            "salary": 50000
        }))
        .unwrap();
        assert_eq!(req.salary, Decimal::from(50_000));
    }
}
