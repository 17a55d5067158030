//! Plain models shared with other modules; no serde or schema attributes here.

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub founded: i32,
    pub industry: String,
    pub description: String,
    pub headquarters: String,
    pub website: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i32,
    pub company_id: i32,
    /// Filled on reads that join the company.
    pub company_name: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub company_id: i32,
    pub name: String,
}

/// Only `name` is applied; `company_id` is validated but a department never
/// moves between companies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentUpdate {
    pub company_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: i32,
    pub department_id: i32,
    /// Filled on reads that join the department.
    pub department_name: Option<String>,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub salary: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub department_id: i32,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub salary: Decimal,
}

/// Full replacement of an employee's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub department_id: i32,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub salary: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyStatistics {
    pub total_employees: u64,
    pub departments: u64,
    pub founded_years: i32,
    pub projects_completed: i32,
    pub client_satisfaction: f64,
    pub annual_revenue: String,
}

/// Raw paging input as received from the caller, before validation.
/// Absent values take the configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

/// Free-text employee filters. Blank values mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub department: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub hire_date: Option<String>,
    pub salary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}
