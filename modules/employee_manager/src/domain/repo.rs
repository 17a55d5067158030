//! Storage ports used by the service. Implemented over SeaORM in `infra::storage`.

use async_trait::async_trait;
use chrono::NaiveDate;
use modkit_db::PageWindow;
use rust_decimal::Decimal;

use crate::contract::model::{
    Company, Department, Employee, EmployeeUpdate, NewDepartment, NewEmployee,
};

/// Normalized employee search filter. Every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Case-insensitive substring of the department name.
    pub department: Option<String>,
    /// Case-insensitive substring of the full name.
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hire_date: Option<NaiveDate>,
    /// Prefix of the salary rendered with two decimals, e.g. `"75"` matches `75000.00`.
    pub salary_prefix: Option<String>,
}

impl EmployeeFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    DepartmentName,
    FullName,
    BirthDate,
    HireDate,
    Salary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Resolved ordering. Rows with equal keys are ordered by employee id in
/// the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmployeeSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for EmployeeSort {
    fn default() -> Self {
        Self {
            key: SortKey::Id,
            direction: SortDirection::Asc,
        }
    }
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list_all(&self) -> anyhow::Result<Vec<Employee>>;

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<Employee>>;

    /// Employees with `salary > minimum`, ordered by salary descending.
    async fn list_salary_above(&self, minimum: Decimal) -> anyhow::Result<Vec<Employee>>;

    async fn count_matching(&self, filter: &EmployeeFilter) -> anyhow::Result<u64>;

    async fn fetch_page(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        window: PageWindow,
    ) -> anyhow::Result<Vec<Employee>>;

    /// Returns the new employee id.
    async fn insert(&self, new: NewEmployee) -> anyhow::Result<i32>;

    /// `false` when no row has `id`.
    async fn update_by_id(&self, id: i32, update: EmployeeUpdate) -> anyhow::Result<bool>;

    async fn delete_by_id(&self, id: i32) -> anyhow::Result<bool>;

    /// Delete every employee born strictly before `cutoff`, in one transaction.
    async fn delete_born_before(&self, cutoff: NaiveDate) -> anyhow::Result<u64>;

    /// Set `salary = new_salary` wherever `salary < threshold`, in one transaction.
    async fn raise_salaries_below(
        &self,
        threshold: Decimal,
        new_salary: Decimal,
    ) -> anyhow::Result<u64>;

    async fn count(&self) -> anyhow::Result<u64>;

    async fn count_in_department(&self, department_id: i32) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn list_all(&self) -> anyhow::Result<Vec<Department>>;

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<Department>>;

    /// Exact name match; the first department by id wins when several
    /// companies share a name.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Department>>;

    async fn exists(&self, id: i32) -> anyhow::Result<bool>;

    /// Whether `company_id` already has a department called `name`, ignoring
    /// the department `except`.
    async fn name_taken(
        &self,
        company_id: i32,
        name: &str,
        except: Option<i32>,
    ) -> anyhow::Result<bool>;

    async fn insert(&self, new: NewDepartment) -> anyhow::Result<i32>;

    async fn rename(&self, id: i32, name: &str) -> anyhow::Result<bool>;

    async fn delete_by_id(&self, id: i32) -> anyhow::Result<bool>;

    async fn count(&self) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// The company with the lowest id.
    async fn first(&self) -> anyhow::Result<Option<Company>>;

    async fn exists(&self, id: i32) -> anyhow::Result<bool>;
}
