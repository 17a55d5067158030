use async_trait::async_trait;

use crate::contract::error::EmployeeManagerError;
use crate::contract::model::{
    Company, CompanyStatistics, Department, Employee, NewEmployee, Page, PageRequest,
    SearchCriteria, SortSpec,
};

/// In-process API published in the `ClientHub` for other modules.
#[async_trait]
pub trait EmployeeManagerApi: Send + Sync {
    async fn get_employee(&self, id: i32) -> Result<Employee, EmployeeManagerError>;

    async fn search_employees(
        &self,
        page: PageRequest,
        search: SearchCriteria,
        sort: SortSpec,
    ) -> Result<Page<Employee>, EmployeeManagerError>;

    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, EmployeeManagerError>;

    async fn list_departments(&self) -> Result<Vec<Department>, EmployeeManagerError>;

    async fn get_company(&self) -> Result<Company, EmployeeManagerError>;

    async fn company_statistics(&self) -> Result<CompanyStatistics, EmployeeManagerError>;
}
