use std::sync::Arc;

use async_trait::async_trait;

use crate::contract::{
    client::EmployeeManagerApi,
    error::EmployeeManagerError,
    model::{
        Company, CompanyStatistics, Department, Employee, NewEmployee, Page, PageRequest,
        SearchCriteria, SortSpec,
    },
};
use crate::domain::{error::DomainError, service::Service};

/// In-process `EmployeeManagerApi` that delegates to the domain service.
pub struct EmployeeManagerLocalClient {
    service: Arc<Service>,
}

impl EmployeeManagerLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EmployeeManagerApi for EmployeeManagerLocalClient {
    async fn get_employee(&self, id: i32) -> Result<Employee, EmployeeManagerError> {
        self.service.get_employee(id).await.map_err(Into::into)
    }

    async fn search_employees(
        &self,
        page: PageRequest,
        search: SearchCriteria,
        sort: SortSpec,
    ) -> Result<Page<Employee>, EmployeeManagerError> {
        self.service
            .search_employees(page, &search, &sort)
            .await
            .map_err(Into::into)
    }

    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, EmployeeManagerError> {
        self.service.create_employee(new).await.map_err(Into::into)
    }

    async fn list_departments(&self) -> Result<Vec<Department>, EmployeeManagerError> {
        self.service.list_departments().await.map_err(Into::into)
    }

    async fn get_company(&self) -> Result<Company, EmployeeManagerError> {
        self.service.get_company().await.map_err(Into::into)
    }

    async fn company_statistics(&self) -> Result<CompanyStatistics, EmployeeManagerError> {
        self.service.company_statistics().await.map_err(Into::into)
    }
}

impl From<DomainError> for EmployeeManagerError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { .. } => Self::NotFound {
                message: e.to_string(),
            },
            DomainError::InvalidArgument { message } | DomainError::InvalidOperation { message } => {
                Self::invalid_argument(message)
            }
            DomainError::Validation { errors } => Self::Validation {
                violations: errors
                    .into_iter()
                    .map(|v| format!("{}: {}", v.field, v.message))
                    .collect(),
            },
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::Database { .. } => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::FieldViolation;

    #[test]
    fn domain_errors_map_to_contract_errors() {
        assert_eq!(
            EmployeeManagerError::from(DomainError::employee_not_found(4)),
            EmployeeManagerError::NotFound {
                message: "Employee with ID 4 not found".into()
            }
        );
        assert_eq!(
            EmployeeManagerError::from(DomainError::validation(vec![FieldViolation::new(
                "salary", "too high"
            )])),
            EmployeeManagerError::Validation {
                violations: vec!["salary: too high".into()]
            }
        );
        assert_eq!(
            EmployeeManagerError::from(DomainError::database("locked")),
            EmployeeManagerError::Internal
        );
    }
}
