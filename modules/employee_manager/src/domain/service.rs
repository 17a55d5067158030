use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::config::{EmployeeManagerConfig, StatisticsConfig};
use crate::contract::model::{
    Company, CompanyStatistics, Department, DepartmentUpdate, Employee, EmployeeUpdate,
    NewDepartment, NewEmployee, Page, PageRequest, SearchCriteria, SortSpec,
};
use crate::domain::error::{storage_error, DomainError, FieldViolation};
use crate::domain::paginator::EmployeeSearchPaginator;
use crate::domain::repo::{CompanyRepository, DepartmentRepository, EmployeeRepository};
use crate::domain::validation;

pub const EMPLOYEE_ID_MUST_BE_POSITIVE: &str = "Employee ID must be positive";
pub const DEPARTMENT_ID_MUST_BE_POSITIVE: &str = "Department ID must be positive";
pub const NO_COMPANY_FOUND: &str = "No company found in the database";

/// Storage ports the service runs on.
#[derive(Clone)]
pub struct Repositories {
    pub employees: Arc<dyn EmployeeRepository>,
    pub departments: Arc<dyn DepartmentRepository>,
    pub companies: Arc<dyn CompanyRepository>,
}

/// Business rules for companies, departments and employees.
/// Depends only on the repository ports.
#[derive(Clone)]
pub struct Service {
    repos: Repositories,
    paginator: Arc<EmployeeSearchPaginator>,
    statistics: StatisticsConfig,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn ensure_valid(errors: Vec<FieldViolation>) -> Result<(), DomainError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::validation(errors))
    }
}

fn ensure_employee_id(id: i32) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::invalid_argument(EMPLOYEE_ID_MUST_BE_POSITIVE));
    }
    Ok(())
}

fn ensure_department_id(id: i32) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::invalid_argument(DEPARTMENT_ID_MUST_BE_POSITIVE));
    }
    Ok(())
}

impl Service {
    pub fn new(repos: Repositories, config: &EmployeeManagerConfig) -> Self {
        let paginator = EmployeeSearchPaginator::new(
            repos.employees.clone(),
            config.default_page_size,
            config.max_page_size,
        );
        Self {
            repos,
            paginator: Arc::new(paginator),
            statistics: config.statistics.clone(),
        }
    }

    // --- employees ---

    #[instrument(name = "employee_manager.service.list_employees", skip(self))]
    pub async fn list_employees(&self) -> Result<Vec<Employee>, DomainError> {
        let employees = self.repos.employees.list_all().await.map_err(storage_error)?;
        debug!(count = employees.len(), "listed employees");
        Ok(employees)
    }

    #[instrument(
        name = "employee_manager.service.search_employees",
        skip(self, search, sort),
        fields(page = ?page.page, page_size = ?page.page_size)
    )]
    pub async fn search_employees(
        &self,
        page: PageRequest,
        search: &SearchCriteria,
        sort: &SortSpec,
    ) -> Result<Page<Employee>, DomainError> {
        let result = self.paginator.paginate(page, search, sort).await?;
        debug!(
            total_items = result.total_items,
            returned = result.data.len(),
            "employee page assembled"
        );
        Ok(result)
    }

    #[instrument(name = "employee_manager.service.employees_with_salary_above", skip(self))]
    pub async fn employees_with_salary_above(
        &self,
        minimum: Decimal,
    ) -> Result<Vec<Employee>, DomainError> {
        if minimum < Decimal::ZERO {
            return Err(DomainError::invalid_argument(
                "Minimum salary cannot be negative",
            ));
        }
        self.repos
            .employees
            .list_salary_above(minimum)
            .await
            .map_err(storage_error)
    }

    #[instrument(name = "employee_manager.service.get_employee", skip(self))]
    pub async fn get_employee(&self, id: i32) -> Result<Employee, DomainError> {
        ensure_employee_id(id)?;
        self.repos
            .employees
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::employee_not_found(id))
    }

    #[instrument(
        name = "employee_manager.service.create_employee",
        skip(self, new),
        fields(department_id = new.department_id)
    )]
    pub async fn create_employee(&self, new: NewEmployee) -> Result<Employee, DomainError> {
        ensure_valid(validation::validate_new_employee(&new, today()))?;
        self.ensure_department_exists(new.department_id).await?;

        let id = self.repos.employees.insert(new).await.map_err(storage_error)?;
        info!(employee_id = id, "employee created");
        self.reload_employee(id).await
    }

    #[instrument(name = "employee_manager.service.update_employee", skip(self, update))]
    pub async fn update_employee(
        &self,
        id: i32,
        update: EmployeeUpdate,
    ) -> Result<Employee, DomainError> {
        ensure_employee_id(id)?;
        ensure_valid(validation::validate_employee_update(&update, today()))?;
        if self
            .repos
            .employees
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .is_none()
        {
            return Err(DomainError::employee_not_found(id));
        }
        self.ensure_department_exists(update.department_id).await?;

        let updated = self
            .repos
            .employees
            .update_by_id(id, update)
            .await
            .map_err(storage_error)?;
        if !updated {
            return Err(DomainError::employee_not_found(id));
        }
        info!(employee_id = id, "employee updated");
        self.reload_employee(id).await
    }

    #[instrument(name = "employee_manager.service.delete_employee", skip(self))]
    pub async fn delete_employee(&self, id: i32) -> Result<(), DomainError> {
        ensure_employee_id(id)?;
        let deleted = self
            .repos
            .employees
            .delete_by_id(id)
            .await
            .map_err(storage_error)?;
        if !deleted {
            warn!(employee_id = id, "employee not found for deletion");
            return Err(DomainError::employee_not_found(id));
        }
        info!(employee_id = id, "employee deleted");
        Ok(())
    }

    /// Remove employees whose age in calendar years (current year minus birth
    /// year) exceeds `maximum_age`. Returns how many were removed.
    #[instrument(name = "employee_manager.service.delete_employees_older_than", skip(self))]
    pub async fn delete_employees_older_than(&self, maximum_age: i32) -> Result<u64, DomainError> {
        if maximum_age <= 0 {
            return Err(DomainError::invalid_argument("Maximum age must be positive"));
        }
        let Some(cutoff) = today()
            .year()
            .checked_sub(maximum_age)
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        else {
            return Ok(0);
        };

        let deleted = self
            .repos
            .employees
            .delete_born_before(cutoff)
            .await
            .map_err(storage_error)?;
        info!(deleted, %cutoff, "bulk age-based deletion finished");
        Ok(deleted)
    }

    /// Set every salary below `maximum_current_salary` to `new_salary`.
    #[instrument(name = "employee_manager.service.update_salary_for_low_paid", skip(self))]
    pub async fn update_salary_for_low_paid(
        &self,
        new_salary: Decimal,
        maximum_current_salary: Decimal,
    ) -> Result<u64, DomainError> {
        ensure_valid(validation::validate_salary_update(
            new_salary,
            maximum_current_salary,
        ))?;
        let updated = self
            .repos
            .employees
            .raise_salaries_below(maximum_current_salary, new_salary)
            .await
            .map_err(storage_error)?;
        info!(updated, "bulk salary update finished");
        Ok(updated)
    }

    async fn ensure_department_exists(&self, department_id: i32) -> Result<(), DomainError> {
        let exists = self
            .repos
            .departments
            .exists(department_id)
            .await
            .map_err(storage_error)?;
        if !exists {
            return Err(DomainError::invalid_argument(format!(
                "Department with ID {department_id} does not exist"
            )));
        }
        Ok(())
    }

    async fn reload_employee(&self, id: i32) -> Result<Employee, DomainError> {
        self.repos
            .employees
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::database(format!("employee {id} vanished after write")))
    }

    // --- departments ---

    #[instrument(name = "employee_manager.service.list_departments", skip(self))]
    pub async fn list_departments(&self) -> Result<Vec<Department>, DomainError> {
        self.repos
            .departments
            .list_all()
            .await
            .map_err(storage_error)
    }

    #[instrument(name = "employee_manager.service.get_department", skip(self))]
    pub async fn get_department(&self, id: i32) -> Result<Department, DomainError> {
        ensure_department_id(id)?;
        self.repos
            .departments
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::department_not_found(id))
    }

    #[instrument(name = "employee_manager.service.get_department_by_name", skip(self))]
    pub async fn get_department_by_name(&self, name: &str) -> Result<Department, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "Department name cannot be null or empty",
            ));
        }
        self.repos
            .departments
            .find_by_name(name)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::department_name_not_found(name))
    }

    #[instrument(
        name = "employee_manager.service.create_department",
        skip(self, new),
        fields(company_id = new.company_id, name = %new.name)
    )]
    pub async fn create_department(&self, new: NewDepartment) -> Result<Department, DomainError> {
        ensure_valid(validation::validate_new_department(&new))?;

        let company_exists = self
            .repos
            .companies
            .exists(new.company_id)
            .await
            .map_err(storage_error)?;
        if !company_exists {
            return Err(DomainError::invalid_argument(format!(
                "Company with ID {} does not exist",
                new.company_id
            )));
        }
        self.ensure_name_free(new.company_id, &new.name, None).await?;

        let id = self
            .repos
            .departments
            .insert(new)
            .await
            .map_err(storage_error)?;
        info!(department_id = id, "department created");
        self.reload_department(id).await
    }

    /// Rename a department. The company it belongs to never changes.
    #[instrument(name = "employee_manager.service.update_department", skip(self, update))]
    pub async fn update_department(
        &self,
        id: i32,
        update: DepartmentUpdate,
    ) -> Result<Department, DomainError> {
        ensure_department_id(id)?;
        ensure_valid(validation::validate_department_update(&update))?;

        let existing = self
            .repos
            .departments
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::department_not_found(id))?;
        self.ensure_name_free(existing.company_id, &update.name, Some(id))
            .await?;

        let renamed = self
            .repos
            .departments
            .rename(id, &update.name)
            .await
            .map_err(storage_error)?;
        if !renamed {
            return Err(DomainError::department_not_found(id));
        }
        info!(department_id = id, "department renamed");
        self.reload_department(id).await
    }

    #[instrument(name = "employee_manager.service.delete_department", skip(self))]
    pub async fn delete_department(&self, id: i32) -> Result<(), DomainError> {
        ensure_department_id(id)?;

        let exists = self
            .repos
            .departments
            .exists(id)
            .await
            .map_err(storage_error)?;
        if !exists {
            warn!(department_id = id, "department not found for deletion");
            return Err(DomainError::department_not_found(id));
        }

        let staff = self
            .repos
            .employees
            .count_in_department(id)
            .await
            .map_err(storage_error)?;
        if staff > 0 {
            return Err(DomainError::conflict(format!(
                "Department with ID {id} still has {staff} employee(s)"
            )));
        }

        let deleted = self
            .repos
            .departments
            .delete_by_id(id)
            .await
            .map_err(storage_error)?;
        if !deleted {
            return Err(DomainError::department_not_found(id));
        }
        info!(department_id = id, "department deleted");
        Ok(())
    }

    async fn ensure_name_free(
        &self,
        company_id: i32,
        name: &str,
        except: Option<i32>,
    ) -> Result<(), DomainError> {
        let taken = self
            .repos
            .departments
            .name_taken(company_id, name, except)
            .await
            .map_err(storage_error)?;
        if taken {
            return Err(DomainError::conflict(format!(
                "Department '{name}' already exists in company {company_id}"
            )));
        }
        Ok(())
    }

    async fn reload_department(&self, id: i32) -> Result<Department, DomainError> {
        self.repos
            .departments
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::database(format!("department {id} vanished after write")))
    }

    // --- company ---

    #[instrument(name = "employee_manager.service.get_company", skip(self))]
    pub async fn get_company(&self) -> Result<Company, DomainError> {
        self.repos
            .companies
            .first()
            .await
            .map_err(storage_error)?
            .ok_or_else(|| DomainError::invalid_operation(NO_COMPANY_FOUND))
    }

    /// Live head counts plus the configured company figures.
    #[instrument(name = "employee_manager.service.company_statistics", skip(self))]
    pub async fn company_statistics(&self) -> Result<CompanyStatistics, DomainError> {
        let total_employees = self.repos.employees.count().await.map_err(storage_error)?;
        let departments = self.repos.departments.count().await.map_err(storage_error)?;
        Ok(CompanyStatistics {
            total_employees,
            departments,
            founded_years: today().year() - self.statistics.founded_year,
            projects_completed: self.statistics.projects_completed,
            client_satisfaction: self.statistics.client_satisfaction,
            annual_revenue: self.statistics.annual_revenue.clone(),
        })
    }
}
