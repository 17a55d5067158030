//! Input rules per request type. Each function returns every violated rule,
//! empty when the input is acceptable.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::contract::model::{DepartmentUpdate, EmployeeUpdate, NewDepartment, NewEmployee};
use crate::domain::error::FieldViolation;

pub const MAX_FULL_NAME_LEN: usize = 200;
pub const MAX_DEPARTMENT_NAME_LEN: usize = 100;
pub const MAX_AGE_YEARS: u32 = 100;

pub const DEPARTMENT_ID_REQUIRED: &str = "Department ID must be greater than 0";
pub const FULL_NAME_REQUIRED: &str = "Full name is required and must not exceed 200 characters";
pub const BIRTH_DATE_INVALID: &str =
    "Birth date must be in the past and cannot be more than 100 years ago";
pub const BIRTH_DATE_IN_FUTURE: &str = "Birth date must be in the past";
pub const HIRE_DATE_INVALID: &str = "Hire date cannot be in the future";
pub const SALARY_INVALID: &str = "Salary must be greater than 0 and cannot exceed 1,000,000";
pub const COMPANY_ID_REQUIRED: &str = "Company ID must be greater than 0";
pub const DEPARTMENT_NAME_REQUIRED: &str =
    "Department name is required and must not exceed 100 characters";
pub const DEPARTMENT_NAME_PATTERN: &str =
    "Department name can only contain letters, spaces, and hyphens";
pub const NEW_SALARY_INVALID: &str =
    "New salary must be greater than 0 and cannot exceed 1,000,000";
pub const MAX_CURRENT_SALARY_INVALID: &str =
    "Maximum current salary must be greater than 0 and cannot exceed 1,000,000";
pub const NEW_SALARY_MUST_BE_HIGHER: &str =
    "New salary should be higher than the maximum current salary threshold to avoid salary reductions";

pub fn max_salary() -> Decimal {
    Decimal::from(1_000_000)
}

fn salary_in_range(salary: Decimal) -> bool {
    salary > Decimal::ZERO && salary <= max_salary()
}

fn name_ok(name: &str, max: usize) -> bool {
    !name.trim().is_empty() && name.chars().count() <= max
}

/// Latin or Cyrillic letters, whitespace and hyphens.
fn department_name_chars_ok(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphabetic()
                || ('\u{0410}'..='\u{044F}').contains(&c)
                || c.is_whitespace()
                || c == '-'
        })
}

pub fn validate_new_employee(new: &NewEmployee, today: NaiveDate) -> Vec<FieldViolation> {
    let mut errors = Vec::new();
    if new.department_id <= 0 {
        errors.push(FieldViolation::new("departmentId", DEPARTMENT_ID_REQUIRED));
    }
    if !name_ok(&new.full_name, MAX_FULL_NAME_LEN) {
        errors.push(FieldViolation::new("fullName", FULL_NAME_REQUIRED));
    }
    let oldest = today.checked_sub_months(Months::new(12 * MAX_AGE_YEARS));
    let too_old = oldest.is_some_and(|oldest| new.birth_date <= oldest);
    if new.birth_date >= today || too_old {
        errors.push(FieldViolation::new("birthDate", BIRTH_DATE_INVALID));
    }
    if new.hire_date > today {
        errors.push(FieldViolation::new("hireDate", HIRE_DATE_INVALID));
    }
    if !salary_in_range(new.salary) {
        errors.push(FieldViolation::new("salary", SALARY_INVALID));
    }
    errors
}

pub fn validate_employee_update(update: &EmployeeUpdate, today: NaiveDate) -> Vec<FieldViolation> {
    let mut errors = Vec::new();
    if update.department_id <= 0 {
        errors.push(FieldViolation::new("departmentId", DEPARTMENT_ID_REQUIRED));
    }
    if !name_ok(&update.full_name, MAX_FULL_NAME_LEN) {
        errors.push(FieldViolation::new("fullName", FULL_NAME_REQUIRED));
    }
    if update.birth_date >= today {
        errors.push(FieldViolation::new("birthDate", BIRTH_DATE_IN_FUTURE));
    }
    if update.hire_date > today {
        errors.push(FieldViolation::new("hireDate", HIRE_DATE_INVALID));
    }
    if !salary_in_range(update.salary) {
        errors.push(FieldViolation::new("salary", SALARY_INVALID));
    }
    errors
}

pub fn validate_new_department(new: &NewDepartment) -> Vec<FieldViolation> {
    let mut errors = Vec::new();
    if new.company_id <= 0 {
        errors.push(FieldViolation::new("companyId", COMPANY_ID_REQUIRED));
    }
    if !name_ok(&new.name, MAX_DEPARTMENT_NAME_LEN) {
        errors.push(FieldViolation::new("name", DEPARTMENT_NAME_REQUIRED));
    } else if !department_name_chars_ok(&new.name) {
        errors.push(FieldViolation::new("name", DEPARTMENT_NAME_PATTERN));
    }
    errors
}

pub fn validate_department_update(update: &DepartmentUpdate) -> Vec<FieldViolation> {
    let mut errors = Vec::new();
    if update.company_id <= 0 {
        errors.push(FieldViolation::new("companyId", COMPANY_ID_REQUIRED));
    }
    if !name_ok(&update.name, MAX_DEPARTMENT_NAME_LEN) {
        errors.push(FieldViolation::new("name", DEPARTMENT_NAME_REQUIRED));
    }
    errors
}

/// Rules for the bulk raise: both amounts in range and the raise must not
/// lower anyone's pay.
pub fn validate_salary_update(new_salary: Decimal, max_current: Decimal) -> Vec<FieldViolation> {
    let mut errors = Vec::new();
    if !salary_in_range(new_salary) {
        errors.push(FieldViolation::new("newSalary", NEW_SALARY_INVALID));
    }
    if !salary_in_range(max_current) {
        errors.push(FieldViolation::new(
            "maximumCurrentSalary",
            MAX_CURRENT_SALARY_INVALID,
        ));
    }
    if new_salary <= max_current {
        errors.push(FieldViolation::new("newSalary", NEW_SALARY_MUST_BE_HIGHER));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_employee() -> NewEmployee {
        NewEmployee {
            department_id: 1,
            full_name: "John Smith".into(),
            birth_date: date(1985, 3, 15),
            hire_date: date(2020, 1, 15),
            salary: Decimal::from(75_000),
        }
    }

    fn fields(errors: &[FieldViolation]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn valid_employee_passes() {
        assert!(validate_new_employee(&new_employee(), today()).is_empty());
    }

    #[test]
    fn every_broken_employee_rule_is_reported() {
        let bad = NewEmployee {
            department_id: 0,
            full_name: "   ".into(),
            birth_date: today(),
            hire_date: date(2025, 6, 16),
            salary: Decimal::ZERO,
        };
        let errors = validate_new_employee(&bad, today());
        assert_eq!(
            fields(&errors),
            vec!["departmentId", "fullName", "birthDate", "hireDate", "salary"]
        );
        assert_eq!(errors[2].message, BIRTH_DATE_INVALID);
    }

    #[test]
    fn birth_date_window_is_exclusive_at_both_ends() {
        let mut e = new_employee();
        e.birth_date = date(1925, 6, 15);
        assert_eq!(fields(&validate_new_employee(&e, today())), vec!["birthDate"]);
        e.birth_date = date(1925, 6, 16);
        assert!(validate_new_employee(&e, today()).is_empty());
        e.birth_date = date(2025, 6, 14);
        assert!(validate_new_employee(&e, today()).is_empty());
    }

    #[test]
    fn salary_bounds() {
        let mut e = new_employee();
        e.salary = Decimal::new(50, 2);
        assert!(validate_new_employee(&e, today()).is_empty());
        e.salary = max_salary();
        assert!(validate_new_employee(&e, today()).is_empty());
        e.salary = max_salary() + Decimal::new(1, 2);
        assert_eq!(fields(&validate_new_employee(&e, today())), vec!["salary"]);
    }

    #[test]
    fn full_name_length_counts_characters() {
        let mut e = new_employee();
        e.full_name = "é".repeat(200);
        assert!(validate_new_employee(&e, today()).is_empty());
        e.full_name.push('é');
        assert_eq!(fields(&validate_new_employee(&e, today())), vec!["fullName"]);
    }

    #[test]
    fn update_allows_very_old_birth_dates() {
        let update = EmployeeUpdate {
            department_id: 2,
            full_name: "Old Timer".into(),
            birth_date: date(1900, 1, 1),
            hire_date: date(1950, 1, 1),
            salary: Decimal::from(10),
        };
        assert!(validate_employee_update(&update, today()).is_empty());

        let future = EmployeeUpdate {
            birth_date: date(2030, 1, 1),
            ..update
        };
        let errors = validate_employee_update(&future, today());
        assert_eq!(errors[0].message, BIRTH_DATE_IN_FUTURE);
    }

    #[test]
    fn department_name_characters() {
        let ok = |name: &str| {
            validate_new_department(&NewDepartment {
                company_id: 1,
                name: name.into(),
            })
        };
        assert!(ok("Quality Assurance").is_empty());
        assert!(ok("Отдел кадров").is_empty());
        assert!(ok("Back-Office").is_empty());
        assert_eq!(ok("R&D")[0].message, DEPARTMENT_NAME_PATTERN);
        assert_eq!(ok("Team 7")[0].message, DEPARTMENT_NAME_PATTERN);
        assert_eq!(ok("")[0].message, DEPARTMENT_NAME_REQUIRED);
        assert_eq!(ok(&"a".repeat(101))[0].message, DEPARTMENT_NAME_REQUIRED);
    }

    #[test]
    fn department_update_skips_character_rule() {
        let errors = validate_department_update(&DepartmentUpdate {
            company_id: 1,
            name: "R&D".into(),
        });
        assert!(errors.is_empty());

        let errors = validate_department_update(&DepartmentUpdate {
            company_id: 0,
            name: " ".into(),
        });
        assert_eq!(fields(&errors), vec!["companyId", "name"]);
    }

    #[test]
    fn salary_update_rules() {
        assert!(validate_salary_update(Decimal::from(50_000), Decimal::from(40_000)).is_empty());

        let errors = validate_salary_update(Decimal::from(40_000), Decimal::from(40_000));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, NEW_SALARY_MUST_BE_HIGHER);

        let errors = validate_salary_update(Decimal::from(2_000_000), Decimal::ZERO);
        assert_eq!(
            errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
            vec![NEW_SALARY_INVALID, MAX_CURRENT_SALARY_INVALID]
        );
    }
}
