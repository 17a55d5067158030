use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::contract::model::{Company, Department, Employee};
use crate::infra::storage::entity::{company, department, employee};

/// Stored REAL salary to a two-decimal amount.
pub fn salary_from_db(value: f64) -> anyhow::Result<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(2))
        .with_context(|| format!("salary {value} is not representable"))
}

pub fn salary_to_db(value: Decimal) -> anyhow::Result<f64> {
    value
        .round_dp(2)
        .to_f64()
        .with_context(|| format!("salary {value} does not fit a REAL column"))
}

pub fn employee_to_contract(
    model: employee::Model,
    department: Option<department::Model>,
) -> anyhow::Result<Employee> {
    Ok(Employee {
        id: model.id,
        department_id: model.department_id,
        department_name: department.map(|d| d.name),
        full_name: model.full_name,
        birth_date: model.birth_date,
        hire_date: model.hire_date,
        salary: salary_from_db(model.salary)?,
    })
}

pub fn department_to_contract(
    model: department::Model,
    company: Option<company::Model>,
) -> Department {
    Department {
        id: model.id,
        company_id: model.company_id,
        company_name: company.map(|c| c.name),
        name: model.name,
    }
}

impl From<company::Model> for Company {
    fn from(m: company::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            founded: m.founded,
            industry: m.industry,
            description: m.description,
            headquarters: m.headquarters,
            website: m.website,
        }
    }
}
