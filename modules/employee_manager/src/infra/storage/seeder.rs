//! Demo data inserted into empty tables on startup.

use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use modkit_db::like::fold_case;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::infra::storage::entity::{company, department, employee};

const DEPARTMENTS: [&str; 8] = [
    "IT Department",
    "HR Department",
    "Finance Department",
    "Marketing Department",
    "Operations Department",
    "Research & Development",
    "Customer Support",
    "Legal Department",
];

/// (full name, department, birth date, hire date, salary)
const EMPLOYEES: [(&str, &str, &str, &str, f64); 10] = [
    ("John Smith", "IT Department", "1985-03-15", "2020-01-15", 75000.0),
    ("Sarah Johnson", "IT Department", "1990-07-22", "2021-03-10", 82000.0),
    ("Michael Brown", "HR Department", "1988-11-08", "2019-06-20", 65000.0),
    ("Emily Davis", "Finance Department", "1992-04-12", "2022-01-05", 70000.0),
    ("David Wilson", "Marketing Department", "1987-09-30", "2020-08-15", 68000.0),
    ("Lisa Anderson", "Operations Department", "1991-12-03", "2021-11-01", 62000.0),
    ("Robert Taylor", "Research & Development", "1986-05-18", "2018-04-12", 90000.0),
    ("Jennifer Garcia", "Customer Support", "1993-08-25", "2022-02-14", 55000.0),
    ("Christopher Martinez", "Legal Department", "1984-01-07", "2019-09-03", 85000.0),
    ("Amanda Rodriguez", "IT Department", "1989-06-14", "2021-07-08", 78000.0),
];

/// Rows inserted per table; zero when the table already had data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub companies: u64,
    pub departments: u64,
    pub employees: u64,
}

fn date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad seed date '{s}'"))
}

/// Seed each table independently, skipping tables that already have rows.
/// Runs in one transaction.
pub async fn seed<C>(conn: &C) -> anyhow::Result<SeedReport>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = conn.begin().await.context("begin seed transaction failed")?;
    let mut report = SeedReport::default();

    if company::Entity::find().count(&txn).await? == 0 {
        company::Entity::insert(company::ActiveModel {
            id: NotSet,
            name: Set("Employee Manager Corp".to_owned()),
            founded: Set(2024),
            industry: Set("Software Development".to_owned()),
            description: Set("Leading provider of employee management solutions".to_owned()),
            headquarters: Set("Tech City, Innovation State".to_owned()),
            website: Set("https://employeemanager.com".to_owned()),
        })
        .exec(&txn)
        .await
        .context("seed company failed")?;
        report.companies = 1;
    }

    let company = company::Entity::find()
        .order_by_asc(company::Column::Id)
        .one(&txn)
        .await?
        .context("no company available for seeding")?;

    if department::Entity::find().count(&txn).await? == 0 {
        let rows = DEPARTMENTS.iter().map(|name| department::ActiveModel {
            id: NotSet,
            company_id: Set(company.id),
            name: Set((*name).to_owned()),
            name_folded: Set(fold_case(name)),
        });
        department::Entity::insert_many(rows)
            .exec(&txn)
            .await
            .context("seed departments failed")?;
        report.departments = DEPARTMENTS.len() as u64;
    }

    if employee::Entity::find().count(&txn).await? == 0 {
        let ids: HashMap<String, i32> = department::Entity::find()
            .filter(department::Column::CompanyId.eq(company.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|d| (d.name, d.id))
            .collect();

        let mut rows = Vec::with_capacity(EMPLOYEES.len());
        for (name, dept, born, hired, salary) in EMPLOYEES {
            let Some(&department_id) = ids.get(dept) else {
                debug!(department = dept, "seed department missing, skipping employee");
                continue;
            };
            rows.push(employee::ActiveModel {
                id: NotSet,
                department_id: Set(department_id),
                full_name: Set(name.to_owned()),
                full_name_folded: Set(fold_case(name)),
                birth_date: Set(date(born)?),
                hire_date: Set(date(hired)?),
                salary: Set(salary),
            });
        }
        report.employees = rows.len() as u64;
        if !rows.is_empty() {
            employee::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .context("seed employees failed")?;
        }
    }

    txn.commit().await.context("commit seed transaction failed")?;
    info!(?report, "seed data applied");
    Ok(report)
}
