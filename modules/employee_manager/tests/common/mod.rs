//! Shared fixtures: a fresh in-memory SQLite database per test with
//! migrations applied, plus raw inserts that bypass service validation.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use modkit_db::like::fold_case;
use modkit_db::{ConnectOpts, DbHandle};
use sea_orm::{ActiveValue::NotSet, ActiveValue::Set, DatabaseConnection, EntityTrait};
use sea_orm_migration::MigratorTrait;

use employee_manager::config::EmployeeManagerConfig;
use employee_manager::domain::service::Service;
use employee_manager::infra::storage::entity::{company, department, employee};
use employee_manager::infra::storage::migrations::Migrator;
use employee_manager::module::build_service;

pub struct TestDb {
    pub handle: Arc<DbHandle>,
    pub conn: DatabaseConnection,
}

pub async fn test_db() -> Result<TestDb> {
    let handle = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
    Migrator::up(handle.seaorm(), None).await?;
    let conn = handle.sea();
    Ok(TestDb {
        handle: Arc::new(handle),
        conn,
    })
}

pub fn service(db: &TestDb) -> Arc<Service> {
    Arc::new(build_service(db.conn.clone(), &EmployeeManagerConfig::default()))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn add_company(conn: &DatabaseConnection, name: &str) -> Result<i32> {
    let res = company::Entity::insert(company::ActiveModel {
        id: NotSet,
        name: Set(name.to_owned()),
        founded: Set(2024),
        industry: Set("Software Development".to_owned()),
        description: Set("Test company".to_owned()),
        headquarters: Set("Test City".to_owned()),
        website: Set("https://example.com".to_owned()),
    })
    .exec(conn)
    .await?;
    Ok(res.last_insert_id)
}

pub async fn add_department(conn: &DatabaseConnection, company_id: i32, name: &str) -> Result<i32> {
    let res = department::Entity::insert(department::ActiveModel {
        id: NotSet,
        company_id: Set(company_id),
        name: Set(name.to_owned()),
        name_folded: Set(fold_case(name)),
    })
    .exec(conn)
    .await?;
    Ok(res.last_insert_id)
}

pub async fn add_employee(
    conn: &DatabaseConnection,
    department_id: i32,
    full_name: &str,
    birth_date: NaiveDate,
    salary: f64,
) -> Result<i32> {
    let res = employee::Entity::insert(employee::ActiveModel {
        id: NotSet,
        department_id: Set(department_id),
        full_name: Set(full_name.to_owned()),
        full_name_folded: Set(fold_case(full_name)),
        birth_date: Set(birth_date),
        hire_date: Set(date(2020, 1, 15)),
        salary: Set(salary),
    })
    .exec(conn)
    .await?;
    Ok(res.last_insert_id)
}

/// One company with an "IT Department"; returns its department id.
pub async fn company_with_it(conn: &DatabaseConnection) -> Result<i32> {
    let company_id = add_company(conn, "Acme").await?;
    add_department(conn, company_id, "IT Department").await
}
