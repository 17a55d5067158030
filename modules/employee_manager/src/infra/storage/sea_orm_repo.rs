//! SeaORM-backed implementations of the storage ports.
//!
//! The repositories are generic over the connection so they run on a
//! `DatabaseConnection` or inside a caller-owned transaction.

use anyhow::Context;
use chrono::NaiveDate;
use modkit_db::like;
use modkit_db::PageWindow;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::contract::model::{
    Company, Department, Employee, EmployeeUpdate, NewDepartment, NewEmployee,
};
use crate::domain::repo::{
    CompanyRepository, DepartmentRepository, EmployeeFilter, EmployeeRepository, EmployeeSort,
    SortDirection, SortKey,
};
use crate::infra::storage::entity::{company, department, employee};
use crate::infra::storage::mapper::{
    department_to_contract, employee_to_contract, salary_to_db,
};

/// SQL predicate for a normalized filter; every present field is ANDed.
pub fn employee_condition(filter: &EmployeeFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(needle) = &filter.department {
        cond = cond.add(like::folded_contains(
            (department::Entity, department::Column::NameFolded),
            needle,
        ));
    }
    if let Some(needle) = &filter.full_name {
        cond = cond.add(like::folded_contains(
            (employee::Entity, employee::Column::FullNameFolded),
            needle,
        ));
    }
    if let Some(birth_date) = filter.birth_date {
        cond = cond.add(employee::Column::BirthDate.eq(birth_date));
    }
    if let Some(hire_date) = filter.hire_date {
        cond = cond.add(employee::Column::HireDate.eq(hire_date));
    }
    if let Some(prefix) = &filter.salary_prefix {
        let formatted = Func::cust(Alias::new("printf"))
            .arg("%.2f")
            .arg(Expr::col((employee::Entity, employee::Column::Salary)));
        cond = cond.add(like::expr_starts_with(formatted, prefix));
    }
    cond
}

fn order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

fn employees_with_department() -> sea_orm::Select<employee::Entity> {
    employee::Entity::find().inner_join(department::Entity)
}

fn to_employees(
    rows: Vec<(employee::Model, Option<department::Model>)>,
) -> anyhow::Result<Vec<Employee>> {
    rows.into_iter()
        .map(|(e, d)| employee_to_contract(e, d))
        .collect()
}

pub struct SeaOrmEmployeeRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmEmployeeRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> EmployeeRepository for SeaOrmEmployeeRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> anyhow::Result<Vec<Employee>> {
        let rows = employees_with_department()
            .select_also(department::Entity)
            .order_by_asc(employee::Column::Id)
            .all(&self.conn)
            .await
            .context("list_all employees failed")?;
        to_employees(rows)
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<Employee>> {
        let row = employee::Entity::find_by_id(id)
            .find_also_related(department::Entity)
            .one(&self.conn)
            .await
            .context("find_by_id employee failed")?;
        row.map(|(e, d)| employee_to_contract(e, d)).transpose()
    }

    async fn list_salary_above(&self, minimum: Decimal) -> anyhow::Result<Vec<Employee>> {
        let rows = employees_with_department()
            .filter(employee::Column::Salary.gt(salary_to_db(minimum)?))
            .select_also(department::Entity)
            .order_by_desc(employee::Column::Salary)
            .order_by_asc(employee::Column::Id)
            .all(&self.conn)
            .await
            .context("list_salary_above failed")?;
        to_employees(rows)
    }

    async fn count_matching(&self, filter: &EmployeeFilter) -> anyhow::Result<u64> {
        employees_with_department()
            .filter(employee_condition(filter))
            .count(&self.conn)
            .await
            .context("count_matching failed")
    }

    async fn fetch_page(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        window: PageWindow,
    ) -> anyhow::Result<Vec<Employee>> {
        let dir = order(sort.direction);
        let query = employees_with_department()
            .filter(employee_condition(filter))
            .select_also(department::Entity);
        let query = match sort.key {
            SortKey::Id => query,
            SortKey::DepartmentName => {
                query.order_by(department::Column::NameFolded, dir.clone())
            }
            SortKey::FullName => query.order_by(employee::Column::FullNameFolded, dir.clone()),
            SortKey::BirthDate => query.order_by(employee::Column::BirthDate, dir.clone()),
            SortKey::HireDate => query.order_by(employee::Column::HireDate, dir.clone()),
            SortKey::Salary => query.order_by(employee::Column::Salary, dir.clone()),
        };
        let rows = query
            .order_by(employee::Column::Id, dir)
            .offset(window.offset())
            .limit(window.limit())
            .all(&self.conn)
            .await
            .context("fetch_page failed")?;
        to_employees(rows)
    }

    async fn insert(&self, new: NewEmployee) -> anyhow::Result<i32> {
        let am = employee::ActiveModel {
            id: NotSet,
            department_id: Set(new.department_id),
            full_name_folded: Set(like::fold_case(&new.full_name)),
            full_name: Set(new.full_name),
            birth_date: Set(new.birth_date),
            hire_date: Set(new.hire_date),
            salary: Set(salary_to_db(new.salary)?),
        };
        let res = employee::Entity::insert(am)
            .exec(&self.conn)
            .await
            .context("insert employee failed")?;
        Ok(res.last_insert_id)
    }

    async fn update_by_id(&self, id: i32, update: EmployeeUpdate) -> anyhow::Result<bool> {
        let res = employee::Entity::update_many()
            .col_expr(employee::Column::DepartmentId, Expr::value(update.department_id))
            .col_expr(
                employee::Column::FullNameFolded,
                Expr::value(like::fold_case(&update.full_name)),
            )
            .col_expr(employee::Column::FullName, Expr::value(update.full_name))
            .col_expr(employee::Column::BirthDate, Expr::value(update.birth_date))
            .col_expr(employee::Column::HireDate, Expr::value(update.hire_date))
            .col_expr(employee::Column::Salary, Expr::value(salary_to_db(update.salary)?))
            .filter(employee::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("update employee failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_by_id(&self, id: i32) -> anyhow::Result<bool> {
        let res = employee::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete employee failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_born_before(&self, cutoff: NaiveDate) -> anyhow::Result<u64> {
        let txn = self.conn.begin().await.context("begin transaction failed")?;
        let res = employee::Entity::delete_many()
            .filter(employee::Column::BirthDate.lt(cutoff))
            .exec(&txn)
            .await
            .context("delete employees born before cutoff failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected)
    }

    async fn raise_salaries_below(
        &self,
        threshold: Decimal,
        new_salary: Decimal,
    ) -> anyhow::Result<u64> {
        let threshold = salary_to_db(threshold)?;
        let new_salary = salary_to_db(new_salary)?;

        let txn = self.conn.begin().await.context("begin transaction failed")?;
        let res = employee::Entity::update_many()
            .col_expr(employee::Column::Salary, Expr::value(new_salary))
            .filter(employee::Column::Salary.lt(threshold))
            .exec(&txn)
            .await
            .context("raise salaries failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        employee::Entity::find()
            .count(&self.conn)
            .await
            .context("count employees failed")
    }

    async fn count_in_department(&self, department_id: i32) -> anyhow::Result<u64> {
        employee::Entity::find()
            .filter(employee::Column::DepartmentId.eq(department_id))
            .count(&self.conn)
            .await
            .context("count employees in department failed")
    }
}

pub struct SeaOrmDepartmentRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmDepartmentRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> DepartmentRepository for SeaOrmDepartmentRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> anyhow::Result<Vec<Department>> {
        let rows = department::Entity::find()
            .find_also_related(company::Entity)
            .order_by_asc(department::Column::Id)
            .all(&self.conn)
            .await
            .context("list_all departments failed")?;
        Ok(rows
            .into_iter()
            .map(|(d, c)| department_to_contract(d, c))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<Department>> {
        let row = department::Entity::find_by_id(id)
            .find_also_related(company::Entity)
            .one(&self.conn)
            .await
            .context("find_by_id department failed")?;
        Ok(row.map(|(d, c)| department_to_contract(d, c)))
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Department>> {
        let row = department::Entity::find()
            .filter(department::Column::Name.eq(name))
            .find_also_related(company::Entity)
            .order_by_asc(department::Column::Id)
            .one(&self.conn)
            .await
            .context("find_by_name department failed")?;
        Ok(row.map(|(d, c)| department_to_contract(d, c)))
    }

    async fn exists(&self, id: i32) -> anyhow::Result<bool> {
        let n = department::Entity::find()
            .filter(department::Column::Id.eq(id))
            .count(&self.conn)
            .await
            .context("department exists failed")?;
        Ok(n > 0)
    }

    async fn name_taken(
        &self,
        company_id: i32,
        name: &str,
        except: Option<i32>,
    ) -> anyhow::Result<bool> {
        let mut query = department::Entity::find()
            .filter(department::Column::CompanyId.eq(company_id))
            .filter(department::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(department::Column::Id.ne(id));
        }
        let n = query
            .count(&self.conn)
            .await
            .context("department name_taken failed")?;
        Ok(n > 0)
    }

    async fn insert(&self, new: NewDepartment) -> anyhow::Result<i32> {
        let am = department::ActiveModel {
            id: NotSet,
            company_id: Set(new.company_id),
            name_folded: Set(like::fold_case(&new.name)),
            name: Set(new.name),
        };
        let res = department::Entity::insert(am)
            .exec(&self.conn)
            .await
            .context("insert department failed")?;
        Ok(res.last_insert_id)
    }

    async fn rename(&self, id: i32, name: &str) -> anyhow::Result<bool> {
        let res = department::Entity::update_many()
            .col_expr(department::Column::Name, Expr::value(name))
            .col_expr(department::Column::NameFolded, Expr::value(like::fold_case(name)))
            .filter(department::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("rename department failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_by_id(&self, id: i32) -> anyhow::Result<bool> {
        let res = department::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete department failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        department::Entity::find()
            .count(&self.conn)
            .await
            .context("count departments failed")
    }
}

pub struct SeaOrmCompanyRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmCompanyRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> CompanyRepository for SeaOrmCompanyRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn first(&self) -> anyhow::Result<Option<Company>> {
        let found = company::Entity::find()
            .order_by_asc(company::Column::Id)
            .one(&self.conn)
            .await
            .context("first company failed")?;
        Ok(found.map(Into::into))
    }

    async fn exists(&self, id: i32) -> anyhow::Result<bool> {
        let n = company::Entity::find()
            .filter(company::Column::Id.eq(id))
            .count(&self.conn)
            .await
            .context("company exists failed")?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn condition_renders_every_present_filter() {
        let filter = EmployeeFilter {
            department: Some("IT".into()),
            full_name: Some("Smi_th".into()),
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 15),
            hire_date: None,
            salary_prefix: Some("75".into()),
        };
        let sql = employees_with_department()
            .filter(employee_condition(&filter))
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("INNER JOIN \"departments\""), "{sql}");
        assert!(sql.contains("\"departments\".\"name_folded\" LIKE '%it%'"), "{sql}");
        assert!(sql.contains("\"employees\".\"full_name_folded\" LIKE"), "{sql}");
        assert!(sql.contains("\"employees\".\"birth_date\" = '1985-03-15'"), "{sql}");
        assert!(sql.contains("printf("), "{sql}");
        assert!(sql.contains("LIKE '75%'"), "{sql}");
        assert!(!sql.contains("hire_date\" ="), "{sql}");
    }
}
