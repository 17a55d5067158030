//! Lowercased shadow columns for case-insensitive name search and sorting.

use modkit_db::like::fold_case;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden, Clone, Copy)]
enum Departments {
    Table,
    Id,
    Name,
    NameFolded,
}

#[derive(DeriveIden, Clone, Copy)]
enum Employees {
    Table,
    Id,
    FullName,
    FullNameFolded,
}

/// Fill `folded` with `fold_case(source)` for every existing row.
async fn backfill<I>(
    manager: &SchemaManager<'_>,
    table: I,
    id: I,
    source: I,
    folded: I,
) -> Result<(), DbErr>
where
    I: Iden + Copy + 'static,
{
    let db = manager.get_connection();
    let backend = manager.get_database_backend();
    let select = Query::select().columns([id, source]).from(table).to_owned();
    for row in db.query_all(backend.build(&select)).await? {
        let row_id: i32 = row.try_get_by_index(0)?;
        let value: String = row.try_get_by_index(1)?;
        let update = Query::update()
            .table(table)
            .value(folded, fold_case(&value))
            .and_where(Expr::col(id).eq(row_id))
            .to_owned();
        db.execute(backend.build(&update)).await?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Departments::Table)
                    .add_column(
                        ColumnDef::new(Departments::NameFolded)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Employees::Table)
                    .add_column(
                        ColumnDef::new(Employees::FullNameFolded)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        backfill(
            manager,
            Departments::Table,
            Departments::Id,
            Departments::Name,
            Departments::NameFolded,
        )
        .await?;
        backfill(
            manager,
            Employees::Table,
            Employees::Id,
            Employees::FullName,
            Employees::FullNameFolded,
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_departments_name_folded")
                    .table(Departments::Table)
                    .col(Departments::NameFolded)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_employees_full_name_folded")
                    .table(Employees::Table)
                    .col(Employees::FullNameFolded)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("ix_employees_full_name_folded")
                    .table(Employees::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("ix_departments_name_folded")
                    .table(Departments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Employees::Table)
                    .drop_column(Employees::FullNameFolded)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Departments::Table)
                    .drop_column(Departments::NameFolded)
                    .to_owned(),
            )
            .await
    }
}
