use sea_orm_migration::prelude::*;

pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Points `column` of `table` at `user.id`
///
/// # Example
///
/// ```rs
/// manager
///     .create_foreign_key(user_foreign_key(Advance::Table, Advance::WorkerId, ForeignKeyAction::Cascade))
///     .await?;
/// ```
pub(crate) fn user_foreign_key(
    table: impl IntoTableRef,
    column: impl IntoIden,
    on_delete: ForeignKeyAction,
) -> ForeignKeyCreateStatement {
    use crate::m20250613_083042_init::User;

    ForeignKeyCreateStatement::new()
        .from_tbl(table)
        .from_col(column)
        .to(User::Table, DefaultColumn::Id)
        .on_delete(on_delete)
        .on_update(ForeignKeyAction::Cascade)
        .take()
}
