use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::util::{default_table_statement, user_foreign_key};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<RoleType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<AdvanceStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayrollStatus>()).await?;

        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // Password should be in a hashed format
                .col(ColumnDef::new(User::Role)
                    .custom(RoleType::name())
                    .not_null())
                .col(ColumnDef::new(User::Email)
                    .text())
                .take()
            ).await?;

        // Amounts and balances are unbounded decimals, installments are divided exactly
        manager
            .create_table(default_table_statement()
                .table(Advance::Table)
                .col(ColumnDef::new(Advance::WorkerId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Advance::Amount)
                    .decimal()
                    .not_null()
                    .check(Expr::col(Advance::Amount).gt(0)))
                .col(ColumnDef::new(Advance::Installments)
                    .integer()
                    .not_null()
                    .default(1)
                    .check(Expr::col(Advance::Installments).gte(1)))
                .col(ColumnDef::new(Advance::RemainingBalance)
                    .decimal()
                    .not_null()
                    .check(Expr::col(Advance::RemainingBalance).gte(0)))
                .col(ColumnDef::new(Advance::Status)
                    .custom(AdvanceStatus::name())
                    .not_null())
                .col(ColumnDef::new(Advance::Notes)
                    .text())
                .col(ColumnDef::new(Advance::ApprovedBy)
                    .uuid())
                .col(ColumnDef::new(Advance::RequestedAt)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(Advance::ApprovedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Advance::RejectedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Advance::CompletedAt)
                    .timestamp_with_time_zone())
                .take()
            ).await?;

        manager.create_foreign_key(user_foreign_key(Advance::Table, Advance::WorkerId, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(user_foreign_key(Advance::Table, Advance::ApprovedBy, ForeignKeyAction::SetNull)).await?;

        manager
            .create_index(Index::create()
                .name("idx_advance_worker_status")
                .table(Advance::Table)
                .col(Advance::WorkerId)
                .col(Advance::Status)
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(PayrollRecord::Table)
                .col(ColumnDef::new(PayrollRecord::WorkerId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Period)
                    .text()
                    .not_null()) // YYYY-MM
                .col(ColumnDef::new(PayrollRecord::HalfMonth)
                    .small_integer()
                    .not_null()
                    .check(Expr::col(PayrollRecord::HalfMonth).is_in([1, 2])))
                .col(ColumnDef::new(PayrollRecord::ExpectedDays)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::DaysWorked)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::BaseSalary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::DailyRate)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::GrossAmount)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::DeductedAmount)
                    .decimal()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Total)
                    .decimal()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Status)
                    .custom(PayrollStatus::name())
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::ApprovedBy)
                    .uuid())
                .col(ColumnDef::new(PayrollRecord::ApprovedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(PayrollRecord::PaidAt)
                    .timestamp_with_time_zone())
                .take()
            ).await?;

        manager.create_foreign_key(user_foreign_key(PayrollRecord::Table, PayrollRecord::WorkerId, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(user_foreign_key(PayrollRecord::Table, PayrollRecord::ApprovedBy, ForeignKeyAction::SetNull)).await?;

        // One record per worker and half-month, generation relies on it
        manager
            .create_index(Index::create()
                .name("idx_payroll_record_worker_period_half")
                .table(PayrollRecord::Table)
                .col(PayrollRecord::WorkerId)
                .col(PayrollRecord::Period)
                .col(PayrollRecord::HalfMonth)
                .unique()
                .take()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                TableDropStatement::new()
                    .table(PayrollRecord::Table)
                    .take()
            ).await?;

        manager
            .drop_table(
                TableDropStatement::new()
                    .table(Advance::Table)
                    .take()
            ).await?;

        manager
            .drop_table(
                TableDropStatement::new()
                    .table(User::Table)
                    .take()
            ).await?;

        for name in [PayrollStatus::name(), AdvanceStatus::name(), RoleType::name()] {
            manager
                .drop_type(
                    TypeDropStatement::new()
                        .name(name)
                        .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum User {
    Table,
    Username,
    Password,
    Role,
    Email,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "user")]
    User,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "advance_status")]
enum AdvanceStatus {
    #[sea_orm(string_value = "requested")]
    Requested,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "in_collection")]
    InCollection,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_status")]
enum PayrollStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Iden)]
enum Advance {
    Table,
    WorkerId,
    Amount,
    Installments,
    RemainingBalance,
    Status,
    Notes,
    ApprovedBy,
    RequestedAt,
    ApprovedAt,
    RejectedAt,
    CompletedAt,
}

#[derive(Iden)]
enum PayrollRecord {
    Table,
    WorkerId,
    Period,
    HalfMonth,
    ExpectedDays,
    DaysWorked,
    BaseSalary,
    DailyRate,
    GrossAmount,
    DeductedAmount,
    Total,
    Status,
    ApprovedBy,
    ApprovedAt,
    PaidAt,
}
