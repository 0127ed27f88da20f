use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250613_083042_init::User;

const AGENT_COUNT: u128 = 20;
const ADMIN_ID: u128 = 12345;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn seeded_id(n: u128) -> SimpleExpr {
    Expr::val(format!("{n:032x}")).cast_as("uuid")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-06-15T06:58:41.474Z").cast_as("timestamptz");

        // Telesales agents log in with their username as password
        for i in 1..=AGENT_COUNT {
            let username = format!("agent{i}");
            let email = format!("{username}@telesales.local");

            let hashed_password = &sha2::Sha256::digest(format!("{username}:{username}"))[..];

            manager
                .exec_stmt(Query::insert()
                    .into_table(User::Table)
                    .columns(["id", "created_at", "updated_at", "username", "password", "role", "email"])
                    .values_panic([seeded_id(i), time.clone(), time.clone(), username.into(), hashed_password.into(), Expr::val("user").cast_as("role_type"), email.into()])
                    .to_owned()
            ).await?;
        }

        // Create an admin

        let hashed_password = &sha2::Sha256::digest("admin:admin")[..];

        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns(["id", "created_at", "updated_at", "username", "password", "role", "email"])
                .values_panic([seeded_id(ADMIN_ID), time.clone(), time.clone(), "admin".into(), hashed_password.into(), Expr::val("admin").cast_as("role_type"), "admin@telesales.local".into()])
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for i in (1..=AGENT_COUNT).chain([ADMIN_ID]) {
            manager
                .exec_stmt(Query::delete()
                    .from_table(User::Table)
                    .and_where(Expr::col("id").eq(seeded_id(i)))
                    .to_owned()
            ).await?;
        }

        Ok(())
    }
}
