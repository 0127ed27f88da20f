//! Applies the payroll schema. From this directory run `cargo run -- up`,
//! `down`, `status` or `fresh` with `DATABASE_URL` set.

use sea_orm_migration::prelude::*;

#[async_std::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
