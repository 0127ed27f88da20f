//! Operations over the stored advance ledger and payroll records.
//!
//! Every operation takes the acting user explicitly and checks role and
//! ownership itself. Settlement writes run inside a transaction that holds
//! the worker's row lock, which serializes them per worker.

use sea_orm::{DatabaseTransaction, EntityTrait, QuerySelect};
use uuid::Uuid;

use crate::{entity::{prelude::*, user}, error::PayrollError};

pub mod advance;
pub mod payroll;

/// Takes the per-worker lock for the rest of the transaction
async fn lock_worker(txn: &DatabaseTransaction, worker_id: Uuid) -> Result<user::Model, PayrollError> {
    User::find_by_id(worker_id)
        .lock_exclusive()
        .one(txn).await?
        .ok_or(PayrollError::NotFound("worker"))
}
