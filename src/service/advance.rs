use rust_decimal::Decimal;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{auth::Actor, entity::{advance, prelude::*, sea_orm_active_enums::AdvanceStatus}, error::{conflict_on_stale, PayrollError}, ledger, utils};

#[derive(Debug, Default, Deserialize)]
pub struct AdvanceFilter {
    pub worker_id: Option<Uuid>,
    pub status: Option<AdvanceStatus>,
}

pub async fn request_advance<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    amount: Decimal,
    notes: Option<String>,
) -> Result<advance::Model, PayrollError> {
    let advance = ledger::request(actor.id, amount, notes, utils::now())?;

    let advance = Advance::insert(advance::ActiveModel {
        id: Set(advance.id),
        created_at: Set(advance.created_at),
        updated_at: Set(advance.updated_at),
        worker_id: Set(advance.worker_id),
        amount: Set(advance.amount),
        installments: Set(advance.installments),
        remaining_balance: Set(advance.remaining_balance),
        status: Set(advance.status),
        notes: Set(advance.notes),
        approved_by: Set(advance.approved_by),
        requested_at: Set(advance.requested_at),
        approved_at: Set(advance.approved_at),
        rejected_at: Set(advance.rejected_at),
        completed_at: Set(advance.completed_at),
    }).exec_with_returning(db).await?;

    info!(advance_id = %advance.id, worker_id = %advance.worker_id, amount = %advance.amount, "Advance requested");

    Ok(advance)
}

pub async fn approve_advance<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    advance: &advance::Model,
    installments: i32,
) -> Result<advance::Model, PayrollError> {
    actor.require_admin()?;

    let approved = ledger::approve(advance, installments, actor.id, utils::now())?;

    let advance = Advance::update(advance::ActiveModel {
        id: Unchanged(approved.id),
        updated_at: Set(approved.updated_at),
        installments: Set(approved.installments),
        remaining_balance: Set(approved.remaining_balance),
        status: Set(approved.status),
        approved_by: Set(approved.approved_by),
        approved_at: Set(approved.approved_at),
        ..Default::default()
    })
    .filter(advance::Column::Status.eq(AdvanceStatus::Requested))
    .exec(db).await
    .map_err(conflict_on_stale("only requested advances can be approved"))?;

    info!(advance_id = %advance.id, installments, approver = %actor.id, "Advance approved");

    Ok(advance)
}

pub async fn reject_advance<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    advance: &advance::Model,
) -> Result<advance::Model, PayrollError> {
    actor.require_admin()?;

    let rejected = ledger::reject(advance, actor.id, utils::now())?;

    let advance = Advance::update(advance::ActiveModel {
        id: Unchanged(rejected.id),
        updated_at: Set(rejected.updated_at),
        status: Set(rejected.status),
        approved_by: Set(rejected.approved_by),
        rejected_at: Set(rejected.rejected_at),
        ..Default::default()
    })
    .filter(advance::Column::Status.eq(AdvanceStatus::Requested))
    .exec(db).await
    .map_err(conflict_on_stale("only requested advances can be rejected"))?;

    info!(advance_id = %advance.id, approver = %actor.id, "Advance rejected");

    Ok(advance)
}

/// Admins may filter by worker; workers always get their own advances
pub async fn list_advances<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    filter: AdvanceFilter,
) -> Result<Vec<advance::Model>, PayrollError> {
    let worker_id = if actor.is_admin() { filter.worker_id } else { Some(actor.id) };

    let mut query = Advance::find()
        .order_by_desc(advance::Column::RequestedAt);

    if let Some(worker_id) = worker_id {
        query = query.filter(advance::Column::WorkerId.eq(worker_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(advance::Column::Status.eq(status));
    }

    Ok(query.all(db).await?)
}

/// Advances payroll runs may still collect from, oldest approval first.
///
/// With `for_update` the rows stay locked until the surrounding transaction
/// ends.
pub async fn active_advances_for<C: ConnectionTrait>(
    db: &C,
    worker_id: Uuid,
    for_update: bool,
) -> Result<Vec<advance::Model>, PayrollError> {
    let mut query = Advance::find()
        .filter(advance::Column::WorkerId.eq(worker_id))
        .filter(advance::Column::Status.is_in([AdvanceStatus::Approved, AdvanceStatus::InCollection]))
        .filter(advance::Column::RemainingBalance.gt(Decimal::ZERO))
        .order_by_asc(advance::Column::ApprovedAt)
        .order_by_asc(advance::Column::Id);

    if for_update {
        query = query.lock_exclusive();
    }

    Ok(query.all(db).await?)
}
