use std::collections::HashSet;

use rust_decimal::Decimal;

use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{auth::Actor, config::PayrollConfig, entity::{advance, payroll_record, prelude::*, sea_orm_active_enums::{PayrollStatus, RoleType}, user}, error::{conflict_on_stale, PayrollError}, ledger, notify::{Notifier, NotifyError}, period::{HalfMonth, Period}, receipt::Receipt, settlement::{self, DeductionPlan, Settlement}, utils};

use super::{advance::active_advances_for, lock_worker};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub period: Period,
    pub half_month: HalfMonth,
    /// Every worker with the `user` role when absent
    #[serde(default)]
    pub worker_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSummary {
    pub created: u64,
    /// Workers that already had a record for the period and half
    pub skipped: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayrollFilter {
    pub period: Option<Period>,
    pub half_month: Option<HalfMonth>,
}

/// A payroll record next to the deductions its worker's advances would take now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollDetail {
    pub record: payroll_record::Model,
    pub breakdown: DeductionPlan,
    /// Total a recalculation would store against the current advances
    pub projected_net: Decimal,
}

/// Plans the next collection cycle for a worker without writing anything
pub async fn preview_settlement<C: ConnectionTrait>(db: &C, worker_id: Uuid) -> Result<DeductionPlan, PayrollError> {
    let advances = active_advances_for(db, worker_id, false).await?;

    settlement::plan_deductions(&advances)
}

/// Plans the next collection cycle and books it against the advances.
///
/// The caller must hold the worker lock in `txn`.
async fn apply_settlement(txn: &DatabaseTransaction, worker_id: Uuid) -> Result<DeductionPlan, PayrollError> {
    let advances = active_advances_for(txn, worker_id, true).await?;
    let plan = settlement::plan_deductions(&advances)?;
    let now = utils::now();

    for line in &plan.lines {
        let Some(advance) = advances.iter().find(|a| a.id == line.advance_id) else {
            continue;
        };

        let collected = ledger::collect(advance, line, now);

        Advance::update(advance::ActiveModel {
            id: Unchanged(collected.id),
            updated_at: Set(collected.updated_at),
            remaining_balance: Set(collected.remaining_balance),
            status: Set(collected.status),
            completed_at: Set(collected.completed_at),
            ..Default::default()
        }).exec(txn).await?;

        info!(
            advance_id = %collected.id,
            %worker_id,
            deducted = %line.deducted,
            remaining = %collected.remaining_balance,
            status = ?collected.status,
            "Advance installment collected"
        );
    }

    Ok(plan)
}

async fn find_record<C: ConnectionTrait>(
    db: &C,
    worker_id: Uuid,
    period: Period,
    half_month: HalfMonth,
) -> Result<Option<payroll_record::Model>, PayrollError> {
    Ok(
        PayrollRecord::find()
            .filter(payroll_record::Column::WorkerId.eq(worker_id))
            .filter(payroll_record::Column::Period.eq(period.to_string()))
            .filter(payroll_record::Column::HalfMonth.eq(i16::from(half_month)))
            .one(db).await?
    )
}

/// Creates the pending payroll records of a half-month.
///
/// Each worker is handled in its own transaction, so one failure does not
/// stop the batch. Workers that already have a record are skipped, which
/// makes the batch safe to run again.
pub async fn generate_payroll(
    db: &DatabaseConnection,
    actor: &Actor,
    config: &PayrollConfig,
    request: GenerateRequest,
) -> Result<GenerateSummary, PayrollError> {
    actor.require_admin()?;

    let GenerateRequest { period, half_month, worker_ids } = request;

    let mut worker_ids = match worker_ids {
        Some(worker_ids) => worker_ids,
        None => User::find()
            .filter(user::Column::Role.eq(RoleType::User))
            .order_by_asc(user::Column::Username)
            .all(db).await?
            .into_iter()
            .map(|worker| worker.id)
            .collect(),
    };

    let mut seen = HashSet::new();
    worker_ids.retain(|id| seen.insert(*id));

    let expected_days = period.expected_working_days(half_month);
    let mut summary = GenerateSummary::default();

    for worker_id in worker_ids {
        match generate_for_worker(db, config, worker_id, period, half_month, expected_days).await {
            Ok(Some(_)) => summary.created += 1,
            Ok(None) => summary.skipped.push(worker_id),
            Err(err) => {
                warn!(%worker_id, %period, half_month = i16::from(half_month), error = %err, "Unable to generate payroll");
                summary.failed.push(worker_id);
            },
        }
    }

    info!(
        %period,
        half_month = i16::from(half_month),
        created = summary.created,
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "Payroll generated"
    );

    Ok(summary)
}

async fn generate_for_worker(
    db: &DatabaseConnection,
    config: &PayrollConfig,
    worker_id: Uuid,
    period: Period,
    half_month: HalfMonth,
    expected_days: i64,
) -> Result<Option<payroll_record::Model>, PayrollError> {
    let txn = db.begin().await?;

    lock_worker(&txn, worker_id).await?;

    if find_record(&txn, worker_id, period, half_month).await?.is_some() {
        return Ok(None);
    }

    // Full attendance until someone corrects it
    let gross = settlement::gross_pay(config.half_month_salary, expected_days, expected_days)?;
    let days = i32::try_from(expected_days).map_err(|_| PayrollError::validation("expected days out of range"))?;

    let deductions = apply_settlement(&txn, worker_id).await?;
    let total = settlement::net_total(gross.gross, deductions.total);
    let now = utils::now();

    let inserted = PayrollRecord::insert(payroll_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        worker_id: Set(worker_id),
        period: Set(period.to_string()),
        half_month: Set(half_month.into()),
        expected_days: Set(days),
        days_worked: Set(days),
        base_salary: Set(config.half_month_salary),
        daily_rate: Set(gross.daily_rate),
        gross_amount: Set(gross.gross),
        deducted_amount: Set(deductions.total),
        total: Set(total),
        status: Set(PayrollStatus::Pending),
        approved_by: Set(None),
        approved_at: Set(None),
        paid_at: Set(None),
    }).exec_with_returning(&txn).await;

    let record = match inserted {
        Ok(record) => record,
        Err(err) => {
            txn.rollback().await?;
            return settle_failed_insert(db, err, worker_id, period, half_month).await;
        },
    };

    txn.commit().await?;

    Ok(Some(record))
}

/// A failed insert is a skip when another run already holds the record for
/// this worker, period and half. Collections made in the rolled back
/// transaction are discarded with it.
async fn settle_failed_insert(
    db: &DatabaseConnection,
    err: DbErr,
    worker_id: Uuid,
    period: Period,
    half_month: HalfMonth,
) -> Result<Option<payroll_record::Model>, PayrollError> {
    let duplicate = matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || find_record(db, worker_id, period, half_month).await?.is_some();

    if !duplicate {
        return Err(err.into());
    }

    info!(%worker_id, %period, half_month = i16::from(half_month), "Payroll record created by a concurrent run");

    Ok(None)
}

/// Corrects attendance and recomputes the record against the current advances.
///
/// Installments already collected stay collected; the new gross only affects
/// this record's totals.
pub async fn edit_days_worked(
    db: &DatabaseConnection,
    actor: &Actor,
    record_id: Uuid,
    days_worked: i32,
) -> Result<payroll_record::Model, PayrollError> {
    actor.require_admin()?;

    let txn = db.begin().await?;

    let record = PayrollRecord::find_by_id(record_id)
        .lock_exclusive()
        .one(&txn).await?
        .ok_or(PayrollError::NotFound("payroll record"))?;

    if record.status == PayrollStatus::Paid {
        return Err(PayrollError::Conflict("paid payroll records cannot be edited"));
    }

    let gross = settlement::gross_pay(record.base_salary, record.expected_days.into(), days_worked.into())?;

    lock_worker(&txn, record.worker_id).await?;
    let deductions = apply_settlement(&txn, record.worker_id).await?;
    let total = settlement::net_total(gross.gross, deductions.total);

    let record = PayrollRecord::update(payroll_record::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(utils::now()),
        days_worked: Set(days_worked),
        daily_rate: Set(gross.daily_rate),
        gross_amount: Set(gross.gross),
        deducted_amount: Set(deductions.total),
        total: Set(total),
        ..Default::default()
    }).exec(&txn).await?;

    txn.commit().await?;

    info!(payroll_id = %record.id, days_worked, total = %record.total, "Payroll days corrected");

    Ok(record)
}

/// Approves a pending record and lets the worker know.
///
/// A failed notification is logged; the approval stands.
pub async fn approve_payroll<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    notifier: &dyn Notifier,
    record: &payroll_record::Model,
) -> Result<payroll_record::Model, PayrollError> {
    actor.require_admin()?;

    match record.status {
        PayrollStatus::Pending => {},
        PayrollStatus::Approved => return Err(PayrollError::Conflict("payroll record is already approved")),
        PayrollStatus::Paid => return Err(PayrollError::Conflict("payroll record is already paid")),
    }

    let now = utils::now();

    let record = PayrollRecord::update(payroll_record::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(now),
        status: Set(PayrollStatus::Approved),
        approved_by: Set(Some(actor.id)),
        approved_at: Set(Some(now)),
        ..Default::default()
    })
    .filter(payroll_record::Column::Status.eq(PayrollStatus::Pending))
    .exec(db).await
    .map_err(conflict_on_stale("payroll record is no longer pending"))?;

    info!(payroll_id = %record.id, approver = %actor.id, "Payroll approved");

    if let Err(err) = notify_approval(db, notifier, &record).await {
        warn!(payroll_id = %record.id, error = %err, "Unable to notify worker of approved payroll");
    }

    Ok(record)
}

async fn notify_approval<C: ConnectionTrait>(
    db: &C,
    notifier: &dyn Notifier,
    record: &payroll_record::Model,
) -> Result<(), NotifyError> {
    let worker = find_worker(db, record.worker_id).await?;

    let Some(address) = worker.email.as_deref() else {
        return Err(NotifyError::NoAddress);
    };

    let breakdown = preview_settlement(db, record.worker_id).await?;
    let receipt = Receipt::new(&worker, record, &breakdown);

    notifier.send(address, &receipt.subject(), &receipt.to_string())
}

async fn find_worker<C: ConnectionTrait>(db: &C, worker_id: Uuid) -> Result<user::Model, PayrollError> {
    User::find_by_id(worker_id)
        .one(db).await?
        .ok_or(PayrollError::NotFound("worker"))
}

pub async fn mark_paid<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    record: &payroll_record::Model,
) -> Result<payroll_record::Model, PayrollError> {
    actor.require_admin()?;

    if record.status != PayrollStatus::Approved {
        return Err(PayrollError::Conflict("only approved payroll records can be paid"));
    }

    let now = utils::now();

    let record = PayrollRecord::update(payroll_record::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(now),
        status: Set(PayrollStatus::Paid),
        paid_at: Set(Some(now)),
        ..Default::default()
    })
    .filter(payroll_record::Column::Status.eq(PayrollStatus::Approved))
    .exec(db).await
    .map_err(conflict_on_stale("payroll record is no longer approved"))?;

    info!(payroll_id = %record.id, "Payroll paid");

    Ok(record)
}

/// Admins may filter by period and half; workers always get their own records
pub async fn list_payroll<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    filter: PayrollFilter,
) -> Result<Vec<payroll_record::Model>, PayrollError> {
    let mut query = PayrollRecord::find()
        .order_by_desc(payroll_record::Column::Period)
        .order_by_desc(payroll_record::Column::HalfMonth)
        .order_by_asc(payroll_record::Column::WorkerId);

    if !actor.is_admin() {
        query = query.filter(payroll_record::Column::WorkerId.eq(actor.id));
    }
    if let Some(period) = filter.period {
        query = query.filter(payroll_record::Column::Period.eq(period.to_string()));
    }
    if let Some(half_month) = filter.half_month {
        query = query.filter(payroll_record::Column::HalfMonth.eq(i16::from(half_month)));
    }

    Ok(query.all(db).await?)
}

pub async fn payroll_detail<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    record: payroll_record::Model,
) -> Result<PayrollDetail, PayrollError> {
    actor.require_owner_or_admin(record.worker_id)?;

    let advances = active_advances_for(db, record.worker_id, false).await?;
    let Settlement { deductions, net, .. } = settlement::settle(
        record.base_salary,
        record.expected_days.into(),
        record.days_worked.into(),
        &advances,
    )?;

    Ok(PayrollDetail { record, breakdown: deductions, projected_net: net })
}

pub async fn payroll_receipt<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    record: &payroll_record::Model,
) -> Result<Receipt, PayrollError> {
    actor.require_owner_or_admin(record.worker_id)?;

    build_receipt(db, record).await
}

async fn build_receipt<C: ConnectionTrait>(db: &C, record: &payroll_record::Model) -> Result<Receipt, PayrollError> {
    let worker = find_worker(db, record.worker_id).await?;
    let breakdown = preview_settlement(db, record.worker_id).await?;

    Ok(Receipt::new(&worker, record, &breakdown))
}
