//! Salary advance lifecycle.
//!
//! ```text
//! REQUESTED ──approve──▶ APPROVED ──collect──▶ IN_COLLECTION ──collect──▶ COMPLETED
//!     │                      └──────────────collect (paid off)─────────────▲
//!     └──reject──▶ REJECTED
//! ```
//!
//! The functions here only compute the next state of an advance. Writing it
//! back is up to the caller.

use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use crate::{
    consts::MAX_ADVANCE_AMOUNT,
    entity::{advance, sea_orm_active_enums::AdvanceStatus},
    error::PayrollError,
    settlement::DeductionLine,
};

impl AdvanceStatus {
    /// Whether payroll runs may collect from an advance in this status
    pub fn is_collectible(self) -> bool {
        matches!(self, AdvanceStatus::Approved | AdvanceStatus::InCollection)
    }
}

/// A new advance as the worker asked for it: one installment, nothing collected yet
pub fn request(
    worker_id: Uuid,
    amount: Decimal,
    notes: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<advance::Model, PayrollError> {
    if amount <= Decimal::ZERO {
        return Err(PayrollError::validation("advance amount must be positive"));
    }
    if amount > Decimal::from(MAX_ADVANCE_AMOUNT) {
        return Err(PayrollError::validation(format!("advance amount cannot exceed {MAX_ADVANCE_AMOUNT}")));
    }

    let notes = notes
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty());

    Ok(advance::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        worker_id,
        amount,
        installments: 1,
        remaining_balance: amount,
        status: AdvanceStatus::Requested,
        notes,
        approved_by: None,
        requested_at: now,
        approved_at: None,
        rejected_at: None,
        completed_at: None,
    })
}

pub fn approve(
    advance: &advance::Model,
    installments: i32,
    approver: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<advance::Model, PayrollError> {
    if advance.status != AdvanceStatus::Requested {
        return Err(PayrollError::Conflict("only requested advances can be approved"));
    }
    if installments < 1 {
        return Err(PayrollError::validation("installments must be at least 1"));
    }

    Ok(advance::Model {
        installments,
        remaining_balance: advance.amount,
        status: AdvanceStatus::Approved,
        approved_by: Some(approver),
        approved_at: Some(now),
        updated_at: now,
        ..advance.clone()
    })
}

pub fn reject(
    advance: &advance::Model,
    approver: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<advance::Model, PayrollError> {
    if advance.status != AdvanceStatus::Requested {
        return Err(PayrollError::Conflict("only requested advances can be rejected"));
    }

    Ok(advance::Model {
        status: AdvanceStatus::Rejected,
        approved_by: Some(approver),
        rejected_at: Some(now),
        updated_at: now,
        ..advance.clone()
    })
}

/// Books one planned deduction against its advance
pub fn collect(advance: &advance::Model, line: &DeductionLine, now: DateTimeWithTimeZone) -> advance::Model {
    debug_assert_eq!(advance.id, line.advance_id);

    let remaining_balance = line.balance_after.max(Decimal::ZERO);

    let (status, completed_at) = if remaining_balance.is_zero() {
        (AdvanceStatus::Completed, Some(now))
    } else if advance.status == AdvanceStatus::Approved {
        (AdvanceStatus::InCollection, advance.completed_at)
    } else {
        (advance.status, advance.completed_at)
    };

    advance::Model {
        remaining_balance,
        status,
        completed_at,
        updated_at: now,
        ..advance.clone()
    }
}
