//! Payroll settlement math.
//!
//! Gross pay is proportional to the days worked in a half-month. Outstanding
//! salary advances are then collected from it as a queue, oldest approval
//! first: a cycle only reaches the next advance once the ones before it are
//! paid off. Everything here is pure: the same advance snapshot
//! always yields the same [`DeductionPlan`], which is what lets a preview and
//! the later write of that plan agree line for line.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{consts::BALANCE_DUST_SCALE, entity::advance, error::PayrollError};

/// Half-up, applied to the daily rate, the gross amount and receipt figures
pub const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPay {
    pub daily_rate: i64,
    pub gross: i64,
}

/// One advance's share of a settlement cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub advance_id: Uuid,
    pub amount: Decimal,
    pub installments: i32,
    pub balance_before: Decimal,
    pub installment_amount: Decimal,
    pub deducted: Decimal,
    pub balance_after: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPlan {
    pub lines: Vec<DeductionLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub gross: GrossPay,
    pub deductions: DeductionPlan,
    pub net: Decimal,
}

/// Computes the daily rate and the gross amount for a half-month.
///
/// The gross is `round(base_salary * days_worked / expected_days)` rather
/// than `daily_rate * days_worked`, so full attendance pays exactly
/// `base_salary`.
pub fn gross_pay(base_salary: i64, expected_days: i64, days_worked: i64) -> Result<GrossPay, PayrollError> {
    if base_salary < 0 {
        return Err(PayrollError::validation("base salary cannot be negative"));
    }
    if expected_days <= 0 {
        return Err(PayrollError::validation("expected days must be positive"));
    }
    if days_worked < 0 {
        return Err(PayrollError::validation("days worked cannot be negative"));
    }
    if days_worked > expected_days {
        return Err(PayrollError::validation(format!(
            "days worked ({days_worked}) cannot exceed expected days ({expected_days})"
        )));
    }

    let base = Decimal::from(base_salary);
    let expected = Decimal::from(expected_days);

    let daily_rate = (base / expected).round_dp_with_strategy(0, ROUNDING);
    let gross = (base * Decimal::from(days_worked) / expected).round_dp_with_strategy(0, ROUNDING);

    Ok(GrossPay {
        daily_rate: to_whole(daily_rate)?,
        gross: to_whole(gross)?,
    })
}

fn to_whole(value: Decimal) -> Result<i64, PayrollError> {
    i64::try_from(value).map_err(|_| PayrollError::validation("amount is out of range"))
}

/// Unrounded share of `amount` collected per cycle
pub fn installment_amount(amount: Decimal, installments: i32) -> Decimal {
    amount / Decimal::from(installments.max(1))
}

/// Plans one collection cycle over a worker's advances.
///
/// Only advances that are approved or in collection and still owe a
/// balance take part, oldest approval first. Each one is charged at most one
/// installment, and the cycle stops at the first advance that still owes
/// something afterwards.
///
/// Fails with a validation error when the cycle's total does not fit a
/// [`Decimal`].
pub fn plan_deductions(advances: &[advance::Model]) -> Result<DeductionPlan, PayrollError> {
    let mut collectible = advances
        .iter()
        .filter(|a| a.status.is_collectible() && a.remaining_balance > Decimal::ZERO)
        .collect::<Vec<_>>();

    collectible.sort_by_key(|a| (a.approved_at, a.id));

    let mut lines = Vec::new();
    let mut total = Decimal::ZERO;
    for advance in collectible {
        let Some(line) = deduction_line(advance) else {
            continue;
        };

        total = total
            .checked_add(line.deducted)
            .ok_or_else(|| PayrollError::validation("deduction total is out of range"))?;

        let settled = line.balance_after.is_zero();
        lines.push(line);

        if !settled {
            break;
        }
    }

    Ok(DeductionPlan { lines, total })
}

fn deduction_line(advance: &advance::Model) -> Option<DeductionLine> {
    let balance_before = advance.remaining_balance;
    let installment_amount = installment_amount(advance.amount, advance.installments);

    let mut deducted = installment_amount.min(balance_before);
    if balance_before - deducted < Decimal::new(1, BALANCE_DUST_SCALE) {
        deducted = balance_before;
    }

    if deducted <= Decimal::ZERO {
        return None;
    }

    Some(DeductionLine {
        advance_id: advance.id,
        amount: advance.amount,
        installments: advance.installments,
        balance_before,
        installment_amount,
        deducted,
        balance_after: balance_before - deducted,
    })
}

/// Gross minus deductions, never below zero
pub fn net_total(gross: i64, deducted: Decimal) -> Decimal {
    (Decimal::from(gross) - deducted).max(Decimal::ZERO)
}

pub fn settle(
    base_salary: i64,
    expected_days: i64,
    days_worked: i64,
    advances: &[advance::Model],
) -> Result<Settlement, PayrollError> {
    let gross = gross_pay(base_salary, expected_days, days_worked)?;
    let deductions = plan_deductions(advances)?;
    let net = net_total(gross.gross, deductions.total);

    Ok(Settlement { gross, deductions, net })
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, Local};
    use rust_decimal_macros::dec;

    use crate::{entity::sea_orm_active_enums::AdvanceStatus, ledger};

    use super::*;

    pub(crate) fn approved_advance(amount: Decimal, installments: i32, approved_days_ago: i64) -> advance::Model {
        let approved_at = (Local::now() - Duration::days(approved_days_ago)).fixed_offset();

        advance::Model {
            id: Uuid::new_v4(),
            created_at: approved_at,
            updated_at: approved_at,
            worker_id: Uuid::new_v4(),
            amount,
            installments,
            remaining_balance: amount,
            status: AdvanceStatus::Approved,
            notes: None,
            approved_by: Some(Uuid::new_v4()),
            requested_at: approved_at,
            approved_at: Some(approved_at),
            rejected_at: None,
            completed_at: None,
        }
    }

    /// Runs settlement cycles against a single advance until nothing is left to collect
    fn collect_until_done(mut advance: advance::Model) -> (Vec<Decimal>, advance::Model) {
        let mut deducted = Vec::new();

        loop {
            let plan = plan_deductions(std::slice::from_ref(&advance)).unwrap();
            let Some(line) = plan.lines.first() else {
                break;
            };

            deducted.push(line.deducted);
            advance = ledger::collect(&advance, line, Local::now().fixed_offset());

            assert!(deducted.len() <= 100, "advance never completes");
        }

        (deducted, advance)
    }

    #[test]
    fn test_gross_full_attendance_is_exact() {
        let pay = gross_pay(200_000, 10, 10).unwrap();
        assert_eq!(pay.gross, 200_000);
        assert_eq!(pay.daily_rate, 20_000);

        // 200000 / 11 = 18181.8..., still exact at full attendance
        let pay = gross_pay(200_000, 11, 11).unwrap();
        assert_eq!(pay.gross, 200_000);
        assert_eq!(pay.daily_rate, 18_182);
    }

    #[test]
    fn test_gross_is_proportional() {
        assert_eq!(gross_pay(200_000, 10, 5).unwrap().gross, 100_000);
        assert_eq!(gross_pay(200_000, 10, 0).unwrap().gross, 0);

        // 200000 * 7 / 11 = 127272.72..., while 18182 * 7 would be 127274
        assert_eq!(gross_pay(200_000, 11, 7).unwrap().gross, 127_273);
    }

    #[test]
    fn test_gross_rounds_half_up() {
        // 5 / 2 = 2.5
        assert_eq!(gross_pay(5, 2, 1).unwrap().gross, 3);
        assert_eq!(gross_pay(5, 2, 2).unwrap().daily_rate, 3);
    }

    #[test]
    fn test_gross_rejects_invalid_days() {
        assert!(matches!(gross_pay(200_000, 0, 0), Err(PayrollError::Validation(_))));
        assert!(matches!(gross_pay(200_000, 10, -1), Err(PayrollError::Validation(_))));
        assert!(matches!(gross_pay(200_000, 10, 11), Err(PayrollError::Validation(_))));
    }

    #[test]
    fn test_single_installment_completes_at_once() {
        let advance = approved_advance(dec!(35000), 1, 1);

        let plan = plan_deductions(std::slice::from_ref(&advance)).unwrap();
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].deducted, dec!(35000));
        assert_eq!(plan.lines[0].balance_after, Decimal::ZERO);

        let (deducted, advance) = collect_until_done(advance);
        assert_eq!(deducted, vec![dec!(35000)]);
        assert_eq!(advance.status, AdvanceStatus::Completed);
    }

    #[test]
    fn test_single_installment_takes_partial_balance() {
        let mut advance = approved_advance(dec!(35000), 1, 1);
        advance.remaining_balance = dec!(12000);
        advance.status = AdvanceStatus::InCollection;

        let plan = plan_deductions(&[advance]).unwrap();
        assert_eq!(plan.total, dec!(12000));
    }

    #[test]
    fn test_collection_conserves_amount() {
        for (amount, installments) in [(dec!(50000), 2), (dec!(30000), 3), (dec!(10000), 4), (dec!(100), 8), (dec!(1000.50), 3)] {
            let (deducted, advance) = collect_until_done(approved_advance(amount, installments, 1));

            assert_eq!(deducted.iter().copied().sum::<Decimal>(), amount, "{amount} over {installments}");
            assert_eq!(deducted.len(), installments as usize, "{amount} over {installments}");
            assert_eq!(advance.remaining_balance, Decimal::ZERO);
            assert_eq!(advance.status, AdvanceStatus::Completed);
        }
    }

    #[test]
    fn test_non_terminating_installments_complete_on_schedule() {
        let (deducted, advance) = collect_until_done(approved_advance(dec!(100000), 3, 1));

        assert_eq!(deducted.len(), 3);
        assert_eq!(advance.status, AdvanceStatus::Completed);
        assert_eq!(advance.remaining_balance, Decimal::ZERO);
        assert_eq!(deducted.iter().copied().sum::<Decimal>().round_dp(2), dec!(100000));
    }

    #[test]
    fn test_preview_is_idempotent() {
        let advances = vec![
            approved_advance(dec!(30000), 3, 5),
            approved_advance(dec!(10000), 1, 2),
        ];

        assert_eq!(plan_deductions(&advances).unwrap(), plan_deductions(&advances).unwrap());
    }

    #[test]
    fn test_fifo_partial_installment_blocks_newer_advance() {
        let older = approved_advance(dec!(30000), 3, 10);
        let newer = approved_advance(dec!(10000), 1, 1);

        // Input order must not matter
        let plan = plan_deductions(&[newer.clone(), older.clone()]).unwrap();

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].advance_id, older.id);
        assert_eq!(plan.lines[0].deducted, dec!(10000));
        assert_eq!(plan.lines[0].balance_after, dec!(20000));
        assert_eq!(plan.total, dec!(10000));
    }

    #[test]
    fn test_fifo_settled_advance_lets_next_one_through() {
        let mut older = approved_advance(dec!(30000), 3, 10);
        older.remaining_balance = dec!(10000);
        older.status = AdvanceStatus::InCollection;
        let newer = approved_advance(dec!(20000), 2, 1);

        let plan = plan_deductions(&[newer.clone(), older.clone()]).unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].advance_id, older.id);
        assert_eq!(plan.lines[0].balance_after, Decimal::ZERO);
        assert_eq!(plan.lines[1].advance_id, newer.id);
        assert_eq!(plan.lines[1].deducted, dec!(10000));
        assert_eq!(plan.total, dec!(20000));
    }

    #[test]
    fn test_fifo_drains_queue_over_cycles() {
        let mut advances = vec![
            approved_advance(dec!(30000), 3, 10),
            approved_advance(dec!(10000), 1, 1),
        ];
        let now = Local::now().fixed_offset();

        let mut totals = Vec::new();
        loop {
            let plan = plan_deductions(&advances).unwrap();
            if plan.lines.is_empty() {
                break;
            }

            totals.push(plan.total);
            for line in &plan.lines {
                let advance = advances.iter_mut().find(|a| a.id == line.advance_id).unwrap();
                *advance = ledger::collect(advance, line, now);
            }
        }

        // The newer advance rides along once the older one is paid off
        assert_eq!(totals, vec![dec!(10000), dec!(10000), dec!(20000)]);
        assert!(advances.iter().all(|a| a.status == AdvanceStatus::Completed));
    }

    #[test]
    fn test_inactive_advances_are_ignored() {
        let mut requested = approved_advance(dec!(10000), 1, 3);
        requested.status = AdvanceStatus::Requested;
        requested.approved_at = None;

        let mut rejected = approved_advance(dec!(10000), 1, 3);
        rejected.status = AdvanceStatus::Rejected;

        let mut completed = approved_advance(dec!(10000), 1, 3);
        completed.status = AdvanceStatus::Completed;
        completed.remaining_balance = Decimal::ZERO;

        let mut drained = approved_advance(dec!(10000), 2, 3);
        drained.status = AdvanceStatus::InCollection;
        drained.remaining_balance = Decimal::ZERO;

        let plan = plan_deductions(&[requested, rejected, completed, drained]).unwrap();
        assert!(plan.lines.is_empty());
        assert_eq!(plan.total, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_total_is_rejected() {
        let huge = dec!(50000000000000000000000000000);
        let advances = [approved_advance(huge, 1, 2), approved_advance(huge, 1, 1)];

        assert!(matches!(plan_deductions(&advances), Err(PayrollError::Validation(_))));
        assert!(matches!(settle(200_000, 10, 10, &advances), Err(PayrollError::Validation(_))));

        // Either one alone still settles in full
        let plan = plan_deductions(&advances[..1]).unwrap();
        assert_eq!(plan.total, huge);
    }

    #[test]
    fn test_net_is_never_negative() {
        assert_eq!(net_total(100_000, dec!(250000)), Decimal::ZERO);
        assert_eq!(net_total(0, dec!(1)), Decimal::ZERO);
        assert_eq!(net_total(100_000, dec!(25000.5)), dec!(74999.5));

        let settlement = settle(200_000, 10, 1, &[approved_advance(dec!(50000), 1, 1)]).unwrap();
        assert_eq!(settlement.gross.gross, 20_000);
        assert_eq!(settlement.deductions.total, dec!(50000));
        assert_eq!(settlement.net, Decimal::ZERO);
    }

    #[test]
    fn test_end_to_end_settlement() {
        let advance = approved_advance(dec!(50000), 2, 1);

        let settlement = settle(200_000, 10, 10, std::slice::from_ref(&advance)).unwrap();
        assert_eq!(settlement.gross.gross, 200_000);
        assert_eq!(settlement.deductions.lines[0].installment_amount, dec!(25000));
        assert_eq!(settlement.deductions.total, dec!(25000));
        assert_eq!(settlement.net, dec!(175000));

        let advance = ledger::collect(&advance, &settlement.deductions.lines[0], Local::now().fixed_offset());
        assert_eq!(advance.remaining_balance, dec!(25000));
        assert_eq!(advance.status, AdvanceStatus::InCollection);
        assert_eq!(advance.completed_at, None);
    }
}
