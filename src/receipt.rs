use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{entity::{payroll_record, user}, settlement::{self, DeductionLine, DeductionPlan, ROUNDING}};

/// Printable summary of a payroll record.
///
/// `total_deducted` and `net` are the figures booked on the record. `lines`
/// describe the collection a recalculation would make against the worker's
/// advances as they stand now, and `next_deducted` and `projected_net` are
/// totalled from those lines alone.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub worker: String,
    pub period: String,
    pub half_month: i16,
    pub expected_days: i32,
    pub days_worked: i32,
    pub base_salary: i64,
    pub daily_rate: i64,
    pub gross: i64,
    pub lines: Vec<DeductionLine>,
    pub total_deducted: Decimal,
    pub net: Decimal,
    pub next_deducted: Decimal,
    pub projected_net: Decimal,
}

impl Receipt {
    pub fn new(worker: &user::Model, record: &payroll_record::Model, breakdown: &DeductionPlan) -> Self {
        Self {
            worker: worker.username.clone(),
            period: record.period.clone(),
            half_month: record.half_month,
            expected_days: record.expected_days,
            days_worked: record.days_worked,
            base_salary: record.base_salary,
            daily_rate: record.daily_rate,
            gross: record.gross_amount,
            lines: breakdown.lines.clone(),
            total_deducted: record.deducted_amount,
            net: record.total,
            next_deducted: breakdown.total,
            projected_net: settlement::net_total(record.gross_amount, breakdown.total),
        }
    }

    pub fn subject(&self) -> String {
        format!("Payroll {} half {} - {}", self.period, self.half_month, self.worker)
    }
}

/// Money as shown to people: whole currency units, half-up
fn whole(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, ROUNDING)
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PAYROLL RECEIPT")?;
        writeln!(f, "Worker:        {}", self.worker)?;
        writeln!(f, "Period:        {} (half {})", self.period, self.half_month)?;
        writeln!(f, "Days worked:   {} of {}", self.days_worked, self.expected_days)?;
        writeln!(f, "Base salary:   {}", self.base_salary)?;
        writeln!(f, "Daily rate:    {}", self.daily_rate)?;
        writeln!(f, "Gross:         {}", self.gross)?;
        writeln!(f, "Deducted:      {}", whole(self.total_deducted))?;
        write!(f, "Net:           {}", whole(self.net))?;

        if !self.lines.is_empty() {
            writeln!(f)?;
            writeln!(f)?;
            writeln!(f, "Next collection from outstanding advances")?;

            for line in &self.lines {
                writeln!(
                    f,
                    "  {}  amount {} in {}  balance {} -> {}  deducted {}",
                    line.advance_id,
                    whole(line.amount),
                    line.installments,
                    whole(line.balance_before),
                    whole(line.balance_after),
                    whole(line.deducted),
                )?;
            }

            writeln!(f, "  Next deducted: {}", whole(self.next_deducted))?;
            write!(f, "  Projected net: {}", whole(self.projected_net))?;
        }

        Ok(())
    }
}
