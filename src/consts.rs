/// Half-month base salary used when `HALF_MONTH_SALARY` is not set
pub const DEFAULT_HALF_MONTH_SALARY: i64 = 200_000;

/// Last day of the month that still belongs to the first half
pub const FIRST_HALF_LAST_DAY: u32 = 15;

/// An installment that would leave less than 10^-`BALANCE_DUST_SCALE` on an
/// advance takes the rest of the balance with it
pub const BALANCE_DUST_SCALE: u32 = 2;

/// Largest amount a single advance request may ask for
pub const MAX_ADVANCE_AMOUNT: i64 = 1_000_000_000_000;

pub const TOKEN_LIFETIME_WEEKS: i64 = 1;
