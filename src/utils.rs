use chrono::{Datelike as _, Local, NaiveDate, Weekday};
use sea_orm::prelude::DateTimeWithTimeZone;

pub fn now() -> DateTimeWithTimeZone {
    Local::now().fixed_offset()
}

/// Counts Monday to Friday days between `start` and `end`, both inclusive
pub fn count_working_days(mut start: NaiveDate, end: NaiveDate) -> i64 {
    let mut working_days = 0;

    while start <= end {
        if !matches!(start.weekday(), Weekday::Sat | Weekday::Sun) {
            working_days += 1;
        }

        match start.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }

    working_days
}
