use std::{fmt, str::FromStr};

use chrono::{Datelike as _, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{consts::FIRST_HALF_LAST_DAY, error::PayrollError, utils};

/// A payroll month, written as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    first_day: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum HalfMonth {
    /// Days 1 to 15
    First,
    /// Day 16 to the end of the month
    Second,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Months::new(1) - Days::new(1)
    }

    /// Inclusive calendar window of the given half
    pub fn window(&self, half: HalfMonth) -> (NaiveDate, NaiveDate) {
        let first_half_end = self.first_day + Days::new(u64::from(FIRST_HALF_LAST_DAY - 1));

        match half {
            HalfMonth::First => (self.first_day, first_half_end),
            HalfMonth::Second => (first_half_end + Days::new(1), self.last_day()),
        }
    }

    /// Monday to Friday days inside the given half
    pub fn expected_working_days(&self, half: HalfMonth) -> i64 {
        let (start, end) = self.window(half);
        utils::count_working_days(start, end)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PayrollError::validation(format!("`{s}` is not a valid period, expected YYYY-MM"));

        let Some((year, month)) = s.split_once('-') else {
            return Err(invalid());
        };

        if year.len() != 4 || month.len() != 2 || !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Period {
    type Error = PayrollError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

impl TryFrom<i16> for HalfMonth {
    type Error = PayrollError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HalfMonth::First),
            2 => Ok(HalfMonth::Second),
            _ => Err(PayrollError::validation(format!("half month must be 1 or 2, got {value}"))),
        }
    }
}

impl From<HalfMonth> for i16 {
    fn from(value: HalfMonth) -> Self {
        match value {
            HalfMonth::First => 1,
            HalfMonth::Second => 2,
        }
    }
}
