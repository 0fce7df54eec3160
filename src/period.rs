//! Calendar helpers for EPIAS requests.
//!
//! - Request timestamps use the fixed `YYYY-MM-DDT00:00:00+03:00` form
//! - "Today" is the Europe/Istanbul calendar date
//! - Month periods are labelled `"<Month name> <year>"`, e.g. `"March 2024"`
//! - The month picker spans 36 months back to 12 months ahead

use chrono::{Datelike, Days, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Europe::Istanbul;
use thiserror::Error;

pub const MONTHS_BACK: u32 = 36;
pub const MONTHS_AHEAD: u32 = 12;
pub const DEFAULT_LOOKBACK_DAYS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("invalid month period: {0}")]
    InvalidPeriod(String),
    #[error("invalid unix timestamp: {0}")]
    InvalidTimestamp(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first)
    }

    /// Shifts by whole months; saturates at the calendar bounds.
    pub fn shifted(&self, months: i32) -> Self {
        let first = self.first_day();
        let shifted = if months >= 0 {
            first.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            first.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.map(Self::containing).unwrap_or(*self)
    }

    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }

    /// Value of the `period` request field: the first day of the month.
    pub fn epias_value(&self) -> String {
        epias_datetime(self.first_day())
    }

    /// Accepts `"March 2024"` (case-insensitive, full or abbreviated month)
    /// and `"2024-03"`.
    pub fn parse(input: &str) -> Result<Self, PeriodError> {
        let trimmed = input.trim();
        let invalid = || PeriodError::InvalidPeriod(input.to_string());

        if let Some((year, month)) = trimmed.split_once('-') {
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let month: u32 = month.parse().map_err(|_| invalid())?;
            return Self::new(year, month).ok_or_else(invalid);
        }

        for format in ["%d %B %Y", "%d %b %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&format!("01 {trimmed}"), format) {
                return Ok(Self::containing(date));
            }
        }
        Err(invalid())
    }
}

/// EPIAS request timestamp for the start of `date`.
pub fn epias_datetime(date: NaiveDate) -> String {
    format!("{}T00:00:00+03:00", date.format("%Y-%m-%d"))
}

pub fn market_date_at(now_ts_utc: i64) -> Result<NaiveDate, PeriodError> {
    Utc.timestamp_opt(now_ts_utc, 0)
        .single()
        .map(|now| now.with_timezone(&Istanbul).date_naive())
        .ok_or(PeriodError::InvalidTimestamp(now_ts_utc))
}

pub fn market_today() -> NaiveDate {
    Utc::now().with_timezone(&Istanbul).date_naive()
}

/// `[today - 30 days, today]`.
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
        .unwrap_or(today);
    (start, today)
}

/// Month picker entries, oldest first, from 36 months before `today`'s month
/// to 12 months after it.
pub fn month_options(today: NaiveDate) -> Vec<MonthPeriod> {
    let current = MonthPeriod::containing(today);
    (-(MONTHS_BACK as i32)..=MONTHS_AHEAD as i32)
        .map(|offset| current.shifted(offset))
        .collect()
}
