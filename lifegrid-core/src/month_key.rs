//! Month keys (`YYYY-MM`) and date keys (`YYYY-MM-DD`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LifeGridError, LifeGridResult};

/// Canonical identifier of one month cell in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> LifeGridResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(LifeGridError::InvalidInput(format!(
                "Month {month} is out of range (1-12)"
            )));
        }
        Ok(MonthKey { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
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

    /// Number of months since year 0, used for distance arithmetic.
    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    /// `None` when the year leaves the `i32` range.
    fn from_ordinal(ordinal: i64) -> Option<Self> {
        let year = i32::try_from(ordinal.div_euclid(12)).ok()?;
        let month = u32::try_from(ordinal.rem_euclid(12)).ok()? + 1;
        Some(MonthKey { year, month })
    }

    /// Like [`MonthKey::from_ordinal`] but pins to the first or last
    /// representable month.
    fn saturating_from_ordinal(ordinal: i64) -> Self {
        Self::from_ordinal(ordinal).unwrap_or(if ordinal < 0 {
            MonthKey { year: i32::MIN, month: 1 }
        } else {
            MonthKey { year: i32::MAX, month: 12 }
        })
    }

    pub fn succ(&self) -> Self {
        Self::saturating_from_ordinal(self.ordinal() + 1)
    }

    pub fn pred(&self) -> Self {
        Self::saturating_from_ordinal(self.ordinal() - 1)
    }

    /// Key `n` months after this one, saturating at the ends of the year range.
    pub fn plus_months(&self, n: i64) -> Self {
        Self::saturating_from_ordinal(self.ordinal().saturating_add(n))
    }

    /// Key `n` months after this one, or `None` past the year range.
    pub fn checked_plus_months(&self, n: i64) -> Option<Self> {
        Self::from_ordinal(self.ordinal().checked_add(n)?)
    }

    /// Months from `self` to `other` (negative if `other` is earlier).
    pub fn months_until(&self, other: &MonthKey) -> i64 {
        other.ordinal() - self.ordinal()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.first_day()?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    }

    /// The date events snap to when moved into this month. `day` is
    /// clamped to the month's length.
    pub fn canonical_date(&self, day: u32) -> LifeGridResult<NaiveDate> {
        let last = self
            .last_day()
            .ok_or_else(|| LifeGridError::InvalidInput(format!("Month {self} is out of range")))?;
        let day = day.clamp(1, last.day());

        NaiveDate::from_ymd_opt(self.year, self.month, day)
            .ok_or_else(|| LifeGridError::InvalidInput(format!("Month {self} is out of range")))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// Same year form as chrono's `%Y`: four digits, a `-` sign before year 0
/// and a `+` sign after year 9999.
impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            0..=9999 => write!(f, "{:04}-{:02}", self.year, self.month),
            year if year < 0 => write!(f, "-{:04}-{:02}", year.unsigned_abs(), self.month),
            year => write!(f, "+{year}-{:02}", self.month),
        }
    }
}

impl FromStr for MonthKey {
    type Err = LifeGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            LifeGridError::InvalidInput(format!("Invalid month '{s}'. Expected YYYY-MM"))
        };

        let (year, month) = s.trim().rsplit_once('-').ok_or_else(invalid)?;
        if year.is_empty() || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        MonthKey::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = LifeGridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Format a date as the `YYYY-MM-DD` grouping key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a date given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> LifeGridResult<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| LifeGridError::InvalidInput(format!("Invalid date '{s}'. Expected YYYY-MM-DD")))
}

/// Parse an optional birth date. Absent or blank input is `InvalidInput`.
pub fn parse_birth_date(s: Option<&str>) -> LifeGridResult<NaiveDate> {
    match s.map(str::trim) {
        Some(s) if !s.is_empty() => parse_date(s),
        _ => Err(LifeGridError::InvalidInput("No birth date set".into())),
    }
}
