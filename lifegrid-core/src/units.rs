//! What one screen of the grid covers and what each cell stands for.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::LifeGridError;

/// Span of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifeUnit {
    #[default]
    Life,
    Year,
    Month,
}

/// Span of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
}

pub const WEEKS_PER_YEAR: u32 = 52;
pub const WEEKS_PER_MONTH: u32 = 4;

/// Cell sizes that make sense for a view, coarsest first.
pub fn time_unit_options(life: LifeUnit) -> &'static [TimeUnit] {
    match life {
        LifeUnit::Life => &[TimeUnit::Years, TimeUnit::Months, TimeUnit::Weeks],
        LifeUnit::Year => &[TimeUnit::Months, TimeUnit::Weeks],
        LifeUnit::Month => &[TimeUnit::Weeks],
    }
}

impl LifeUnit {
    pub fn default_time_unit(self) -> TimeUnit {
        time_unit_options(self)[0]
    }

    pub fn allows(self, unit: TimeUnit) -> bool {
        time_unit_options(self).contains(&unit)
    }

    /// Number of cells in one view. `None` if `unit` does not fit this view
    /// or the count overflows.
    pub fn cell_count(self, unit: TimeUnit, span_years: u32) -> Option<u32> {
        if !self.allows(unit) {
            return None;
        }
        Some(match (self, unit) {
            (LifeUnit::Life, TimeUnit::Years) => span_years,
            (LifeUnit::Life, TimeUnit::Months) => span_years.checked_mul(12)?,
            (LifeUnit::Life, TimeUnit::Weeks) => span_years.checked_mul(WEEKS_PER_YEAR)?,
            (LifeUnit::Year, TimeUnit::Months) => 12,
            (LifeUnit::Year, TimeUnit::Weeks) => WEEKS_PER_YEAR,
            (LifeUnit::Month, TimeUnit::Weeks) => WEEKS_PER_MONTH,
            _ => return None,
        })
    }
}

/// Zero-based week cell of `date` within its year. The last days of the
/// year fold into week 51.
pub fn week_of_year(date: NaiveDate) -> u32 {
    (date.ordinal0() / 7).min(WEEKS_PER_YEAR - 1)
}

/// Zero-based week cell of `date` within its month. Days 29-31 fold into
/// week 3.
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day0() / 7).min(WEEKS_PER_MONTH - 1)
}

impl fmt::Display for LifeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeUnit::Life => write!(f, "life"),
            LifeUnit::Year => write!(f, "year"),
            LifeUnit::Month => write!(f, "month"),
        }
    }
}

impl FromStr for LifeUnit {
    type Err = LifeGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "life" => Ok(LifeUnit::Life),
            "year" => Ok(LifeUnit::Year),
            "month" => Ok(LifeUnit::Month),
            other => Err(LifeGridError::InvalidInput(format!(
                "Unknown view '{other}' (expected life, year or month)"
            ))),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Years => write!(f, "years"),
            TimeUnit::Months => write!(f, "months"),
            TimeUnit::Weeks => write!(f, "weeks"),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = LifeGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "years" | "year" => Ok(TimeUnit::Years),
            "months" | "month" => Ok(TimeUnit::Months),
            "weeks" | "week" => Ok(TimeUnit::Weeks),
            other => Err(LifeGridError::InvalidInput(format!(
                "Unknown unit '{other}' (expected years, months or weeks)"
            ))),
        }
    }
}
