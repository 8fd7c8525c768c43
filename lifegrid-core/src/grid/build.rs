//! Partitioning a life span into decades, years and months.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{LifeGridError, LifeGridResult};
use crate::event::Event;
use crate::grid::{Decade, Grid, MAX_SPAN_YEARS, Month, Year};
use crate::month_key::{MonthKey, parse_birth_date};

/// Events grouped by month, each group ordered by date.
type EventsByMonth = BTreeMap<MonthKey, Vec<Event>>;

impl Grid {
    /// Partition `span_years` years starting at the birth month and bucket
    /// `events` into their month cells.
    ///
    /// The grid covers exactly `span_years * 12` months: the first year
    /// starts at the birth month and the last one stops the month before
    /// it. Events are placed by calendar month, so an event earlier in
    /// the birth month still lands in the first cell. Events in months
    /// outside the span are left out.
    pub fn build(birth_date: NaiveDate, events: &[Event], span_years: u32) -> LifeGridResult<Grid> {
        if !(1..=MAX_SPAN_YEARS).contains(&span_years) {
            return Err(LifeGridError::InvalidInput(format!(
                "Grid must span between 1 and {MAX_SPAN_YEARS} years, got {span_years}"
            )));
        }

        let first = MonthKey::from_date(birth_date);
        let last = first
            .checked_plus_months(i64::from(span_years) * 12 - 1)
            .ok_or_else(|| {
                LifeGridError::InvalidInput(format!("Grid from {birth_date} runs past the year range"))
            })?;
        let by_month = group_by_month(events);

        let start_decade = first.year().div_euclid(10);
        let end_decade = last.year().div_euclid(10);

        let mut decades = Vec::new();

        for (ordinal, calendar_decade) in (start_decade..=end_decade).enumerate() {
            let from = (calendar_decade * 10).max(first.year());
            let to = (calendar_decade * 10 + 9).min(last.year());

            let years = (from..=to)
                .map(|year| build_year(year, first, last, &by_month).map(Arc::new))
                .collect::<LifeGridResult<Vec<_>>>()?;

            decades.push(Arc::new(Decade {
                id: format!("{}s", calendar_decade * 10),
                decade: ordinal as u32 + 1,
                years,
            }));
        }

        let grid = Grid {
            birth_date,
            span_years,
            decades,
        };

        debug!(
            birth_date = %birth_date,
            months = grid.month_count(),
            events = grid.event_count(),
            dropped = events.len() - grid.event_count(),
            "built life grid"
        );

        Ok(grid)
    }

    /// Like [`Grid::build`] but takes the birth date as stored on the
    /// profile. A missing or unparseable date is `InvalidInput`.
    pub fn build_from_str(
        birth_date: Option<&str>,
        events: &[Event],
        span_years: u32,
    ) -> LifeGridResult<Grid> {
        let birth_date = parse_birth_date(birth_date)?;
        Self::build(birth_date, events, span_years)
    }
}

fn group_by_month(events: &[Event]) -> EventsByMonth {
    let mut grouped = EventsByMonth::new();
    for event in events {
        grouped
            .entry(event.month_key())
            .or_default()
            .push(event.clone());
    }
    for month in grouped.values_mut() {
        month.sort_by_key(|event| event.date);
    }
    grouped
}

fn build_year(
    year: i32,
    first: MonthKey,
    last: MonthKey,
    by_month: &EventsByMonth,
) -> LifeGridResult<Year> {
    let months = month_range(year, first, last)?
        .map(|month| {
            let key = MonthKey::new(year, month)?;
            Ok(Arc::new(Month {
                events: events_in_month(&key, by_month),
                ..Month::empty(key)
            }))
        })
        .collect::<LifeGridResult<Vec<_>>>()?;

    Ok(Year {
        id: year.to_string(),
        year,
        months,
    })
}

/// Months of `year` that fall inside `first..=last`.
fn month_range(year: i32, first: MonthKey, last: MonthKey) -> LifeGridResult<RangeInclusive<u32>> {
    let start = if year == first.year() { first.month() } else { 1 };
    let end = if year == last.year() { last.month() } else { 12 };

    if start > end {
        debug_assert!(false, "inverted month range {start}..={end} for {year}");
        return Err(LifeGridError::InvalidRange { year, start, end });
    }

    Ok(start..=end)
}

fn events_in_month(key: &MonthKey, by_month: &EventsByMonth) -> Vec<Event> {
    by_month.get(key).cloned().unwrap_or_default()
}
