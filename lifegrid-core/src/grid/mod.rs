//! The life grid: a decades → years → months projection of a user's events.
//!
//! A [`Grid`] is rebuilt from the birth date and the event list whenever
//! either changes. Nodes are held behind `Arc` so a relocation can hand
//! back a new grid that shares every node it did not touch.

mod build;
mod relocate;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::{Event, EventId};
use crate::month_key::MonthKey;

pub use relocate::Relocated;

/// Number of years a grid covers unless configured otherwise.
pub const DEFAULT_SPAN_YEARS: u32 = 100;

/// Longest span a grid may cover.
pub const MAX_SPAN_YEARS: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    birth_date: NaiveDate,
    span_years: u32,
    decades: Vec<Arc<Decade>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decade {
    pub id: String,
    /// Ordinal within the grid, starting at 1.
    pub decade: u32,
    pub years: Vec<Arc<Year>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Year {
    pub id: String,
    /// Calendar year.
    pub year: i32,
    pub months: Vec<Arc<Month>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Month {
    pub id: MonthKey,
    /// 1-12
    pub month: u32,
    pub events: Vec<Event>,
}

impl Month {
    fn empty(id: MonthKey) -> Self {
        Month {
            id,
            month: id.month(),
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        month_name(self.month)
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}

/// Position of a month node inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonthPath {
    pub decade: usize,
    pub year: usize,
    pub month: usize,
}

impl Grid {
    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn span_years(&self) -> u32 {
        self.span_years
    }

    pub fn decades(&self) -> &[Arc<Decade>] {
        &self.decades
    }

    pub fn years(&self) -> impl Iterator<Item = &Year> {
        self.decades
            .iter()
            .flat_map(|d| d.years.iter())
            .map(|y| y.as_ref())
    }

    pub fn months(&self) -> impl Iterator<Item = &Month> {
        self.years()
            .flat_map(|y| y.months.iter())
            .map(|m| m.as_ref())
    }

    pub fn month_count(&self) -> usize {
        self.months().count()
    }

    pub fn event_count(&self) -> usize {
        self.months().map(|m| m.events.len()).sum()
    }

    pub fn first_month(&self) -> Option<MonthKey> {
        self.months().next().map(|m| m.id)
    }

    pub fn last_month(&self) -> Option<MonthKey> {
        self.months().last().map(|m| m.id)
    }

    pub fn year(&self, year: i32) -> Option<&Year> {
        self.years().find(|y| y.year == year)
    }

    pub fn month(&self, key: &MonthKey) -> Option<&Month> {
        let path = self.locate(key)?;
        Some(self.decades[path.decade].years[path.year].months[path.month].as_ref())
    }

    /// Find an event anywhere in the grid.
    pub fn find_event(&self, id: EventId) -> Option<(MonthKey, &Event)> {
        self.months()
            .find_map(|m| m.event(id).map(|event| (m.id, event)))
    }

    /// Linear search for a month node. The grid holds at most a few
    /// thousand months.
    pub(crate) fn locate(&self, key: &MonthKey) -> Option<MonthPath> {
        self.decades.iter().enumerate().find_map(|(d, decade)| {
            decade.years.iter().enumerate().find_map(|(y, year)| {
                if year.year != key.year() {
                    return None;
                }
                year.months
                    .iter()
                    .position(|m| m.id == *key)
                    .map(|month| MonthPath {
                        decade: d,
                        year: y,
                        month,
                    })
            })
        })
    }
}

/// English name for a month number (1-12).
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("?")
}
