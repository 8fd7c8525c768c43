//! Moving an event from one month cell to another.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::error::{LifeGridError, LifeGridResult};
use crate::event::{Event, EventId};
use crate::grid::{Grid, Month, MonthPath};
use crate::month_key::MonthKey;

/// Outcome of a successful relocation.
#[derive(Debug, Clone)]
pub struct Relocated {
    pub grid: Grid,
    /// The event as it now sits in the target month.
    pub event: Event,
    pub source: MonthKey,
    pub target: MonthKey,
}

impl Relocated {
    /// The date the store must persist so it matches the grid.
    pub fn target_date(&self) -> NaiveDate {
        self.event.date
    }

    /// Source and target were the same month; nothing needs persisting.
    pub fn is_noop(&self) -> bool {
        self.source == self.target
    }
}

impl Grid {
    /// Move `event_id` out of `source` into `target`, snapping its date to
    /// `canonical_day` of the target month and stamping it with `now`.
    ///
    /// Returns a new grid. Only the decade, year and month nodes on the
    /// two affected paths are rebuilt; every other node is shared with
    /// `self`.
    ///
    /// When `source == target` nothing moves: the event keeps its date and
    /// its `last_modified`, and the returned grid equals `self`. Callers
    /// skip the store write for such a move, so leaving the stamp alone
    /// keeps the grid in step with the stored record.
    pub fn relocate(
        &self,
        event_id: EventId,
        source: MonthKey,
        target: MonthKey,
        canonical_day: u32,
        now: DateTime<Utc>,
    ) -> LifeGridResult<Relocated> {
        let source_path = self
            .locate(&source)
            .ok_or(LifeGridError::MonthNotFound(source))?;
        let target_path = self
            .locate(&target)
            .ok_or(LifeGridError::MonthNotFound(target))?;

        let source_month = self.month_at(source_path);
        let event = source_month
            .event(event_id)
            .ok_or(LifeGridError::EventNotFound {
                event: event_id,
                month: source,
            })?;

        if source == target {
            return Ok(Relocated {
                grid: self.clone(),
                event: event.clone(),
                source,
                target,
            });
        }

        let moved = event.moved_to(target.canonical_date(canonical_day)?, now);

        let mut grid = self.clone();

        let remaining = source_month
            .events
            .iter()
            .filter(|e| e.id != event_id)
            .cloned()
            .collect();
        grid.replace_month(source_path, |month| Month {
            events: remaining,
            ..month.clone()
        });

        let target_events = self
            .month_at(target_path)
            .events
            .iter()
            .cloned()
            .chain(std::iter::once(moved.clone()))
            .collect();
        grid.replace_month(target_path, |month| Month {
            events: target_events,
            ..month.clone()
        });

        Ok(Relocated {
            grid,
            event: moved,
            source,
            target,
        })
    }

    /// [`Grid::relocate`], falling back to an unchanged copy of the grid
    /// when the month or event is missing. The miss is logged.
    pub fn relocate_or_unchanged(
        &self,
        event_id: EventId,
        source: MonthKey,
        target: MonthKey,
        canonical_day: u32,
        now: DateTime<Utc>,
    ) -> Grid {
        match self.relocate(event_id, source, target, canonical_day, now) {
            Ok(relocated) => relocated.grid,
            Err(e) => {
                warn!(%event_id, %source, %target, error = %e, "relocation skipped");
                self.clone()
            }
        }
    }

    fn month_at(&self, path: MonthPath) -> &Month {
        &self.decades[path.decade].years[path.year].months[path.month]
    }

    /// Swap in a new month node at `path`, copying the decade and year
    /// nodes above it only if they are still shared.
    fn replace_month(&mut self, path: MonthPath, f: impl FnOnce(&Month) -> Month) {
        let decade = Arc::make_mut(&mut self.decades[path.decade]);
        let year = Arc::make_mut(&mut decade.years[path.year]);
        let month = f(&year.months[path.month]);
        year.months[path.month] = Arc::new(month);
    }
}
