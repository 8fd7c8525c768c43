//! Optimistic relocation bookkeeping.
//!
//! A drag applies the relocated grid right away and persists the new date
//! in the background. Each attempt is a [`Relocation`] that starts out
//! `Pending` and ends `Committed` or `RolledBack`. The [`RelocationLedger`]
//! numbers attempts so a response that arrives after a newer move of the
//! same event is recognised as stale and ignored.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::error::{LifeGridError, LifeGridResult};
use crate::event::EventId;
use crate::grid::{Grid, Relocated};
use crate::month_key::MonthKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationState {
    Pending,
    Committed,
    RolledBack,
}

impl fmt::Display for RelocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationState::Pending => write!(f, "pending"),
            RelocationState::Committed => write!(f, "committed"),
            RelocationState::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// One attempt to move an event, with the grid to restore on failure.
#[derive(Debug, Clone)]
pub struct Relocation {
    seq: u64,
    event_id: EventId,
    source: MonthKey,
    target: MonthKey,
    target_date: NaiveDate,
    previous: Grid,
    optimistic: Grid,
    state: RelocationState,
}

impl Relocation {
    fn new(seq: u64, previous: &Grid, relocated: Relocated) -> Self {
        Relocation {
            seq,
            event_id: relocated.event.id,
            source: relocated.source,
            target: relocated.target,
            target_date: relocated.target_date(),
            previous: previous.clone(),
            optimistic: relocated.grid,
            state: RelocationState::Pending,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn source(&self) -> MonthKey {
        self.source
    }

    pub fn target(&self) -> MonthKey {
        self.target
    }

    /// Date to persist. Always the one the grid already shows.
    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    pub fn state(&self) -> RelocationState {
        self.state
    }

    /// Grid to render while the store call is in flight.
    pub fn optimistic_grid(&self) -> &Grid {
        &self.optimistic
    }

    pub fn previous_grid(&self) -> &Grid {
        &self.previous
    }

    /// `Pending -> Committed`. Returns the grid to keep showing.
    pub fn commit(&mut self) -> LifeGridResult<&Grid> {
        self.transition(RelocationState::Committed)?;
        Ok(&self.optimistic)
    }

    /// `Pending -> RolledBack`. Returns the grid captured before the move.
    pub fn roll_back(&mut self) -> LifeGridResult<&Grid> {
        self.transition(RelocationState::RolledBack)?;
        Ok(&self.previous)
    }

    fn transition(&mut self, to: RelocationState) -> LifeGridResult<()> {
        if self.state != RelocationState::Pending {
            return Err(LifeGridError::InvalidInput(format!(
                "Relocation #{} is already {}",
                self.seq, self.state
            )));
        }
        self.state = to;
        Ok(())
    }
}

/// How a finished store call should affect what is displayed.
#[derive(Debug)]
pub enum Completion {
    /// Keep the optimistic grid.
    Committed(Grid),
    /// Restore the previous grid; the store call failed with `error`.
    RolledBack { grid: Grid, error: LifeGridError },
    /// A newer relocation of the same event superseded this one.
    Stale,
}

impl Completion {
    /// The grid to display next, or `None` to keep the current one.
    pub fn grid(&self) -> Option<&Grid> {
        match self {
            Completion::Committed(grid) | Completion::RolledBack { grid, .. } => Some(grid),
            Completion::Stale => None,
        }
    }
}

/// Hands out sequence numbers and remembers the newest one per event.
#[derive(Debug, Default)]
pub struct RelocationLedger {
    next_seq: u64,
    latest: HashMap<EventId, u64>,
}

impl RelocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new attempt. `previous` is the grid shown before the drag.
    pub fn start(&mut self, previous: &Grid, relocated: Relocated) -> Relocation {
        self.next_seq += 1;
        let relocation = Relocation::new(self.next_seq, previous, relocated);
        self.latest.insert(relocation.event_id, relocation.seq);
        relocation
    }

    pub fn is_latest(&self, relocation: &Relocation) -> bool {
        self.latest.get(&relocation.event_id) == Some(&relocation.seq)
    }

    /// Number of events with a relocation still in flight.
    pub fn in_flight(&self) -> usize {
        self.latest.len()
    }

    /// Settle `relocation` with the store's answer.
    pub fn complete(
        &mut self,
        relocation: &mut Relocation,
        result: LifeGridResult<()>,
    ) -> LifeGridResult<Completion> {
        let latest = self.is_latest(relocation);
        if latest {
            self.latest.remove(&relocation.event_id);
        }

        match result {
            Ok(()) => {
                let grid = relocation.commit()?.clone();
                Ok(if latest {
                    Completion::Committed(grid)
                } else {
                    Completion::Stale
                })
            }
            Err(error) => {
                let grid = relocation.roll_back()?.clone();
                Ok(if latest {
                    Completion::RolledBack { grid, error }
                } else {
                    Completion::Stale
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventContent, UserId};
    use crate::grid::DEFAULT_SPAN_YEARS;
    use chrono::{TimeZone, Utc};

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn grid() -> Grid {
        let event = Event::new(
            EventId(1),
            UserId::new("user-1"),
            NaiveDate::from_ymd_opt(2020, 3, 10).unwrap(),
            EventContent::Text { text: "trip".into() },
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        Grid::build(
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            &[event],
            DEFAULT_SPAN_YEARS,
        )
        .unwrap()
    }

    fn relocate(grid: &Grid, from: &str, to: &str) -> Relocated {
        grid.relocate(EventId(1), key(from), key(to), 15, Utc::now())
            .unwrap()
    }

    #[test]
    fn commit_keeps_optimistic_grid() {
        let before = grid();
        let mut ledger = RelocationLedger::new();
        let mut relocation = ledger.start(&before, relocate(&before, "2020-03", "2021-07"));

        assert_eq!(relocation.state(), RelocationState::Pending);
        assert_eq!(relocation.target_date().to_string(), "2021-07-15");
        assert_eq!(ledger.in_flight(), 1);

        let completion = ledger.complete(&mut relocation, Ok(())).unwrap();
        assert_eq!(relocation.state(), RelocationState::Committed);
        assert_eq!(ledger.in_flight(), 0);

        let shown = completion.grid().unwrap();
        assert_eq!(shown.month(&key("2021-07")).unwrap().events.len(), 1);
        assert!(shown.month(&key("2020-03")).unwrap().events.is_empty());
    }

    #[test]
    fn failure_restores_previous_grid() {
        let before = grid();
        let mut ledger = RelocationLedger::new();
        let mut relocation = ledger.start(&before, relocate(&before, "2020-03", "2021-07"));

        let completion = ledger
            .complete(
                &mut relocation,
                Err(LifeGridError::Store("offline".into())),
            )
            .unwrap();

        assert_eq!(relocation.state(), RelocationState::RolledBack);
        match completion {
            Completion::RolledBack { grid, error } => {
                assert_eq!(grid, before);
                assert!(matches!(error, LifeGridError::Store(_)));
            }
            other => panic!("Expected rollback, got {:?}", other),
        }
    }

    #[test]
    fn settled_relocation_cannot_transition_again() {
        let before = grid();
        let mut ledger = RelocationLedger::new();
        let mut relocation = ledger.start(&before, relocate(&before, "2020-03", "2021-07"));

        relocation.commit().unwrap();
        assert!(relocation.roll_back().is_err());
        assert!(relocation.commit().is_err());
        assert_eq!(relocation.state(), RelocationState::Committed);
    }

    #[test]
    fn older_response_is_stale() {
        let before = grid();
        let mut ledger = RelocationLedger::new();

        let mut first = ledger.start(&before, relocate(&before, "2020-03", "2021-07"));
        let after_first = first.optimistic_grid().clone();
        let mut second =
            ledger.start(&after_first, relocate(&after_first, "2021-07", "2022-01"));

        assert!(second.seq() > first.seq());
        assert!(!ledger.is_latest(&first));

        // the older call fails after the newer move was made: do not roll back
        let completion = ledger
            .complete(&mut first, Err(LifeGridError::Store("timeout".into())))
            .unwrap();
        assert!(matches!(completion, Completion::Stale));
        assert!(completion.grid().is_none());
        assert_eq!(first.state(), RelocationState::RolledBack);

        let completion = ledger.complete(&mut second, Ok(())).unwrap();
        let shown = completion.grid().unwrap();
        assert_eq!(shown.month(&key("2022-01")).unwrap().events.len(), 1);
    }

    #[test]
    fn different_events_do_not_supersede_each_other() {
        let before = grid();
        let mut ledger = RelocationLedger::new();
        let mut relocation = ledger.start(&before, relocate(&before, "2020-03", "2021-07"));

        ledger.latest.insert(EventId(42), 100);
        assert!(ledger.is_latest(&relocation));

        let completion = ledger.complete(&mut relocation, Ok(())).unwrap();
        assert!(matches!(completion, Completion::Committed(_)));
        assert_eq!(ledger.in_flight(), 1);
    }
}
