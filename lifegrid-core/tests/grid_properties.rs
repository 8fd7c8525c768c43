//! Integration tests for grid partitioning and relocation.
//!
//! Covers: month coverage, event placement, events outside the span,
//! node sharing after a move, and a few fixed scenarios.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use lifegrid_core::{
    Event, EventContent, EventId, Grid, LifeGridError, MonthKey, UserId, grid::DEFAULT_SPAN_YEARS,
};
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn key(s: &str) -> MonthKey {
    s.parse().unwrap()
}

fn event(id: i64, date: NaiveDate) -> Event {
    Event::new(
        EventId(id),
        UserId::new("user-1"),
        date,
        EventContent::Text {
            text: format!("event {id}"),
        },
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

/// Events placed `offset` months after the birth month, on `day`.
fn events_at(birth: NaiveDate, offsets: &[(i64, u32)]) -> Vec<Event> {
    let first = MonthKey::from_date(birth);
    offsets
        .iter()
        .enumerate()
        .map(|(i, (offset, day))| {
            let month = first.plus_months(*offset);
            event(i as i64 + 1, month.canonical_date(*day).unwrap())
        })
        .collect()
}

fn arb_birth_date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2050, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| date(y, m, d))
}

fn arb_offsets() -> impl Strategy<Value = Vec<(i64, u32)>> {
    prop::collection::vec((-24i64..1224, 1u32..=31), 0..40)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn grid_covers_span_without_gaps(birth in arb_birth_date(), span in 1u32..=120) {
        let grid = Grid::build(birth, &[], span).unwrap();

        prop_assert_eq!(grid.month_count(), span as usize * 12);
        prop_assert_eq!(grid.first_month(), Some(MonthKey::from_date(birth)));

        let months: Vec<MonthKey> = grid.months().map(|m| m.id).collect();
        for pair in months.windows(2) {
            prop_assert_eq!(pair[0].succ(), pair[1], "months must be consecutive");
        }

        for (i, decade) in grid.decades().iter().enumerate() {
            prop_assert_eq!(decade.decade, i as u32 + 1);
            prop_assert!(!decade.years.is_empty());
        }
    }

    #[test]
    fn every_event_in_span_appears_exactly_once(
        birth in arb_birth_date(),
        offsets in arb_offsets(),
    ) {
        let events = events_at(birth, &offsets);
        let grid = Grid::build(birth, &events, DEFAULT_SPAN_YEARS).unwrap();
        let first = grid.first_month().unwrap();
        let last = grid.last_month().unwrap();

        let mut inside = 0;
        for event in &events {
            let month = event.month_key();
            let hits = grid
                .months()
                .flat_map(|m| m.events.iter().map(move |e| (m.id, e)))
                .filter(|(_, e)| e.id == event.id)
                .collect::<Vec<_>>();

            if month >= first && month <= last {
                inside += 1;
                prop_assert_eq!(hits.len(), 1);
                prop_assert_eq!(hits[0].0, month);
            } else {
                prop_assert!(hits.is_empty(), "event outside the span must be dropped");
            }
        }

        prop_assert_eq!(grid.event_count(), inside);
    }

    #[test]
    fn relocation_only_touches_two_months(
        birth in arb_birth_date(),
        offsets in prop::collection::vec((0i64..1200, 1u32..=28), 1..20),
        pick in any::<prop::sample::Index>(),
        target_offset in 0i64..1200,
    ) {
        let events = events_at(birth, &offsets);
        let grid = Grid::build(birth, &events, DEFAULT_SPAN_YEARS).unwrap();

        let moving = &events[pick.index(events.len())];
        let source = moving.month_key();
        let target = MonthKey::from_date(birth).plus_months(target_offset);

        let relocated = grid
            .relocate(moving.id, source, target, 15, Utc::now())
            .unwrap();
        let after = &relocated.grid;

        prop_assert_eq!(after.month_count(), grid.month_count());
        prop_assert_eq!(after.event_count(), grid.event_count());
        prop_assert_eq!(after.find_event(moving.id).unwrap().0, target);

        for (old, new) in grid.months().zip(after.months()) {
            if old.id != source && old.id != target {
                prop_assert_eq!(old, new);
            }
        }

        for (old, new) in grid.decades().iter().zip(after.decades()) {
            let touched = old
                .years
                .iter()
                .any(|y| y.year == source.year() || y.year == target.year());
            if !touched {
                prop_assert!(Arc::ptr_eq(old, new), "untouched decade must be shared");
            }
        }
    }
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn mid_year_birth_with_two_events() {
    let birth = date(1990, 6, 15);
    let events = vec![event(1, date(1991, 2, 3)), event(2, date(1991, 2, 20))];
    let grid = Grid::build(birth, &events, DEFAULT_SPAN_YEARS).unwrap();

    let first_year = grid.year(1990).unwrap();
    assert_eq!(first_year.months.len(), 7);
    assert_eq!(first_year.months[0].id, key("1990-06"));

    let feb = grid.month(&key("1991-02")).unwrap();
    assert_eq!(feb.events.len(), 2);
    assert_eq!(feb.name(), "February");

    let last_year = grid.year(2090).unwrap();
    assert_eq!(last_year.months.len(), 5);
    assert_eq!(grid.last_month(), Some(key("2090-05")));
}

#[test]
fn relocating_snaps_to_the_fifteenth() {
    let birth = date(1990, 6, 15);
    let grid = Grid::build(birth, &[event(1, date(2020, 3, 3))], DEFAULT_SPAN_YEARS).unwrap();

    let relocated = grid
        .relocate(EventId(1), key("2020-03"), key("2024-02"), 15, Utc::now())
        .unwrap();

    assert_eq!(relocated.target_date(), date(2024, 2, 15));
    assert!(grid.month(&key("2020-03")).unwrap().event(EventId(1)).is_some());
    assert!(
        relocated
            .grid
            .month(&key("2020-03"))
            .unwrap()
            .events
            .is_empty()
    );
}

#[test]
fn relocating_outside_the_grid_is_not_found() {
    let birth = date(1990, 6, 15);
    let grid = Grid::build(birth, &[event(1, date(2020, 3, 3))], DEFAULT_SPAN_YEARS).unwrap();

    let err = grid
        .relocate(EventId(1), key("2020-03"), key("1980-01"), 15, Utc::now())
        .unwrap_err();
    assert!(matches!(err, LifeGridError::MonthNotFound(_)));

    let unchanged =
        grid.relocate_or_unchanged(EventId(1), key("2020-03"), key("1980-01"), 15, Utc::now());
    assert_eq!(unchanged, grid);
}

#[test]
fn missing_birth_date_builds_nothing() {
    assert!(matches!(
        Grid::build_from_str(None, &[], DEFAULT_SPAN_YEARS),
        Err(LifeGridError::InvalidInput(_))
    ));
    assert!(matches!(
        Grid::build_from_str(Some("not a date"), &[], DEFAULT_SPAN_YEARS),
        Err(LifeGridError::InvalidInput(_))
    ));
}
