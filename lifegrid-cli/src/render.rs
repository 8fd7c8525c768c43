//! Terminal rendering for lifegrid types.
//!
//! Layout (which cells exist and what state they are in) is computed
//! without colors so it can be tested; colors are applied when printing.

use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate};
use lifegrid_core::grid::month_name;
use lifegrid_core::units::{WEEKS_PER_MONTH, WEEKS_PER_YEAR, week_of_month, week_of_year};
use lifegrid_core::{Event, EventContent, Grid, LifeUnit, Month, MonthKey, TimeUnit};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Event {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {}",
            format!("#{}", self.id).dimmed(),
            self.date.format("%Y-%m-%d")
        );

        if let Some(text) = self.content.text() {
            line.push(' ');
            line.push_str(text);
        }
        if !matches!(self.content, EventContent::Text { .. }) {
            line.push_str(&format!(" ({})", image_names(self)).cyan().to_string());
        }

        line
    }
}

impl Render for Month {
    fn render(&self) -> String {
        format!("{} {}", self.name(), self.id.year()).bold().to_string()
    }
}

fn image_names(event: &Event) -> String {
    event
        .content
        .images()
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// State of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Before birth or past the end of the grid.
    Outside,
    Lived,
    Ahead,
    /// Holds this many events.
    Marked(usize),
}

impl Cell {
    fn new(in_grid: bool, lived: bool, events: usize) -> Self {
        match (in_grid, events) {
            (false, _) => Cell::Outside,
            (true, n) if n > 0 => Cell::Marked(n),
            (true, _) if lived => Cell::Lived,
            _ => Cell::Ahead,
        }
    }

    fn render(self) -> String {
        match self {
            Cell::Outside => " ".to_string(),
            Cell::Lived => "■".dimmed().to_string(),
            Cell::Ahead => "□".dimmed().to_string(),
            Cell::Marked(_) => "●".green().bold().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub cells: Vec<Cell>,
}

impl Render for Row {
    fn render(&self) -> String {
        let cells: String = self.cells.iter().map(|c| c.render()).collect();
        format!("{:>6}  {}", self.label.dimmed(), cells)
    }
}

/// What part of the grid to lay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub view: LifeUnit,
    pub unit: TimeUnit,
    pub year: i32,
    pub month: u32,
}

/// Lay out `scope` as rows of cells. `today` decides which cells count as
/// lived.
pub fn layout(grid: &Grid, scope: Scope, today: NaiveDate) -> Result<Vec<Row>> {
    let this_month = MonthKey::from_date(today);

    let rows = match (scope.view, scope.unit) {
        (LifeUnit::Life, TimeUnit::Years) => grid
            .decades()
            .iter()
            .map(|decade| Row {
                label: decade.id.clone(),
                cells: decade
                    .years
                    .iter()
                    .map(|year| {
                        let events = year.months.iter().map(|m| m.events.len()).sum();
                        Cell::new(true, year.year <= today.year(), events)
                    })
                    .collect(),
            })
            .collect(),

        (LifeUnit::Life, TimeUnit::Months) => grid
            .years()
            .map(|year| month_row(grid, year.year, this_month))
            .collect(),

        (LifeUnit::Life, TimeUnit::Weeks) => grid
            .years()
            .map(|year| week_row(grid, year.year, today))
            .collect(),

        (LifeUnit::Year, TimeUnit::Months) => {
            require_year(grid, scope.year)?;
            vec![month_row(grid, scope.year, this_month)]
        }

        (LifeUnit::Year, TimeUnit::Weeks) => {
            require_year(grid, scope.year)?;
            vec![week_row(grid, scope.year, today)]
        }

        (LifeUnit::Month, TimeUnit::Weeks) => {
            let key = MonthKey::new(scope.year, scope.month)?;
            let Some(month) = grid.month(&key) else {
                bail!("{key} is not part of your grid");
            };

            let cells = (0..WEEKS_PER_MONTH)
                .map(|week| {
                    let events = month
                        .events
                        .iter()
                        .filter(|e| week_of_month(e.date) == week)
                        .count();
                    let lived = key
                        .first_day()
                        .and_then(|d| d.checked_add_days(chrono::Days::new(u64::from(week) * 7)))
                        .is_some_and(|start| start <= today);
                    Cell::new(true, lived, events)
                })
                .collect();

            vec![Row {
                label: key.to_string(),
                cells,
            }]
        }

        (view, unit) => bail!("A {view} view cannot be shown in {unit}"),
    };

    Ok(rows)
}

fn require_year(grid: &Grid, year: i32) -> Result<()> {
    if grid.year(year).is_none() {
        bail!("{year} is not part of your grid");
    }
    Ok(())
}

/// Twelve cells for `year`, blank where the grid does not reach.
fn month_row(grid: &Grid, year: i32, this_month: MonthKey) -> Row {
    let cells = (1..=12)
        .map(|m| {
            let Ok(key) = MonthKey::new(year, m) else {
                return Cell::Outside;
            };
            match grid.month(&key) {
                Some(month) => Cell::new(true, key <= this_month, month.events.len()),
                None => Cell::Outside,
            }
        })
        .collect();

    Row {
        label: year.to_string(),
        cells,
    }
}

/// Week cells for `year`. A week is in the grid if any of its days is.
/// The last cell runs to the end of the year.
fn week_row(grid: &Grid, year: i32, today: NaiveDate) -> Row {
    let cells = (0..WEEKS_PER_YEAR)
        .map(|week| {
            let start = NaiveDate::from_yo_opt(year, week * 7 + 1);
            let end = if week == WEEKS_PER_YEAR - 1 {
                NaiveDate::from_ymd_opt(year, 12, 31)
            } else {
                NaiveDate::from_yo_opt(year, week * 7 + 7)
            };
            let (Some(start), Some(end)) = (start, end) else {
                return Cell::Outside;
            };

            // A week touches at most two months.
            let in_grid = [start, end]
                .iter()
                .any(|day| grid.month(&MonthKey::from_date(*day)).is_some());

            if !in_grid {
                return Cell::Outside;
            }

            let events = grid
                .year(year)
                .into_iter()
                .flat_map(|y| y.months.iter())
                .flat_map(|m| m.events.iter())
                .filter(|e| week_of_year(e.date) == week)
                .count();
            Cell::new(true, start <= today, events)
        })
        .collect();

    Row {
        label: year.to_string(),
        cells,
    }
}

/// Months in `scope` that hold events, in order.
pub fn months_with_events(grid: &Grid, scope: Scope) -> Vec<&Month> {
    grid.months()
        .filter(|m| !m.events.is_empty())
        .filter(|m| match scope.view {
            LifeUnit::Life => true,
            LifeUnit::Year => m.id.year() == scope.year,
            LifeUnit::Month => m.id.year() == scope.year && m.id.month() == scope.month,
        })
        .collect()
}

pub fn render_legend() -> String {
    format!(
        "{} lived  {} ahead  {} has events",
        Cell::Lived.render(),
        Cell::Ahead.render(),
        Cell::Marked(1).render()
    )
}

pub fn render_title(grid: &Grid, scope: Scope) -> String {
    let title = match scope.view {
        LifeUnit::Life => format!(
            "Life since {} in {}",
            grid.birth_date().format("%B %Y"),
            scope.unit
        ),
        LifeUnit::Year => format!("{} in {}", scope.year, scope.unit),
        LifeUnit::Month => format!("{} {} in weeks", month_name(scope.month), scope.year),
    };
    title.bold().to_string()
}
