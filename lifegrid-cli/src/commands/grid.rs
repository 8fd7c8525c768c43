use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use lifegrid_core::{LifeUnit, TimeUnit, time_unit_options};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::{self, Render, Scope};

pub struct GridOptions {
    pub view: LifeUnit,
    pub unit: Option<TimeUnit>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub all: bool,
    pub json: bool,
}

pub async fn run(app: &App, options: GridOptions) -> Result<()> {
    let user = app.user()?;
    let grid = app.grid(&user).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
        return Ok(());
    }

    let today = Local::now().date_naive();
    let unit = options.unit.unwrap_or(options.view.default_time_unit());

    if !options.view.allows(unit) {
        let allowed: Vec<String> = time_unit_options(options.view)
            .iter()
            .map(|u| u.to_string())
            .collect();
        bail!(
            "A {} view can be shown in: {}",
            options.view,
            allowed.join(", ")
        );
    }

    let scope = Scope {
        view: options.view,
        unit,
        year: options.year.unwrap_or(today.year()),
        month: options.month.unwrap_or(today.month()),
    };

    let rows = render::layout(&grid, scope, today)?;

    println!("{}", render::render_title(&grid, scope));
    println!();
    for row in &rows {
        println!("{}", row.render());
    }
    println!();
    println!("{}", render::render_legend());

    if options.all {
        let months = render::months_with_events(&grid, scope);
        if months.is_empty() {
            println!();
            println!("{}", "No events".dimmed());
        }
        for month in months {
            println!();
            println!("{}", month.render());
            for event in &month.events {
                println!("  {}", event.render());
            }
        }
    }

    Ok(())
}
