use anyhow::{Context, Result, bail};
use lifegrid_core::{Completion, EventId, MonthKey};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(app: &App, id: i64, target: &str) -> Result<()> {
    let user = app.user()?;
    let target: MonthKey = target
        .parse()
        .with_context(|| format!("'{target}' is not a month. Expected YYYY-MM"))?;

    let grid = app.grid(&user).await?;
    let id = EventId(id);

    let Some((source, _)) = grid.find_event(id) else {
        bail!("Event #{id} is not on your grid");
    };

    if source == target {
        println!("{}", format!("Event #{id} is already in {target}").dimmed());
        return Ok(());
    }

    let relocation = app.history.begin_relocation(&grid, id, source, target)?;

    if let Some((_, moved)) = relocation.optimistic_grid().find_event(id) {
        println!("{} {} {}", source, "→".dimmed(), moved.render());
    }

    let spinner = tui::create_spinner("Saving");
    let completion = app.history.persist_relocation(relocation).await;
    spinner.finish_and_clear();

    match completion? {
        Completion::Committed(grid) => {
            let date = grid
                .find_event(id)
                .map(|(_, e)| e.date.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            println!("{}", format!("Moved #{id} to {date}").green());
            Ok(())
        }
        Completion::RolledBack { error, .. } => {
            println!("{}", format!("Could not move #{id}, it stays in {source}").red());
            Err(error.into())
        }
        Completion::Stale => {
            println!("{}", "A newer move of this event took over".dimmed());
            Ok(())
        }
    }
}
