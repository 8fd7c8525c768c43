use anyhow::Result;
use lifegrid_core::grid::month_name;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App, json: bool) -> Result<()> {
    let user = app.user()?;
    let events = app.history.events_of(&user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "No events yet".dimmed());
        return Ok(());
    }

    // Events come back sorted by date; group them by month.
    let mut current_month = None;

    for event in &events {
        let month = event.month_key();

        if current_month != Some(month) {
            if current_month.is_some() {
                println!();
            }
            println!(
                "{}",
                format!("{} {}", month_name(month.month()), month.year()).bold()
            );
            current_month = Some(month);
        }

        println!("  {}", event.render());
    }

    Ok(())
}
