use anyhow::{Context, Result};
use lifegrid_core::parse_date;
use owo_colors::OwoColorize;

use crate::app::App;

pub async fn run(app: &App, birth_date: &str) -> Result<()> {
    let user = app.user()?;
    let birth_date = parse_date(birth_date).context("Could not read birth date")?;

    let grid = app.history.onboard(&user, birth_date).await?;

    println!(
        "{}",
        format!("Birth date set to {}", birth_date.format("%B %-d, %Y")).green()
    );
    if let (Some(first), Some(last)) = (grid.first_month(), grid.last_month()) {
        println!(
            "Your grid has {} months, {} to {}",
            grid.month_count(),
            first,
            last
        );
    }

    Ok(())
}
