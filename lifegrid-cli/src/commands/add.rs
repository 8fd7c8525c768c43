use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lifegrid_core::{NewEvent, parse_date};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

pub async fn run(app: &App, date: &str, text: Option<String>, images: Vec<PathBuf>) -> Result<()> {
    let user = app.user()?;
    let date = parse_date(date).context("Could not read event date")?;

    for image in &images {
        if !image.is_file() {
            bail!("Image not found: {}", image.display());
        }
    }

    let event = NewEvent {
        date,
        text,
        image_files: images,
    };
    event.validate()?;

    let spinner = tui::create_spinner(if event.image_files.is_empty() {
        "Saving".to_string()
    } else {
        format!(
            "Uploading {} {}",
            event.image_files.len(),
            tui::pluralize("image", event.image_files.len())
        )
    });
    let result = app.history.create_event(&user, event).await;
    spinner.finish_and_clear();

    let id = result?;
    let created = app.history.event(&user, id).await?;

    println!("{}", format!("Created: #{id} {created}").green());

    let outside = match app.history.load(&user).await {
        Ok(Some(grid)) => grid.month(&created.month_key()).is_none(),
        _ => false,
    };
    if outside {
        println!(
            "{}",
            "This date is outside your grid, so it will not be shown there.".yellow()
        );
    }

    Ok(())
}
