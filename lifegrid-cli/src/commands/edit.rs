use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lifegrid_core::{EventId, EventPatch, parse_date};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

pub async fn run(
    app: &App,
    id: i64,
    date: Option<String>,
    text: Option<String>,
    images: Vec<PathBuf>,
) -> Result<()> {
    let user = app.user()?;

    let date = date
        .as_deref()
        .map(parse_date)
        .transpose()
        .context("Could not read event date")?;

    for image in &images {
        if !image.is_file() {
            bail!("Image not found: {}", image.display());
        }
    }

    let patch = EventPatch {
        date,
        text,
        image_files: images,
    };
    if patch.is_empty() {
        bail!("Nothing to change. Pass --date, --text or --image.");
    }

    let spinner = tui::create_spinner("Saving");
    let result = app.history.update_event(&user, EventId(id), patch).await;
    spinner.finish_and_clear();

    let event = result?;
    println!("{}", format!("Updated: #{} {}", event.id, event).green());

    Ok(())
}
