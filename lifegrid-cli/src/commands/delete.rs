use anyhow::Result;
use dialoguer::Confirm;
use lifegrid_core::EventId;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App, id: i64, force: bool) -> Result<()> {
    let user = app.user()?;
    let event = app.history.event(&user, EventId(id)).await?;

    println!("{}", event.render());

    if !force {
        let images = event.content.images().len();
        let prompt = if images > 0 {
            format!("Delete this event and its {images} image(s)?")
        } else {
            "Delete this event?".to_string()
        };

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    app.history.delete_event(&user, event.id).await?;
    println!("{}", format!("Deleted #{}", event.id).red());

    Ok(())
}
