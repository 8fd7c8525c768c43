use anyhow::Result;
use lifegrid_core::LifeGridConfig;
use owo_colors::OwoColorize;

use crate::app::App;

pub fn run(app: &App) -> Result<()> {
    let config_path = LifeGridConfig::config_path()?;
    let settings = app.config.grid_settings();

    println!("{}", "Paths".bold());
    println!("  Config:   {}", config_path.display());
    println!("  Data:     {}", app.config.data_path().display());
    println!("  Session:  {}", app.session.path().display());

    println!();
    println!("{}", "Grid".bold());
    println!("  Span:          {} years", settings.span_years);
    println!("  Moves land on: day {}", settings.canonical_day);

    Ok(())
}
