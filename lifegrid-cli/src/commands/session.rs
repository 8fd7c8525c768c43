use anyhow::Result;
use lifegrid_core::{LifeGridError, SessionProvider, UserId, UserProfile};
use owo_colors::OwoColorize;

use crate::app::App;

pub async fn login(
    app: &App,
    user: String,
    name: Option<String>,
    avatar: Option<String>,
) -> Result<()> {
    let id = UserId::new(user);
    let mut profile = UserProfile::new(id.clone(), name.unwrap_or_else(|| id.to_string()));
    profile.avatar_url = avatar;

    let profile = app.history.register(profile).await?;
    app.session.sign_in(id)?;

    println!("{}", format!("Signed in as {}", profile.display_name).green());

    if profile.needs_onboarding() {
        println!();
        println!("Next, set your birth date:");
        println!("  lifegrid onboard YYYY-MM-DD");
    }

    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    if app.session.current_user_id().is_none() {
        println!("{}", "Not signed in".dimmed());
        return Ok(());
    }

    app.session.sign_out()?;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    let user = app.user()?;

    let profile = match app.history.profile(&user).await {
        Ok(profile) => profile,
        Err(LifeGridError::UserNotFound(_)) => {
            println!("{} {}", user, "(no profile)".dimmed());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} {}", profile.display_name.bold(), format!("({user})").dimmed());
    if let Some(avatar) = &profile.avatar_url {
        println!("  Avatar:  {avatar}");
    }
    match profile.birth_date {
        Some(date) => println!("  Born:    {}", date.format("%B %-d, %Y")),
        None => println!("  Born:    {}", "not set".dimmed()),
    }

    let events = app.history.events_of(&user).await?;
    println!("  Events:  {}", events.len());

    Ok(())
}
