mod app;
mod commands;
mod render;
mod utils;

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lifegrid_core::{LifeUnit, TimeUnit};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

#[derive(Parser)]
#[command(name = "lifegrid")]
#[command(about = "Keep your life history as a grid of months")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, creating the profile on first use
    Login {
        user: String,

        /// Display name (defaults to the user id)
        #[arg(long)]
        name: Option<String>,

        /// Avatar image URL
        #[arg(long)]
        avatar: Option<String>,
    },
    Logout,
    Whoami,
    /// Set your birth date (YYYY-MM-DD)
    Onboard { birth_date: String },
    /// Render your life grid
    Grid {
        /// What one screen covers: life, year or month
        #[arg(long, default_value = "life")]
        view: LifeUnit,

        /// What one cell stands for: years, months or weeks
        #[arg(long)]
        unit: Option<TimeUnit>,

        /// Year to show in the year and month views (defaults to this year)
        #[arg(long)]
        year: Option<i32>,

        /// Month (1-12) to show in the month view (defaults to this month)
        #[arg(long)]
        month: Option<u32>,

        /// List the events under the grid
        #[arg(long)]
        all: bool,

        /// Print the grid as JSON
        #[arg(long)]
        json: bool,
    },
    /// List your events
    Events {
        /// Print events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an event
    Add {
        /// Date of the event (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        #[arg(short, long)]
        text: Option<String>,

        /// Image file to attach (repeatable)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },
    /// Change an event's date or text, or attach more images
    Edit {
        id: i64,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        text: Option<String>,

        /// Image file to attach (repeatable)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },
    /// Move an event to another month (YYYY-MM)
    Move { id: i64, month: String },
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show configuration and data paths
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let app = App::load()?;

    match cli.command {
        Commands::Login { user, name, avatar } => {
            commands::session::login(&app, user, name, avatar).await
        }
        Commands::Logout => commands::session::logout(&app),
        Commands::Whoami => commands::session::whoami(&app).await,
        Commands::Onboard { birth_date } => commands::onboard::run(&app, &birth_date).await,
        Commands::Grid {
            view,
            unit,
            year,
            month,
            all,
            json,
        } => {
            let options = commands::grid::GridOptions {
                view,
                unit,
                year,
                month,
                all,
                json,
            };
            commands::grid::run(&app, options).await
        }
        Commands::Events { json } => commands::events::run(&app, json).await,
        Commands::Add { date, text, images } => commands::add::run(&app, &date, text, images).await,
        Commands::Edit {
            id,
            date,
            text,
            images,
        } => commands::edit::run(&app, id, date, text, images).await,
        Commands::Move { id, month } => commands::relocate::run(&app, id, &month).await,
        Commands::Delete { id, force } => commands::delete::run(&app, id, force).await,
        Commands::Config => commands::config::run(&app),
    }
}

/// Logs go to stderr so they never mix with rendered output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LIFEGRID_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "lifegrid=debug,lifegrid_core=debug,info"
        } else {
            "lifegrid=info,lifegrid_core=warn,warn"
        })
    });

    let format = env::var("LIFEGRID_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
