mod commands;
mod config;
mod gemini;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::{
    Counter, ProfileArgs, cmd_adjust, cmd_export, cmd_history, cmd_home, cmd_progress, cmd_scan,
    cmd_settings_set, cmd_settings_show,
};
use crate::config::Config;
use snapcal_core::db::Database;
use snapcal_core::persist;
use snapcal_core::store::Store;
use snapcal_core::summary::MAX_HISTORY_DAYS;

#[derive(Parser)]
#[command(
    name = "snapcal",
    version,
    about = "A photo-first calorie tracker CLI",
    long_about = "\n\n  ███████╗███╗   ██╗ █████╗ ██████╗  ██████╗ █████╗ ██╗
  ██╔════╝████╗  ██║██╔══██╗██╔══██╗██╔════╝██╔══██╗██║
  ███████╗██╔██╗ ██║███████║██████╔╝██║     ███████║██║
  ╚════██║██║╚██╗██║██╔══██║██╔═══╝ ██║     ██╔══██║██║
  ███████║██║ ╚████║██║  ██║██║     ╚██████╗██║  ██║███████╗
  ╚══════╝╚═╝  ╚═══╝╚═╝  ╚═╝╚═╝      ╚═════╝╚═╝  ╚═╝╚══════╝
        snap a photo, know what you're eating.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's calories left, macros, water and meals
    Home {
        /// Date to show (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weight, BMI and logging streak
    Progress {
        /// Days to average calories over
        #[arg(long, default_value = "7", value_parser = days_in_range())]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or edit the profile and daily goals
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Photograph a meal: analyze the image and log the detected foods
    Scan {
        /// Path to the meal photo
        image: PathBuf,
        /// Meal name (default: the detected item names)
        #[arg(short, long)]
        name: Option<String>,
        /// Log the result without asking
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set water intake in fl oz
    Water {
        /// Amount in fl oz (negative values are stored as 0)
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        /// Add to the current amount instead of replacing it
        #[arg(long)]
        add: bool,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set calories burned
    Burned {
        /// Calories burned (negative values are stored as 0)
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        /// Add to the current amount instead of replacing it
        #[arg(long)]
        add: bool,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily totals for the last N days
    History {
        /// Number of days to show
        #[arg(long, default_value = "7", value_parser = days_in_range())]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the saved state as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the profile and goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update one or more profile fields
    Set {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn days_in_range() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_HISTORY_DAYS))
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Rc::new(Database::open(&config.db_path)?);
    tracing::debug!("Using database at {}", config.db_path.display());

    let mut store = Store::default();
    persist::attach(&mut store, Rc::clone(&db));

    match cli.command {
        Commands::Home { date, json } => cmd_home(&store, date, json),
        Commands::Progress { days, json } => cmd_progress(&store, days, json),
        Commands::History { days, json } => cmd_history(&store, days, json),
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&store, &db, json),
            SettingsCommands::Set { profile, json } => {
                cmd_settings_set(&mut store, &profile, json)
            }
        },
        Commands::Scan {
            image,
            name,
            yes,
            json,
        } => cmd_scan(&mut store, &config, &image, name.as_deref(), yes, json).await,
        Commands::Water {
            amount,
            add,
            date,
            json,
        } => cmd_adjust(&mut store, Counter::Water, amount, add, date, json),
        Commands::Burned {
            amount,
            add,
            date,
            json,
        } => cmd_adjust(&mut store, Counter::CaloriesBurned, amount, add, date, json),
        Commands::Export { output } => cmd_export(&store, output.as_deref()),
    }
}
