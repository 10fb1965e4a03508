//! FieldPulse CLI - track field work from the terminal
//!
//! Log shifts, trips, fuel, and notes against the same local store document
//! the graphical shells use, and trigger manual pushes/pulls against the
//! sync server.

mod commands;
mod error;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fieldpulse_core::models::{FuelType, Mood};
use fieldpulse_core::store::{LocalStore, Persistence};

use error::CliError;

#[derive(Parser)]
#[command(name = "fieldpulse")]
#[command(about = "Track field work (time, mileage, fuel, notes) from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional directory for the local store document
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Sync server base URL (defaults to $FIELDPULSE_SYNC_URL)
    #[arg(long, value_name = "URL")]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Shift timer
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },
    /// Odometer-based trip tracking
    Trip {
        #[command(subcommand)]
        action: TripAction,
    },
    /// Log a fill-up
    Fuel {
        /// Odometer reading at the pump
        #[arg(long)]
        mileage: f64,
        /// Fuel volume
        #[arg(long)]
        gallons: f64,
        /// Unit price
        #[arg(long)]
        cost_per_gallon: f64,
        /// Station name
        #[arg(long, default_value = "")]
        station: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, value_enum, default_value_t = FuelTypeArg::Regular)]
        fuel_type: FuelTypeArg,
    },
    /// Add a daily note
    Note {
        /// Note content
        content: Vec<String>,
        #[arg(long, value_enum)]
        mood: Option<MoodArg>,
    },
    /// Show local state and the sync target
    Status,
    /// Push the local snapshot to the server now
    Sync,
    /// Pull the server snapshot and merge it into local state
    Pull,
    /// Idempotently ensure the server schema exists
    Migrate,
}

#[derive(Subcommand)]
enum TimerAction {
    /// Start the shift timer
    Start,
    /// Stop the timer and finalize a time entry
    Stop {
        /// Unpaid break minutes to subtract
        #[arg(long, default_value = "0")]
        break_minutes: u32,
    },
}

#[derive(Subcommand)]
enum TripAction {
    /// Start a trip at the given odometer reading
    Start { odometer: f64 },
    /// End the running trip at the given odometer reading
    End { odometer: f64 },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FuelTypeArg {
    Regular,
    Mid,
    Premium,
    Diesel,
}

impl From<FuelTypeArg> for FuelType {
    fn from(value: FuelTypeArg) -> Self {
        match value {
            FuelTypeArg::Regular => Self::Regular,
            FuelTypeArg::Mid => Self::Mid,
            FuelTypeArg::Premium => Self::Premium,
            FuelTypeArg::Diesel => Self::Diesel,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MoodArg {
    Great,
    Good,
    Okay,
    Tough,
}

impl From<MoodArg> for Mood {
    fn from(value: MoodArg) -> Self {
        match value {
            MoodArg::Great => Self::Great,
            MoodArg::Good => Self::Good,
            MoodArg::Okay => Self::Okay,
            MoodArg::Tough => Self::Tough,
        }
    }
}

fn data_dir(cli: &Cli) -> PathBuf {
    cli.data_dir.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fieldpulse")
    })
}

fn server_url(cli: &Cli) -> Option<String> {
    cli.server
        .clone()
        .or_else(|| env::var("FIELDPULSE_SYNC_URL").ok())
        .filter(|url| !url.trim().is_empty())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let store = LocalStore::load(Persistence::new(data_dir(&cli)));
    let server = server_url(&cli);

    match cli.command {
        Commands::Timer { action } => match action {
            TimerAction::Start => commands::timer_start(&store, server.as_deref()).await,
            TimerAction::Stop { break_minutes } => {
                commands::timer_stop(&store, break_minutes, server.as_deref()).await
            }
        },
        Commands::Trip { action } => match action {
            TripAction::Start { odometer } => {
                commands::trip_start(&store, odometer, server.as_deref()).await
            }
            TripAction::End { odometer } => {
                commands::trip_end(&store, odometer, server.as_deref()).await
            }
        },
        Commands::Fuel {
            mileage,
            gallons,
            cost_per_gallon,
            station,
            notes,
            fuel_type,
        } => {
            commands::fuel_add(
                &store,
                commands::FuelArgs {
                    mileage,
                    gallons,
                    cost_per_gallon,
                    station,
                    notes,
                    fuel_type: fuel_type.into(),
                },
                server.as_deref(),
            )
            .await
        }
        Commands::Note { content, mood } => {
            commands::note_add(
                &store,
                &content.join(" "),
                mood.map(Into::into),
                server.as_deref(),
            )
            .await
        }
        Commands::Status => commands::status(&store, server.as_deref()).await,
        Commands::Sync => commands::sync_now(&store, server.as_deref()).await,
        Commands::Pull => commands::pull_now(&store, server.as_deref()).await,
        Commands::Migrate => commands::migrate(server.as_deref()).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
