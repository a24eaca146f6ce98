pub mod onboard;

use crate::tracker::MetricKind;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "fittrack",
    about = "Personal workout, hydration and nutrition tracker"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Serve,
    Water {
        #[command(subcommand)]
        command: IntakeCommands,
    },
    Protein {
        #[command(subcommand)]
        command: IntakeCommands,
    },
    Steps {
        #[command(subcommand)]
        command: StepsCommands,
    },
    Window {
        #[arg(value_enum)]
        metric: MetricKind,
        #[arg(long)]
        date: Option<String>,
    },
    Dashboard {
        #[arg(long)]
        date: Option<String>,
    },
    Plan,
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum IntakeCommands {
    /// Water in liters, protein in grams.
    Add {
        amount: f64,
        /// Treat the water amount as milliliters.
        #[arg(long, default_value_t = false)]
        ml: bool,
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum StepsCommands {
    Set {
        steps: i64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Parse what a watch or tracker reports, e.g. "I walked 8,250 steps."
    Sync {
        text: String,
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkoutCommands {
    Add(WorkoutArgs),
    List {
        #[arg(long)]
        body_part: Option<String>,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: WorkoutArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, clap::Args)]
pub struct WorkoutArgs {
    #[arg(long = "type")]
    pub workout_type: String,
    #[arg(long)]
    pub reps: i64,
    #[arg(long)]
    pub sets: i64,
    #[arg(long)]
    pub equipment: String,
    #[arg(long)]
    pub body_part: String,
    #[arg(long)]
    pub kg: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    Show,
    Set {
        #[arg(long)]
        weight: Option<String>,
        #[arg(long)]
        height: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AiCommands {
    Suggest {
        goals: String,
    },
    Nutrition {
        meal: String,
    },
    Test {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}
