mod ai;
mod api;
mod cli;
mod config;
mod db;
mod tracker;

use crate::cli::onboard::run_onboarding;
use crate::cli::{
    AiCommands, Cli, Commands, ConfigCommands, IntakeCommands, ProfileCommands, StepsCommands,
    WorkoutArgs, WorkoutCommands,
};
use crate::config::Config;
use crate::db::Database;
use crate::tracker::buckets::DailyBucketStore;
use crate::tracker::dashboard::build_dashboard;
use crate::tracker::plan::{focus_for, weekly_plan};
use crate::tracker::profile::{ProfileStore, ProfileUpdate, protein_goal};
use crate::tracker::window::RollingWindowReader;
use crate::tracker::workouts::{BodyPart, WorkoutInput, WorkoutLog};
use crate::tracker::{MetricKind, date_key, parse_date_key};
use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Serve => {
            let config = load_config()?;
            run_service(config).await
        }
        Commands::Water { command } => handle_intake(MetricKind::Water, command),
        Commands::Protein { command } => handle_intake(MetricKind::Protein, command),
        Commands::Steps { command } => handle_steps(command),
        Commands::Window { metric, date } => handle_window(metric, date),
        Commands::Dashboard { date } => handle_dashboard(date),
        Commands::Plan => handle_plan(),
        Commands::Workout { command } => handle_workout(command),
        Commands::Profile { command } => handle_profile(command),
        Commands::Ai { command } => handle_ai_command(command),
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            let masked = if key.contains("api_key") {
                "***hidden***".to_string()
            } else {
                value
            };
            println!("Config saved: {key} = {masked}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let counts = database.collection_counts()?;

    println!("fittrack status");
    println!("- config_path: {}", Config::config_path().display());
    println!("- db_path: {}", config.db_path.display());
    println!("- api_port: {}", config.api_port);
    println!("- ai_enabled: {}", config.ai_enabled);
    println!("- ai_api_key_set: {}", config.resolve_api_key().is_some());
    println!("- daily_stats: {}", counts.daily_stats);
    println!("- water_intake: {}", counts.water_intake);
    println!("- protein_intake: {}", counts.protein_intake);
    println!("- workouts: {}", counts.workouts);

    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let database = open_database(&config)?;

    info!(db_path = %config.db_path.display(), "fittrack service started");

    tokio::select! {
        api_result = api::run_server(Arc::new(config), database) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn handle_intake(metric: MetricKind, command: IntakeCommands) -> Result<()> {
    let IntakeCommands::Add { amount, ml, date } = command;

    let amount = match (metric, ml) {
        (MetricKind::Water, true) => amount / 1000.0,
        (_, true) => bail!("--ml only applies to water"),
        _ => amount,
    };

    let config = load_config()?;
    let database = open_database(&config)?;
    let key = date_key(parse_optional_date(date)?);
    let total = DailyBucketStore::new(&database).apply_delta(&key, metric, amount)?;

    println!("{key} {metric}: {total:.2} {}", metric.unit());
    Ok(())
}

fn handle_steps(command: StepsCommands) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let store = DailyBucketStore::new(&database).with_steps_goal(config.steps_goal);

    match command {
        StepsCommands::Set { steps, date } => {
            let key = date_key(parse_optional_date(date)?);
            store.set_steps(&key, steps)?;
            println!("{key} steps: {steps}");
        }
        StepsCommands::Sync { text, date } => {
            let key = date_key(parse_optional_date(date)?);
            let steps = store.sync_steps_from_text(&key, &text)?;
            println!("{key} steps synced: {steps}");
        }
    }

    Ok(())
}

fn handle_window(metric: MetricKind, date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let today = parse_optional_date(date)?;
    let series = RollingWindowReader::new(&database).get_window(today, metric)?;

    println!("Last 7 days: {metric} ({})", metric.unit());
    for entry in &series.entries {
        println!("- {} {} {:.2}", entry.date, entry.day_label, entry.value);
    }
    println!("total {:.2}, average {:.2}", series.total(), series.average());

    Ok(())
}

fn handle_dashboard(date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let today = parse_optional_date(date)?;
    let summary = build_dashboard(&database, &config, today)?;

    println!("Dashboard {}", summary.date);
    for (label, unit, progress) in [
        ("steps", "", &summary.steps),
        ("water", "L", &summary.water),
        ("protein", "g", &summary.protein),
    ] {
        if progress.goal_reached() {
            println!(
                "- {label}: {:.1}{unit} / {:.1}{unit} ({}%), goal reached",
                progress.value, progress.goal, progress.progress_percent
            );
        } else {
            println!(
                "- {label}: {:.1}{unit} / {:.1}{unit} ({}%), {:.1}{unit} to go",
                progress.value, progress.goal, progress.progress_percent, progress.remaining
            );
        }
    }
    println!(
        "- weight: {}, height: {}",
        summary.profile.weight, summary.profile.height
    );

    Ok(())
}

fn handle_plan() -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let workouts = WorkoutLog::new(&database).list(None)?;

    println!("Today's focus: {}", focus_for(Local::now().weekday()));
    print_json(&weekly_plan(&workouts, &Local))
}

fn handle_workout(command: WorkoutCommands) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let log = WorkoutLog::new(&database);

    match command {
        WorkoutCommands::Add(args) => {
            let workout = log.create(&workout_input(args)?)?;
            println!("Workout logged: {}", workout.id);
        }
        WorkoutCommands::List { body_part } => {
            let filter = body_part
                .as_deref()
                .filter(|value| !value.eq_ignore_ascii_case("all"))
                .map(str::parse::<BodyPart>)
                .transpose()?;
            print_json(&log.list(filter)?)?;
        }
        WorkoutCommands::Update { id, fields } => {
            let workout = log
                .update(&id, &workout_input(fields)?)?
                .with_context(|| format!("No workout found with id: {id}"))?;
            println!("Workout updated: {}", workout.id);
        }
        WorkoutCommands::Delete { id } => {
            if log.delete(&id)? {
                println!("Workout deleted: {id}");
            } else {
                println!("No workout with id {id}; nothing to delete");
            }
        }
    }

    Ok(())
}

fn handle_profile(command: ProfileCommands) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config)?;
    let store = ProfileStore::new(&database);

    let profile = match command {
        ProfileCommands::Show => store.get_or_create()?,
        ProfileCommands::Set { weight, height } => {
            store.update(&ProfileUpdate { weight, height })?
        }
    };

    println!("- weight: {}", profile.weight);
    println!("- height: {}", profile.height);
    println!("- last_updated: {}", profile.last_updated);
    println!(
        "- protein_goal: {:.0} g/day",
        protein_goal(&profile, config.protein_per_kg)
    );

    Ok(())
}

fn handle_ai_command(command: AiCommands) -> Result<()> {
    match command {
        AiCommands::Suggest { goals } => {
            let config = load_config()?;
            let database = open_database(&config)?;
            let workouts = WorkoutLog::new(&database).list(None)?;

            println!("{}", ai::suggest_workouts(&config, &workouts, &goals)?);
            Ok(())
        }
        AiCommands::Nutrition { meal } => {
            let config = load_config()?;
            print_json(&ai::analyze_nutrition(&config, &meal)?)
        }
        AiCommands::Test {
            key,
            base_url,
            model,
        } => {
            let mut config = load_config()?;

            if let Some(value) = key {
                config.ai_api_key = Some(value);
            }
            if let Some(value) = base_url {
                config.ai_api_base_url = value;
            }
            if let Some(value) = model {
                config.ai_model = value;
            }

            let response = ai::test_connection(&config)?;
            println!("AI API connection successful");
            println!("{response}");

            Ok(())
        }
    }
}

fn workout_input(args: WorkoutArgs) -> Result<WorkoutInput> {
    Ok(WorkoutInput {
        workout_type: args.workout_type,
        reps: args.reps,
        sets: args.sets,
        equipment: args.equipment,
        body_part: args.body_part.parse()?,
        kg: args.kg,
    })
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(parse_date_key)
        .transpose()?
        .map_or_else(|| Ok(Local::now().date_naive()), Ok)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    Database::open(&config.db_path)
}

fn load_config() -> Result<Config> {
    Config::load_or_default().with_context(|| {
        format!(
            "Failed to load config. Fix or remove {}",
            Config::config_path().display()
        )
    })
}
