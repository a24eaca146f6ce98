use crate::config::Config;
use crate::db::Database;
use crate::tracker::profile::{
    DEFAULT_HEIGHT, DEFAULT_WEIGHT, ProfileStore, ProfileUpdate, protein_goal, weight_in_kg,
};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to fittrack onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();
    let defaults = Config::load_or_default()?;

    println!("\n[1/4] Body stats");
    let weight: String = Input::with_theme(&theme)
        .with_prompt("  Your weight (e.g. 75 kg or 165 lbs)")
        .default(DEFAULT_WEIGHT.to_string())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            weight_in_kg(input)
                .map(|_| ())
                .ok_or("Include a number, for example 75 kg")
        })
        .interact_text()
        .context("Failed to read weight")?;

    let height: String = Input::with_theme(&theme)
        .with_prompt("  Your height (e.g. 180 cm)")
        .default(DEFAULT_HEIGHT.to_string())
        .interact_text()
        .context("Failed to read height")?;

    println!("\n[2/4] Daily goals");
    let steps_goal: i64 = Input::with_theme(&theme)
        .with_prompt("  Daily step goal")
        .default(defaults.steps_goal)
        .validate_with(|input: &i64| -> std::result::Result<(), &str> {
            (*input > 0).then_some(()).ok_or("Must be greater than zero")
        })
        .interact_text()
        .context("Failed to read step goal")?;

    let water_goal_liters: f64 = Input::with_theme(&theme)
        .with_prompt("  Daily water goal (liters)")
        .default(defaults.water_goal_liters)
        .validate_with(|input: &f64| -> std::result::Result<(), &str> {
            (input.is_finite() && *input > 0.0)
                .then_some(())
                .ok_or("Must be greater than zero")
        })
        .interact_text()
        .context("Failed to read water goal")?;

    println!("\n[3/4] AI suggestions and nutrition estimates");
    let ai_enabled = Confirm::with_theme(&theme)
        .with_prompt("  Enable AI features?")
        .default(defaults.ai_enabled)
        .interact()
        .context("Failed to read AI preference")?;

    let ai_api_key = if ai_enabled {
        let key = Password::with_theme(&theme)
            .with_prompt("  API key (leave empty to set later)")
            .allow_empty_password(true)
            .interact()
            .context("Failed to read API key")?;
        (!key.trim().is_empty()).then_some(key).or(defaults.ai_api_key.clone())
    } else {
        defaults.ai_api_key.clone()
    };

    let config = Config {
        steps_goal,
        water_goal_liters,
        ai_enabled,
        ai_api_key,
        ..defaults
    };

    println!("\n[4/4] Saving");
    config.ensure_bootstrap_files()?;
    config.save()?;

    let database = Database::open(&config.db_path)?;
    let profile = ProfileStore::new(&database).update(&ProfileUpdate {
        weight: Some(weight),
        height: Some(height),
    })?;
    println!("  ✓ Config saved ({})", Config::config_path().display());
    println!(
        "  ✓ Protein goal: {:.0} g/day",
        protein_goal(&profile, config.protein_per_kg)
    );

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Run `fittrack dashboard` to see today.");
    println!("──────────────────────────────────────────");

    Ok(config)
}
