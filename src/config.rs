use crate::tracker::DEFAULT_STEPS_GOAL;
use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use url::Url;

const APP_DIR: &str = ".fittrack";
const CONFIG_FILE: &str = "config.json";
pub const AI_API_KEY_ENV: &str = "FITTRACK_AI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_port: u16,
    pub steps_goal: i64,
    pub water_goal_liters: f64,
    pub protein_per_kg: f64,
    pub ai_enabled: bool,
    pub ai_api_key: Option<String>,
    pub ai_api_base_url: String,
    pub ai_model: String,
    pub ai_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_root_dir().join("db").join("fittrack.db"),
            api_port: 7878,
            steps_goal: DEFAULT_STEPS_GOAL,
            water_goal_liters: 3.0,
            protein_per_kg: 1.6,
            ai_enabled: true,
            ai_api_key: None,
            ai_api_base_url: "https://api.openai.com/v1".to_string(),
            ai_model: "gpt-4o-mini".to_string(),
            ai_timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn root_dir() -> PathBuf {
        default_root_dir()
    }

    pub fn config_path() -> PathBuf {
        default_root_dir().join(CONFIG_FILE)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    /// Falls back to defaults only when no config file exists yet; a file
    /// that exists but cannot be parsed is still an error.
    pub fn load_or_default() -> Result<Self> {
        if Self::config_path().exists() {
            Self::load()
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        Ok(())
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(AI_API_KEY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                self.ai_api_key
                    .clone()
                    .filter(|value| !value.trim().is_empty())
            })
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                self.db_path = expand_home(value.trim());
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "steps_goal" => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| anyhow!("steps_goal must be a whole number"))?;
                if parsed <= 0 {
                    bail!("steps_goal must be greater than zero");
                }
                self.steps_goal = parsed;
            }
            "water_goal_liters" => {
                self.water_goal_liters = parse_positive(value, "water_goal_liters")?;
            }
            "protein_per_kg" => {
                self.protein_per_kg = parse_positive(value, "protein_per_kg")?;
            }
            "ai_enabled" => {
                self.ai_enabled = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("ai_enabled must be true/false"))?;
            }
            "ai_api_key" => {
                self.ai_api_key = (!value.trim().is_empty()).then_some(value.to_string());
            }
            "ai_api_base_url" => {
                let trimmed = value.trim().trim_end_matches('/');
                Url::parse(trimmed)
                    .with_context(|| format!("ai_api_base_url is not a valid URL: {trimmed}"))?;
                self.ai_api_base_url = trimmed.to_string();
            }
            "ai_model" => {
                self.ai_model = value.trim().to_string();
            }
            "ai_timeout_seconds" => {
                self.ai_timeout_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("ai_timeout_seconds must be a number"))?
                    .max(5);
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, api_port|api.port, steps_goal|goals.steps, water_goal_liters|goals.water_liters, protein_per_kg|goals.protein_per_kg, ai_enabled|ai.enabled, ai_api_key|ai.api_key, ai_api_base_url|ai.base_url, ai_model|ai.model, ai_timeout_seconds|ai.timeout_seconds"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "steps_goal" => Some(self.steps_goal.to_string()),
            "water_goal_liters" => Some(self.water_goal_liters.to_string()),
            "protein_per_kg" => Some(self.protein_per_kg.to_string()),
            "ai_enabled" => Some(self.ai_enabled.to_string()),
            "ai_api_key" => Some(
                self.ai_api_key
                    .as_ref()
                    .map(|_| "***set***".to_string())
                    .unwrap_or_else(|| "not_set".to_string()),
            ),
            "ai_api_base_url" => Some(self.ai_api_base_url.clone()),
            "ai_model" => Some(self.ai_model.clone()),
            "ai_timeout_seconds" => Some(self.ai_timeout_seconds.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "api_port" | "api.port" => "api_port",
        "steps_goal" | "goals.steps" => "steps_goal",
        "water_goal_liters" | "goals.water_liters" => "water_goal_liters",
        "protein_per_kg" | "goals.protein_per_kg" => "protein_per_kg",
        "ai_enabled" | "ai.enabled" => "ai_enabled",
        "ai_api_key" | "ai.api_key" => "ai_api_key",
        "ai_api_base_url" | "ai.base_url" => "ai_api_base_url",
        "ai_model" | "ai.model" => "ai_model",
        "ai_timeout_seconds" | "ai.timeout_seconds" => "ai_timeout_seconds",
        _ => key,
    }
}

fn parse_positive(value: &str, key: &str) -> Result<f64> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow!("{key} must be a number"))?;

    if !parsed.is_finite() || parsed <= 0.0 {
        bail!("{key} must be greater than zero");
    }

    Ok(parsed)
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}
