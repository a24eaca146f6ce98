use crate::config::{AI_API_KEY_ENV, Config};
use crate::tracker::workouts::Workout;
use anyhow::{Context, Result, anyhow, bail};
use chrono::DateTime;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::error;

const HISTORY_LIMIT: usize = 10;
const MIN_GOAL_CHARS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("{0}")]
    Validation(String),

    #[error("AI is disabled. Enable it with `fittrack config set ai.enabled true`.")]
    Disabled,

    #[error(
        "AI API key is missing. Set `fittrack config set ai.api_key <KEY>` or `FITTRACK_AI_API_KEY`."
    )]
    MissingKey,

    /// The one message shown to the user; the cause is logged.
    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionsPayload {
    suggestions: String,
}

pub fn suggest_workouts(
    config: &Config,
    workouts: &[Workout],
    fitness_goals: &str,
) -> Result<String, AiError> {
    let fitness_goals = fitness_goals.trim();
    if fitness_goals.chars().count() < MIN_GOAL_CHARS {
        return Err(AiError::Validation(
            "Fitness goals must be at least 3 characters long.".to_string(),
        ));
    }

    let api_key = ensure_ready(config)?;

    let system_prompt = r#"You are a personal trainer. Generate workout suggestions based on the user's workout history and fitness goals. Return JSON only: {"suggestions":"..."}."#;
    let user_prompt = format!(
        "Workout History: {}\nFitness Goals: {fitness_goals}",
        workout_history(workouts)
    );

    chat_completion(config, &api_key, system_prompt, &user_prompt)
        .and_then(|content| parse_json_payload::<SuggestionsPayload>(&content))
        .map(|payload| payload.suggestions.trim().to_string())
        .map_err(|source| {
            error!(error = %source, "workout suggestion request failed");
            AiError::Failed {
                message: "Failed to generate AI suggestions. Please try again.",
                source,
            }
        })
}

pub fn analyze_nutrition(config: &Config, meal_description: &str) -> Result<NutritionInfo, AiError> {
    let meal_description = meal_description.trim();
    if meal_description.is_empty() {
        return Err(AiError::Validation(
            "Meal description cannot be empty.".to_string(),
        ));
    }

    let api_key = ensure_ready(config)?;

    let system_prompt = r#"You are an expert nutritionist. Based on the user's meal description, estimate its nutritional content. Return JSON only: {"calories":0,"protein":0,"carbs":0,"fat":0,"notes":"..."}. Protein, carbs and fat are grams. If the description is vague, make a reasonable assumption and mention it in notes."#;
    let user_prompt = format!("Meal Description: {meal_description}");

    chat_completion(config, &api_key, system_prompt, &user_prompt)
        .and_then(|content| parse_json_payload::<NutritionInfo>(&content))
        .map_err(|source| {
            error!(error = %source, "nutrition analysis request failed");
            AiError::Failed {
                message: "Failed to analyze nutrition. Please try again.",
                source,
            }
        })
}

pub fn test_connection(config: &Config) -> Result<String> {
    let api_key = config.resolve_api_key().with_context(|| {
        format!("AI API key is missing. Set `fittrack config set ai.api_key <KEY>` or `{AI_API_KEY_ENV}`.")
    })?;

    let system_prompt = "Return exactly one short sentence indicating AI API connectivity is healthy.";
    let user_prompt = "Health check for fittrack.";

    chat_completion(config, &api_key, system_prompt, user_prompt)
}

fn ensure_ready(config: &Config) -> Result<String, AiError> {
    if !config.ai_enabled {
        return Err(AiError::Disabled);
    }

    config.resolve_api_key().ok_or(AiError::MissingKey)
}

/// Summary of the most recent workouts, newest first.
pub fn workout_history(workouts: &[Workout]) -> String {
    let history = workouts
        .iter()
        .take(HISTORY_LIMIT)
        .map(|workout| {
            let day = DateTime::parse_from_rfc3339(&workout.date)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|_| workout.date.clone());

            format!(
                "{} ({} reps, focusing on {} with {}) on {day}",
                workout.workout_type, workout.reps, workout.body_part, workout.equipment
            )
        })
        .collect::<Vec<_>>();

    if history.is_empty() {
        "No recent workouts.".to_string()
    } else {
        history.join("\n")
    }
}

fn chat_completion(config: &Config, api_key: &str, system: &str, user: &str) -> Result<String> {
    let base_url = config.ai_api_base_url.clone();
    let model = config.ai_model.clone();
    let timeout_seconds = config.ai_timeout_seconds.max(5);
    let api_key = api_key.to_string();
    let system = system.to_string();
    let user = user.to_string();

    std::thread::spawn(move || {
        chat_completion_blocking(&base_url, &model, timeout_seconds, &api_key, &system, &user)
    })
    .join()
    .map_err(|_| anyhow!("AI worker thread panicked"))?
}

fn chat_completion_blocking(
    base_url: &str,
    model: &str,
    timeout_seconds: u64,
    api_key: &str,
    system: &str,
    user: &str,
) -> Result<String> {
    if api_key.trim().is_empty() {
        bail!("AI API key is empty");
    }

    let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("Failed to build Authorization header")?,
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .default_headers(headers)
        .build()
        .context("Failed to create AI HTTP client")?;

    let request_body = json!({
        "model": model,
        "temperature": 0.4,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user}
        ]
    });

    let response = client
        .post(endpoint)
        .json(&request_body)
        .send()
        .context("AI API request failed")?;

    let status = response.status();
    let body = response.text().context("Failed to read AI response body")?;

    if !status.is_success() {
        bail!("AI API error {}: {}", status, body);
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse AI response: {body}"))?;

    parsed
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| anyhow!("AI response did not include message.content"))
}

fn parse_json_payload<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let extracted = extract_json_block(content);
    serde_json::from_str(&extracted)
        .with_context(|| format!("Failed to parse AI JSON payload. content: {content}"))
}

fn extract_json_block(content: &str) -> String {
    let fenced = content.split("```").map(str::trim).find_map(|block| {
        block
            .strip_prefix("json")
            .map(str::trim)
            .or_else(|| block.starts_with('{').then_some(block))
    });

    match fenced {
        Some(block) => block.to_string(),
        None => {
            let first = content.find('{');
            let last = content.rfind('}');

            match (first, last) {
                (Some(start), Some(end)) if end > start => content[start..=end].to_string(),
                _ => content.trim().to_string(),
            }
        }
    }
}
