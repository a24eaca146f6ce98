pub mod buckets;
pub mod dashboard;
pub mod plan;
pub mod profile;
pub mod window;
pub mod workouts;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_STEPS_GOAL: i64 = 8000;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Rejected before any store call.
    #[error("{0}")]
    Validation(String),

    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Steps,
    Water,
    Protein,
}

impl MetricKind {
    pub fn collection(self) -> &'static str {
        match self {
            MetricKind::Steps => "daily_stats",
            MetricKind::Water => "water_intake",
            MetricKind::Protein => "protein_intake",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::Water => "water",
            MetricKind::Protein => "protein",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::Water => "L",
            MetricKind::Protein => "g",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "steps" => Ok(MetricKind::Steps),
            "water" => Ok(MetricKind::Water),
            "protein" => Ok(MetricKind::Protein),
            other => Err(TrackerError::validation(format!(
                "Unknown metric: {other}. Expected steps, water or protein"
            ))),
        }
    }
}

/// A per-date aggregate document for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetricBucket {
    pub id: String,
    pub date: String,
    pub metric: MetricKind,
    #[serde(flatten)]
    pub value: BucketValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BucketValue {
    Steps {
        steps: i64,
        #[serde(rename = "stepsGoal")]
        steps_goal: i64,
    },
    Intake {
        intake: f64,
    },
}

impl BucketValue {
    pub fn amount(&self) -> f64 {
        match self {
            BucketValue::Steps { steps, .. } => *steps as f64,
            BucketValue::Intake { intake } => *intake,
        }
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(input: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_KEY_FORMAT)
        .ok()
        .filter(|date| date_key(*date) == input)
        .ok_or_else(|| {
            TrackerError::validation(format!(
                "Invalid date key: {input}. Expected yyyy-MM-dd, e.g. 2024-07-20"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_requires_zero_padded_iso_form() {
        assert!(parse_date_key("2024-07-20").is_ok());
        assert!(matches!(
            parse_date_key("2024-7-20"),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            parse_date_key("20/07/2024"),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn steps_bucket_serializes_with_goal() {
        let bucket = DailyMetricBucket {
            id: "2024-07-20".to_string(),
            date: "2024-07-20T08:00:00.000Z".to_string(),
            metric: MetricKind::Steps,
            value: BucketValue::Steps {
                steps: 0,
                steps_goal: DEFAULT_STEPS_GOAL,
            },
        };

        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["steps"], 0);
        assert_eq!(json["stepsGoal"], 8000);
        assert_eq!(json["metric"], "steps");
    }
}
