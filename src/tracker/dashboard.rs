use crate::config::Config;
use crate::db::Database;
use crate::tracker::buckets::DailyBucketStore;
use crate::tracker::profile::{ProfileStore, UserProfile, protein_goal};
use crate::tracker::{BucketValue, MetricKind, TrackerResult, date_key};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricProgress {
    pub value: f64,
    pub goal: f64,
    pub progress_percent: u32,
    pub remaining: f64,
}

impl MetricProgress {
    pub fn new(value: f64, goal: f64) -> Self {
        let progress_percent = if goal > 0.0 {
            (value / goal * 100.0).round().max(0.0) as u32
        } else {
            0
        };

        Self {
            value,
            goal,
            progress_percent,
            remaining: (goal - value).max(0.0),
        }
    }

    pub fn goal_reached(&self) -> bool {
        self.goal > 0.0 && self.remaining == 0.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub date: String,
    pub steps: MetricProgress,
    pub water: MetricProgress,
    pub protein: MetricProgress,
    pub profile: UserProfile,
}

/// Today's totals against their goals. Missing buckets and the profile are
/// created with their defaults on the way.
pub fn build_dashboard(db: &Database, config: &Config, today: NaiveDate) -> TrackerResult<DashboardSummary> {
    let key = date_key(today);
    let store = DailyBucketStore::new(db).with_steps_goal(config.steps_goal);

    let steps = match store.get_or_create(&key, MetricKind::Steps)?.value {
        BucketValue::Steps { steps, steps_goal } => {
            MetricProgress::new(steps as f64, steps_goal as f64)
        }
        BucketValue::Intake { intake } => MetricProgress::new(intake, config.steps_goal as f64),
    };
    let water = MetricProgress::new(
        store.get_or_create(&key, MetricKind::Water)?.value.amount(),
        config.water_goal_liters,
    );

    let profile = ProfileStore::new(db).get_or_create()?;
    let protein = MetricProgress::new(
        store.get_or_create(&key, MetricKind::Protein)?.value.amount(),
        protein_goal(&profile, config.protein_per_kg),
    );

    Ok(DashboardSummary {
        date: key,
        steps,
        water,
        protein,
        profile,
    })
}
