use crate::db::Database;
use crate::tracker::{
    BucketValue, DEFAULT_STEPS_GOAL, DailyMetricBucket, MetricKind, TrackerError, TrackerResult,
    parse_date_key,
};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

static STEP_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:[,.]\d{3})+|\d+").expect("step count pattern is valid")
});

static LABELED_STEP_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:[,.]\d{3})+|\d+)\s*steps?\b")
        .expect("labeled step count pattern is valid")
});

pub struct DailyBucketStore<'a> {
    db: &'a Database,
    steps_goal: i64,
}

impl<'a> DailyBucketStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            steps_goal: DEFAULT_STEPS_GOAL,
        }
    }

    pub fn with_steps_goal(mut self, steps_goal: i64) -> Self {
        self.steps_goal = steps_goal;
        self
    }

    /// Returns the bucket for `date_key`, persisting a zero-valued one first
    /// when none exists. An existing bucket is never overwritten.
    pub fn get_or_create(
        &self,
        date_key: &str,
        metric: MetricKind,
    ) -> TrackerResult<DailyMetricBucket> {
        parse_date_key(date_key)?;

        if let Some(bucket) = self.db.get_bucket(metric, date_key)? {
            return Ok(bucket);
        }

        let bucket = self.new_bucket(date_key, metric, self.default_value(metric));
        if self.db.insert_bucket_if_absent(&bucket)? {
            info!(metric = %metric, date = %date_key, "created daily bucket");
            return Ok(bucket);
        }

        // Lost a creation race with another session; the stored one wins.
        self.stored_after_lost_insert(date_key, metric)
    }

    /// Adds a non-negative `delta` to the water or protein total for the date
    /// and returns the new total.
    pub fn apply_delta(&self, date_key: &str, metric: MetricKind, delta: f64) -> TrackerResult<f64> {
        validate_delta(metric, delta)?;
        parse_date_key(date_key)?;

        let existing = self.db.get_bucket(metric, date_key)?;
        let new_total = self.write_intake(date_key, metric, delta, existing)?;

        info!(metric = %metric, date = %date_key, delta, total = new_total, "applied intake delta");
        Ok(new_total)
    }

    /// Replaces the step count for the date. The goal already stored on the
    /// bucket is kept.
    pub fn set_steps(&self, date_key: &str, value: i64) -> TrackerResult<()> {
        if value < 0 {
            return Err(TrackerError::validation("Steps must be zero or more"));
        }
        parse_date_key(date_key)?;

        let existing = self.db.get_bucket(MetricKind::Steps, date_key)?;
        self.write_steps(date_key, value, existing)?;

        info!(date = %date_key, steps = value, "set daily steps");
        Ok(())
    }

    /// Pulls a step count out of text such as "Today I have 8,250 steps." and
    /// stores it with [`DailyBucketStore::set_steps`].
    pub fn sync_steps_from_text(&self, date_key: &str, text: &str) -> TrackerResult<i64> {
        let steps = parse_steps_text(text).ok_or_else(|| {
            TrackerError::validation("Could not find a step count in the text")
        })?;

        self.set_steps(date_key, steps)?;
        Ok(steps)
    }

    /// `existing` is the bucket as read before the write. When it was absent
    /// but another session inserts first, the delta lands on the stored total.
    fn write_intake(
        &self,
        date_key: &str,
        metric: MetricKind,
        delta: f64,
        existing: Option<DailyMetricBucket>,
    ) -> TrackerResult<f64> {
        if let Some(bucket) = existing {
            let total = bucket.value.amount() + delta;
            self.db
                .update_bucket_value(metric, date_key, &BucketValue::Intake { intake: total })?;
            return Ok(total);
        }

        let bucket = self.new_bucket(date_key, metric, BucketValue::Intake { intake: delta });
        if self.db.insert_bucket_if_absent(&bucket)? {
            return Ok(delta);
        }

        let stored = self.stored_after_lost_insert(date_key, metric)?;
        self.write_intake(date_key, metric, delta, Some(stored))
    }

    fn write_steps(
        &self,
        date_key: &str,
        value: i64,
        existing: Option<DailyMetricBucket>,
    ) -> TrackerResult<()> {
        if let Some(bucket) = existing {
            let steps_goal = match bucket.value {
                BucketValue::Steps { steps_goal, .. } => steps_goal,
                BucketValue::Intake { .. } => self.steps_goal,
            };
            self.db.update_bucket_value(
                MetricKind::Steps,
                date_key,
                &BucketValue::Steps {
                    steps: value,
                    steps_goal,
                },
            )?;
            return Ok(());
        }

        let bucket = self.new_bucket(
            date_key,
            MetricKind::Steps,
            BucketValue::Steps {
                steps: value,
                steps_goal: self.steps_goal,
            },
        );
        if self.db.insert_bucket_if_absent(&bucket)? {
            return Ok(());
        }

        let stored = self.stored_after_lost_insert(date_key, MetricKind::Steps)?;
        self.write_steps(date_key, value, Some(stored))
    }

    fn stored_after_lost_insert(
        &self,
        date_key: &str,
        metric: MetricKind,
    ) -> TrackerResult<DailyMetricBucket> {
        self.db.get_bucket(metric, date_key)?.ok_or_else(|| {
            TrackerError::StoreUnavailable(anyhow::anyhow!(
                "{} bucket {date_key} vanished after creation",
                metric.collection()
            ))
        })
    }

    fn default_value(&self, metric: MetricKind) -> BucketValue {
        match metric {
            MetricKind::Steps => BucketValue::Steps {
                steps: 0,
                steps_goal: self.steps_goal,
            },
            MetricKind::Water | MetricKind::Protein => BucketValue::Intake { intake: 0.0 },
        }
    }

    fn new_bucket(&self, date_key: &str, metric: MetricKind, value: BucketValue) -> DailyMetricBucket {
        DailyMetricBucket {
            id: date_key.to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metric,
            value,
        }
    }
}

fn validate_delta(metric: MetricKind, delta: f64) -> TrackerResult<()> {
    if metric == MetricKind::Steps {
        return Err(TrackerError::validation(
            "Steps are replaced, not accumulated; use set_steps",
        ));
    }

    if !delta.is_finite() || delta < 0.0 {
        return Err(TrackerError::validation(format!(
            "{metric} amount must be zero or more"
        )));
    }

    if metric == MetricKind::Protein && delta.fract() != 0.0 {
        return Err(TrackerError::validation(
            "Protein amount must be a whole number of grams",
        ));
    }

    Ok(())
}

/// Prefers the number written next to "steps"; otherwise the first number.
pub fn parse_steps_text(text: &str) -> Option<i64> {
    LABELED_STEP_COUNT
        .captures(text)
        .and_then(|captures| captures.get(1))
        .or_else(|| STEP_COUNT.find(text))
        .map(|found| found.as_str().replace([',', '.'], ""))
        .and_then(|digits| digits.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: &str = "2024-07-20";

    #[test]
    fn get_or_create_defaults_steps_and_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        let created = store.get_or_create(DAY, MetricKind::Steps).unwrap();
        assert_eq!(
            created.value,
            BucketValue::Steps {
                steps: 0,
                steps_goal: 8000
            }
        );

        let again = store.get_or_create(DAY, MetricKind::Steps).unwrap();
        assert_eq!(again, created);
        assert_eq!(db.collection_counts().unwrap().daily_stats, 1);
    }

    #[test]
    fn get_or_create_keeps_existing_bucket() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        store.apply_delta(DAY, MetricKind::Water, 1.5).unwrap();
        let bucket = store.get_or_create(DAY, MetricKind::Water).unwrap();

        assert_eq!(bucket.value, BucketValue::Intake { intake: 1.5 });
    }

    #[test]
    fn apply_delta_accumulates() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        assert_eq!(store.apply_delta(DAY, MetricKind::Water, 0.5).unwrap(), 0.5);
        assert_eq!(store.apply_delta(DAY, MetricKind::Water, 0.25).unwrap(), 0.75);
        assert_eq!(store.apply_delta(DAY, MetricKind::Protein, 30.0).unwrap(), 30.0);
        assert_eq!(store.apply_delta(DAY, MetricKind::Protein, 0.0).unwrap(), 30.0);
    }

    #[test]
    fn negative_delta_is_rejected_without_touching_the_store() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);
        store.apply_delta(DAY, MetricKind::Water, 2.0).unwrap();

        let result = store.apply_delta(DAY, MetricKind::Water, -5.0);
        assert!(matches!(result, Err(TrackerError::Validation(_))));

        let bucket = db.get_bucket(MetricKind::Water, DAY).unwrap().unwrap();
        assert_eq!(bucket.value, BucketValue::Intake { intake: 2.0 });
    }

    #[test]
    fn delta_rejects_fractional_protein_and_steps() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        assert!(matches!(
            store.apply_delta(DAY, MetricKind::Protein, 12.5),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            store.apply_delta(DAY, MetricKind::Steps, 100.0),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            store.apply_delta(DAY, MetricKind::Water, f64::NAN),
            Err(TrackerError::Validation(_))
        ));
        assert_eq!(db.collection_counts().unwrap().protein_intake, 0);
    }

    #[test]
    fn set_steps_replaces_value() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        store.set_steps(DAY, 8250).unwrap();
        store.set_steps(DAY, 9000).unwrap();

        let bucket = store.get_or_create(DAY, MetricKind::Steps).unwrap();
        assert_eq!(
            bucket.value,
            BucketValue::Steps {
                steps: 9000,
                steps_goal: 8000
            }
        );
        assert!(matches!(
            store.set_steps(DAY, -1),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn steps_goal_comes_from_store_configuration() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db).with_steps_goal(10_000);

        let bucket = store.get_or_create(DAY, MetricKind::Steps).unwrap();
        assert_eq!(
            bucket.value,
            BucketValue::Steps {
                steps: 0,
                steps_goal: 10_000
            }
        );
    }

    #[test]
    fn invalid_date_key_is_a_validation_error() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        assert!(matches!(
            store.get_or_create("July 20", MetricKind::Water),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn store_failure_surfaces_as_unavailable() {
        let db = Database::open_in_memory().unwrap();
        db.execute_raw("DROP TABLE water_intake;").unwrap();
        let store = DailyBucketStore::new(&db);

        assert!(matches!(
            store.apply_delta(DAY, MetricKind::Water, 1.0),
            Err(TrackerError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn write_after_another_session_created_the_bucket_is_not_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fittrack.db");
        let first = Database::open(&path).unwrap();
        let second = Database::open(&path).unwrap();
        let first_store = DailyBucketStore::new(&first);
        let second_store = DailyBucketStore::new(&second);

        let missing_steps = second.get_bucket(MetricKind::Steps, DAY).unwrap();
        assert!(missing_steps.is_none());
        first_store.set_steps(DAY, 1000).unwrap();
        second_store.write_steps(DAY, 9000, missing_steps).unwrap();

        assert_eq!(
            first.get_bucket(MetricKind::Steps, DAY).unwrap().unwrap().value,
            BucketValue::Steps {
                steps: 9000,
                steps_goal: 8000
            }
        );

        let missing_water = second.get_bucket(MetricKind::Water, DAY).unwrap();
        assert!(missing_water.is_none());
        first_store.apply_delta(DAY, MetricKind::Water, 1.0).unwrap();
        let total = second_store
            .write_intake(DAY, MetricKind::Water, 0.5, missing_water)
            .unwrap();

        assert_eq!(total, 1.5);
        assert_eq!(
            first.get_bucket(MetricKind::Water, DAY).unwrap().unwrap().value,
            BucketValue::Intake { intake: 1.5 }
        );
    }

    #[test]
    fn parses_step_counts_from_free_text() {
        assert_eq!(parse_steps_text("Today I have 8,250 steps."), Some(8250));
        assert_eq!(parse_steps_text("I walked 12.345 steps"), Some(12345));
        assert_eq!(parse_steps_text("watch says 9000"), Some(9000));
        assert_eq!(parse_steps_text("Walked 3.2 km, 8,250 steps"), Some(8250));
        assert_eq!(parse_steps_text("2 walks, 6400 Steps total"), Some(6400));
        assert_eq!(parse_steps_text("no numbers here"), None);
    }

    #[test]
    fn sync_from_text_sets_steps() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);

        assert_eq!(
            store
                .sync_steps_from_text(DAY, "I walked 8,250 steps.")
                .unwrap(),
            8250
        );
        assert!(matches!(
            store.sync_steps_from_text(DAY, "lots"),
            Err(TrackerError::Validation(_))
        ));
    }
}
