pub mod queries;

use crate::tracker::profile::UserProfile;
use crate::tracker::workouts::{BodyPart, Workout};
use crate::tracker::{BucketValue, DailyMetricBucket, MetricKind};
use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionCounts {
    pub daily_stats: i64,
    pub water_intake: i64,
    pub protein_intake: i64,
    pub workouts: i64,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn get_bucket(&self, metric: MetricKind, id: &str) -> Result<Option<DailyMetricBucket>> {
        let sql = match metric {
            MetricKind::Steps => "SELECT id, date, steps, steps_goal FROM daily_stats WHERE id = ?1",
            MetricKind::Water => "SELECT id, date, intake FROM water_intake WHERE id = ?1",
            MetricKind::Protein => "SELECT id, date, intake FROM protein_intake WHERE id = ?1",
        };

        self.conn
            .query_row(sql, params![id], |row| bucket_from_row(metric, row))
            .optional()
            .with_context(|| format!("Failed to read {} bucket {id}", metric.collection()))
    }

    /// Inserts the bucket unless a document with the same id already exists.
    /// Returns `false` when an existing bucket was left untouched.
    pub fn insert_bucket_if_absent(&self, bucket: &DailyMetricBucket) -> Result<bool> {
        let inserted = match &bucket.value {
            BucketValue::Steps { steps, steps_goal } => self.conn.execute(
                "INSERT OR IGNORE INTO daily_stats (id, date, steps, steps_goal) VALUES (?1, ?2, ?3, ?4)",
                params![&bucket.id, &bucket.date, steps, steps_goal],
            ),
            BucketValue::Intake { intake } => self.conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (id, date, intake) VALUES (?1, ?2, ?3)",
                    bucket.metric.collection()
                ),
                params![&bucket.id, &bucket.date, intake],
            ),
        }
        .with_context(|| {
            format!(
                "Failed to create {} bucket {}",
                bucket.metric.collection(),
                bucket.id
            )
        })?;

        Ok(inserted == 1)
    }

    pub fn update_bucket_value(
        &self,
        metric: MetricKind,
        id: &str,
        value: &BucketValue,
    ) -> Result<()> {
        match value {
            BucketValue::Steps { steps, steps_goal } => self.conn.execute(
                "UPDATE daily_stats SET steps = ?2, steps_goal = ?3 WHERE id = ?1",
                params![id, steps, steps_goal],
            ),
            BucketValue::Intake { intake } => self.conn.execute(
                &format!(
                    "UPDATE {} SET intake = ?2 WHERE id = ?1",
                    metric.collection()
                ),
                params![id, intake],
            ),
        }
        .with_context(|| format!("Failed to update {} bucket {id}", metric.collection()))?;

        Ok(())
    }

    /// Range query on the date key, inclusive on both ends.
    pub fn buckets_between(
        &self,
        metric: MetricKind,
        from_key: &str,
        to_key: &str,
    ) -> Result<Vec<DailyMetricBucket>> {
        let sql = match metric {
            MetricKind::Steps => {
                "SELECT id, date, steps, steps_goal FROM daily_stats WHERE id >= ?1 AND id <= ?2"
            }
            MetricKind::Water => {
                "SELECT id, date, intake FROM water_intake WHERE id >= ?1 AND id <= ?2"
            }
            MetricKind::Protein => {
                "SELECT id, date, intake FROM protein_intake WHERE id >= ?1 AND id <= ?2"
            }
        };

        let mut statement = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to query {} range", metric.collection()))?;

        let rows = statement
            .query_map(params![from_key, to_key], |row| bucket_from_row(metric, row))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to query {} range", metric.collection()))?;

        Ok(rows)
    }

    pub fn insert_workout(&self, workout: &Workout) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO workouts (id, date, type, reps, sets, equipment, body_part, kg)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &workout.id,
                    &workout.date,
                    &workout.workout_type,
                    workout.reps,
                    workout.sets,
                    &workout.equipment,
                    workout.body_part.as_str(),
                    workout.kg,
                ],
            )
            .context("Failed to insert workout")?;

        Ok(())
    }

    /// Replaces every editable field; `id` and `date` are never rewritten.
    pub fn update_workout(&self, workout: &Workout) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE workouts
                 SET type = ?2, reps = ?3, sets = ?4, equipment = ?5, body_part = ?6, kg = ?7
                 WHERE id = ?1",
                params![
                    &workout.id,
                    &workout.workout_type,
                    workout.reps,
                    workout.sets,
                    &workout.equipment,
                    workout.body_part.as_str(),
                    workout.kg,
                ],
            )
            .context("Failed to update workout")?;

        Ok(updated > 0)
    }

    pub fn delete_workout(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])
            .context("Failed to delete workout")?;

        Ok(deleted > 0)
    }

    pub fn get_workout(&self, id: &str) -> Result<Option<Workout>> {
        self.conn
            .query_row(
                "SELECT id, date, type, reps, sets, equipment, body_part, kg FROM workouts WHERE id = ?1",
                params![id],
                workout_from_row,
            )
            .optional()
            .context("Failed to read workout")
    }

    pub fn list_workouts(&self, body_part: Option<BodyPart>) -> Result<Vec<Workout>> {
        let mut statement = self.conn.prepare(
            "SELECT id, date, type, reps, sets, equipment, body_part, kg
             FROM workouts
             WHERE ?1 IS NULL OR body_part = ?1
             ORDER BY date DESC",
        )?;

        let rows = statement
            .query_map(params![body_part.map(BodyPart::as_str)], workout_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list workouts")?;

        Ok(rows)
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<UserProfile>> {
        self.conn
            .query_row(
                "SELECT id, weight, height, last_updated FROM user_profile WHERE id = ?1",
                params![id],
                |row| {
                    Ok(UserProfile {
                        id: row.get(0)?,
                        weight: row.get(1)?,
                        height: row.get(2)?,
                        last_updated: row.get(3)?,
                    })
                },
            )
            .optional()
            .context("Failed to read user profile")
    }

    pub fn insert_profile_if_absent(&self, profile: &UserProfile) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO user_profile (id, weight, height, last_updated) VALUES (?1, ?2, ?3, ?4)",
                params![
                    &profile.id,
                    &profile.weight,
                    &profile.height,
                    &profile.last_updated
                ],
            )
            .context("Failed to create user profile")?;

        Ok(inserted == 1)
    }

    pub fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn
            .execute(
                "UPDATE user_profile SET weight = ?2, height = ?3, last_updated = ?4 WHERE id = ?1",
                params![
                    &profile.id,
                    &profile.weight,
                    &profile.height,
                    &profile.last_updated
                ],
            )
            .context("Failed to update user profile")?;

        Ok(())
    }

    pub fn collection_counts(&self) -> Result<CollectionCounts> {
        Ok(CollectionCounts {
            daily_stats: self.count_rows("daily_stats")?,
            water_intake: self.count_rows("water_intake")?,
            protein_intake: self.count_rows("protein_intake")?,
            workouts: self.count_rows("workouts")?,
        })
    }

    fn count_rows(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("Failed to count {table}"))
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).context("Failed to execute raw SQL")
    }
}

fn bucket_from_row(metric: MetricKind, row: &Row<'_>) -> rusqlite::Result<DailyMetricBucket> {
    let value = match metric {
        MetricKind::Steps => BucketValue::Steps {
            steps: row.get(2)?,
            steps_goal: row.get(3)?,
        },
        MetricKind::Water | MetricKind::Protein => BucketValue::Intake {
            intake: row.get(2)?,
        },
    };

    Ok(DailyMetricBucket {
        id: row.get(0)?,
        date: row.get(1)?,
        metric,
        value,
    })
}

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    let body_part: String = row.get(6)?;
    let body_part = body_part
        .parse::<BodyPart>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error)))?;

    Ok(Workout {
        id: row.get(0)?,
        date: row.get(1)?,
        workout_type: row.get(2)?,
        reps: row.get(3)?,
        sets: row.get(4)?,
        equipment: row.get(5)?,
        body_part,
        kg: row.get(7)?,
    })
}
