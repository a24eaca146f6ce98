use crate::db::Database;
use crate::tracker::{TrackerError, TrackerResult};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

const MIN_TEXT_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Abs,
    #[serde(rename = "Lower Back")]
    LowerBack,
    Rest,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown body part: {0}")]
pub struct UnknownBodyPart(String);

impl BodyPart {
    /// Parts a workout can be logged against; `Rest` only appears in the plan.
    pub const LOGGABLE: [BodyPart; 8] = [
        BodyPart::Chest,
        BodyPart::Back,
        BodyPart::Legs,
        BodyPart::Shoulders,
        BodyPart::Arms,
        BodyPart::Core,
        BodyPart::Abs,
        BodyPart::LowerBack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BodyPart::Chest => "Chest",
            BodyPart::Back => "Back",
            BodyPart::Legs => "Legs",
            BodyPart::Shoulders => "Shoulders",
            BodyPart::Arms => "Arms",
            BodyPart::Core => "Core",
            BodyPart::Abs => "Abs",
            BodyPart::LowerBack => "Lower Back",
            BodyPart::Rest => "Rest",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyPart {
    type Err = UnknownBodyPart;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ");

        match normalized.as_str() {
            "chest" => Ok(BodyPart::Chest),
            "back" => Ok(BodyPart::Back),
            "legs" => Ok(BodyPart::Legs),
            "shoulders" => Ok(BodyPart::Shoulders),
            "arms" => Ok(BodyPart::Arms),
            "core" => Ok(BodyPart::Core),
            "abs" => Ok(BodyPart::Abs),
            "lower back" | "lowerback" => Ok(BodyPart::LowerBack),
            "rest" => Ok(BodyPart::Rest),
            _ => Err(UnknownBodyPart(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub reps: u32,
    pub sets: u32,
    pub equipment: String,
    pub body_part: BodyPart,
    pub kg: f64,
}

/// User-editable workout fields, as submitted from a form or request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutInput {
    #[serde(rename = "type")]
    pub workout_type: String,
    pub reps: i64,
    pub sets: i64,
    pub equipment: String,
    pub body_part: BodyPart,
    #[serde(default)]
    pub kg: Option<f64>,
}

struct ValidWorkout {
    workout_type: String,
    reps: u32,
    sets: u32,
    equipment: String,
    body_part: BodyPart,
    kg: f64,
}

impl WorkoutInput {
    fn validate(&self) -> TrackerResult<ValidWorkout> {
        let workout_type = self.workout_type.trim();
        if workout_type.chars().count() < MIN_TEXT_CHARS {
            return Err(TrackerError::validation(
                "Workout type must be at least 2 characters.",
            ));
        }

        let equipment = self.equipment.trim();
        if equipment.chars().count() < MIN_TEXT_CHARS {
            return Err(TrackerError::validation(
                "Equipment must be at least 2 characters.",
            ));
        }

        let reps = u32::try_from(self.reps)
            .ok()
            .filter(|reps| *reps >= 1)
            .ok_or_else(|| TrackerError::validation("Reps must be at least 1."))?;
        let sets = u32::try_from(self.sets)
            .ok()
            .filter(|sets| *sets >= 1)
            .ok_or_else(|| TrackerError::validation("Sets must be at least 1."))?;

        if !BodyPart::LOGGABLE.contains(&self.body_part) {
            return Err(TrackerError::validation(
                "Rest is not a body part a workout can target.",
            ));
        }

        let kg = self.kg.unwrap_or_default();
        if !kg.is_finite() || kg < 0.0 {
            return Err(TrackerError::validation(
                "Weight must be a positive number.",
            ));
        }

        Ok(ValidWorkout {
            workout_type: workout_type.to_string(),
            reps,
            sets,
            equipment: equipment.to_string(),
            body_part: self.body_part,
            kg,
        })
    }
}

pub struct WorkoutLog<'a> {
    db: &'a Database,
}

impl<'a> WorkoutLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, input: &WorkoutInput) -> TrackerResult<Workout> {
        let valid = input.validate()?;

        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            workout_type: valid.workout_type,
            reps: valid.reps,
            sets: valid.sets,
            equipment: valid.equipment,
            body_part: valid.body_part,
            kg: valid.kg,
        };

        self.db.insert_workout(&workout)?;
        info!(id = %workout.id, body_part = %workout.body_part, "logged workout");

        Ok(workout)
    }

    /// Returns `None` when no workout has the given id.
    pub fn update(&self, id: &str, input: &WorkoutInput) -> TrackerResult<Option<Workout>> {
        let valid = input.validate()?;

        let Some(existing) = self.db.get_workout(id)? else {
            return Ok(None);
        };

        let workout = Workout {
            workout_type: valid.workout_type,
            reps: valid.reps,
            sets: valid.sets,
            equipment: valid.equipment,
            body_part: valid.body_part,
            kg: valid.kg,
            ..existing
        };

        if !self.db.update_workout(&workout)? {
            return Ok(None);
        }
        info!(id = %workout.id, "updated workout");

        Ok(Some(workout))
    }

    /// Idempotent: deleting an unknown id succeeds and returns `false`.
    pub fn delete(&self, id: &str) -> TrackerResult<bool> {
        let deleted = self.db.delete_workout(id)?;
        info!(id = %id, deleted, "deleted workout");
        Ok(deleted)
    }

    /// Newest first, optionally restricted to one body part.
    pub fn list(&self, body_part: Option<BodyPart>) -> TrackerResult<Vec<Workout>> {
        Ok(self.db.list_workouts(body_part)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(workout_type: &str, body_part: BodyPart) -> WorkoutInput {
        WorkoutInput {
            workout_type: workout_type.to_string(),
            reps: 10,
            sets: 3,
            equipment: "Barbell".to_string(),
            body_part,
            kg: Some(60.0),
        }
    }

    #[test]
    fn create_assigns_id_and_date() {
        let db = Database::open_in_memory().unwrap();
        let log = WorkoutLog::new(&db);

        let workout = log.create(&input("Bench Press", BodyPart::Chest)).unwrap();
        assert!(!workout.id.is_empty());
        assert!(!workout.date.is_empty());
        assert_eq!(log.list(None).unwrap(), vec![workout]);
    }

    #[test]
    fn kg_defaults_to_zero() {
        let db = Database::open_in_memory().unwrap();
        let mut plank = input("Plank", BodyPart::Core);
        plank.kg = None;

        let workout = WorkoutLog::new(&db).create(&plank).unwrap();
        assert_eq!(workout.kg, 0.0);
    }

    #[test]
    fn validation_runs_before_persistence() {
        let db = Database::open_in_memory().unwrap();
        let log = WorkoutLog::new(&db);

        let mut bad = input("B", BodyPart::Chest);
        assert!(matches!(log.create(&bad), Err(TrackerError::Validation(_))));

        bad = input("Squat", BodyPart::Legs);
        bad.reps = 0;
        assert!(matches!(log.create(&bad), Err(TrackerError::Validation(_))));

        bad = input("Squat", BodyPart::Legs);
        bad.sets = -2;
        assert!(matches!(log.create(&bad), Err(TrackerError::Validation(_))));

        bad = input("Squat", BodyPart::Legs);
        bad.equipment = " x ".to_string();
        assert!(matches!(log.create(&bad), Err(TrackerError::Validation(_))));

        bad = input("Squat", BodyPart::Legs);
        bad.kg = Some(-1.0);
        assert!(matches!(log.create(&bad), Err(TrackerError::Validation(_))));

        assert!(matches!(
            log.create(&input("Nap", BodyPart::Rest)),
            Err(TrackerError::Validation(_))
        ));

        assert_eq!(db.collection_counts().unwrap().workouts, 0);
    }

    #[test]
    fn update_replaces_fields_but_keeps_id_and_date() {
        let db = Database::open_in_memory().unwrap();
        let log = WorkoutLog::new(&db);
        let original = log.create(&input("Deadlift", BodyPart::Back)).unwrap();

        let mut edit = input("Romanian Deadlift", BodyPart::LowerBack);
        edit.reps = 8;
        let updated = log.update(&original.id, &edit).unwrap().unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.date, original.date);
        assert_eq!(updated.workout_type, "Romanian Deadlift");
        assert_eq!(updated.body_part, BodyPart::LowerBack);
        assert_eq!(updated.reps, 8);
        assert_eq!(db.get_workout(&original.id).unwrap(), Some(updated));
    }

    #[test]
    fn update_of_unknown_id_returns_none() {
        let db = Database::open_in_memory().unwrap();
        let result = WorkoutLog::new(&db)
            .update("missing", &input("Curl", BodyPart::Arms))
            .unwrap();

        assert!(result.is_none());
        assert_eq!(db.collection_counts().unwrap().workouts, 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let log = WorkoutLog::new(&db);
        let workout = log.create(&input("Row", BodyPart::Back)).unwrap();

        assert!(log.delete(&workout.id).unwrap());
        assert!(!log.delete(&workout.id).unwrap());
        assert!(!log.delete("never-existed").unwrap());
        assert!(log.list(None).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_body_part_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let log = WorkoutLog::new(&db);

        let mut older = log.create(&input("Squat", BodyPart::Legs)).unwrap();
        older.date = "2024-07-01T10:00:00.000Z".to_string();
        let mut newer = log.create(&input("Lunge", BodyPart::Legs)).unwrap();
        newer.date = "2024-07-03T10:00:00.000Z".to_string();
        log.create(&input("Press", BodyPart::Shoulders)).unwrap();

        db.execute_raw(&format!(
            "UPDATE workouts SET date = '{}' WHERE id = '{}';
             UPDATE workouts SET date = '{}' WHERE id = '{}';",
            older.date, older.id, newer.date, newer.id
        ))
        .unwrap();

        let legs = log.list(Some(BodyPart::Legs)).unwrap();
        assert_eq!(legs, vec![newer, older]);
        assert_eq!(log.list(None).unwrap().len(), 3);
    }

    #[test]
    fn body_part_parses_loose_spellings() {
        assert_eq!("lower-back".parse::<BodyPart>().unwrap(), BodyPart::LowerBack);
        assert_eq!("Lower Back".parse::<BodyPart>().unwrap(), BodyPart::LowerBack);
        assert_eq!(" chest ".parse::<BodyPart>().unwrap(), BodyPart::Chest);
        assert!("elbows".parse::<BodyPart>().is_err());
    }
}
