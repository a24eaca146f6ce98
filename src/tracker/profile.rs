use crate::db::Database;
use crate::tracker::{TrackerError, TrackerResult};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::info;

pub const PROFILE_ID: &str = "main";
pub const DEFAULT_WEIGHT: &str = "75 kg";
pub const DEFAULT_HEIGHT: &str = "180 cm";
const KG_PER_LB: f64 = 0.453_592_37;

static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(lbs?|pounds?)?").expect("weight pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub weight: String,
    pub height: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub weight: Option<String>,
    pub height: Option<String>,
}

pub struct ProfileStore<'a> {
    db: &'a Database,
}

impl<'a> ProfileStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get_or_create(&self) -> TrackerResult<UserProfile> {
        if let Some(profile) = self.db.get_profile(PROFILE_ID)? {
            return Ok(profile);
        }

        let profile = UserProfile {
            id: PROFILE_ID.to_string(),
            weight: DEFAULT_WEIGHT.to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            last_updated: now_iso(),
        };

        if !self.db.insert_profile_if_absent(&profile)? {
            return self
                .db
                .get_profile(PROFILE_ID)?
                .ok_or_else(|| TrackerError::StoreUnavailable(anyhow::anyhow!(
                    "user profile vanished after creation"
                )));
        }

        info!("created default user profile");
        Ok(profile)
    }

    pub fn update(&self, update: &ProfileUpdate) -> TrackerResult<UserProfile> {
        let weight = non_empty(update.weight.as_deref(), "Weight")?;
        let height = non_empty(update.height.as_deref(), "Height")?;

        let mut profile = self.get_or_create()?;
        if let Some(weight) = weight {
            profile.weight = weight;
        }
        if let Some(height) = height {
            profile.height = height;
        }
        profile.last_updated = now_iso();

        self.db.update_profile(&profile)?;
        info!(weight = %profile.weight, height = %profile.height, "updated user profile");

        Ok(profile)
    }
}

fn non_empty(value: Option<&str>, field: &str) -> TrackerResult<Option<String>> {
    match value.map(str::trim) {
        Some("") => Err(TrackerError::validation(format!("{field} cannot be empty"))),
        Some(value) => Ok(Some(value.to_string())),
        None => Ok(None),
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// First number in the free-text weight, converted to kilograms when the
/// text says pounds.
pub fn weight_in_kg(weight: &str) -> Option<f64> {
    let captures = WEIGHT.captures(weight)?;
    let amount = captures[1].replace(',', ".").parse::<f64>().ok()?;

    match captures.get(2) {
        Some(_) => Some(amount * KG_PER_LB),
        None => Some(amount),
    }
}

pub fn protein_goal(profile: &UserProfile, protein_per_kg: f64) -> f64 {
    weight_in_kg(&profile.weight)
        .map(|kg| kg * protein_per_kg)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn profile_is_created_once() {
        let db = Database::open_in_memory().unwrap();
        let store = ProfileStore::new(&db);

        let first = store.get_or_create().unwrap();
        assert_eq!(first.id, PROFILE_ID);
        assert_eq!(first.weight, DEFAULT_WEIGHT);

        let second = store.get_or_create().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_replaces_given_fields() {
        let db = Database::open_in_memory().unwrap();
        let store = ProfileStore::new(&db);

        let updated = store
            .update(&ProfileUpdate {
                weight: Some(" 82 kg ".to_string()),
                height: None,
            })
            .unwrap();

        assert_eq!(updated.weight, "82 kg");
        assert_eq!(updated.height, DEFAULT_HEIGHT);
        assert_eq!(store.get_or_create().unwrap(), updated);
    }

    #[test]
    fn empty_fields_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let result = ProfileStore::new(&db).update(&ProfileUpdate {
            weight: Some("   ".to_string()),
            height: None,
        });

        assert!(matches!(result, Err(TrackerError::Validation(_))));
        assert!(db.get_profile(PROFILE_ID).unwrap().is_none());
    }

    #[test]
    fn weight_parsing_handles_units() {
        assert_close(weight_in_kg("75 kg").unwrap(), 75.0);
        assert_close(weight_in_kg("72,5kg").unwrap(), 72.5);
        assert_close(weight_in_kg("165 lbs").unwrap(), 74.84);
        assert!(weight_in_kg("heavy").is_none());
    }

    #[test]
    fn protein_goal_scales_with_weight() {
        let mut profile = UserProfile {
            id: PROFILE_ID.to_string(),
            weight: "75 kg".to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            last_updated: String::new(),
        };
        assert_close(protein_goal(&profile, 1.6), 120.0);

        profile.weight = "165 lbs".to_string();
        assert_close(protein_goal(&profile, 1.6), 119.75);

        profile.weight = "unknown".to_string();
        assert_eq!(protein_goal(&profile, 1.6), 0.0);
    }
}
