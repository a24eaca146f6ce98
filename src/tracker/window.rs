use crate::db::Database;
use crate::tracker::{MetricKind, TrackerResult, date_key};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

pub const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub date: String,
    pub day_label: String,
    pub value: f64,
}

/// Trailing series ending today, oldest first, one entry per calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct RollingWindowSeries {
    pub metric: MetricKind,
    pub entries: Vec<WindowEntry>,
}

impl RollingWindowSeries {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.value).sum()
    }

    pub fn average(&self) -> f64 {
        self.total() / self.entries.len().max(1) as f64
    }
}

pub struct RollingWindowReader<'a> {
    db: &'a Database,
}

impl<'a> RollingWindowReader<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Read-only: dates without a bucket are reported as zero and are not
    /// created. A failed range query fails the whole window.
    pub fn get_window(&self, today: NaiveDate, metric: MetricKind) -> TrackerResult<RollingWindowSeries> {
        let start = today - Duration::days(WINDOW_DAYS - 1);

        let values = self
            .db
            .buckets_between(metric, &date_key(start), &date_key(today))?
            .into_iter()
            .map(|bucket| (bucket.id, bucket.value.amount()))
            .collect::<HashMap<_, _>>();

        let entries = (0..WINDOW_DAYS)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let key = date_key(date);
                WindowEntry {
                    value: values.get(&key).copied().unwrap_or_default(),
                    day_label: date.format("%a").to_string(),
                    date: key,
                }
            })
            .collect();

        Ok(RollingWindowSeries { metric, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerError;
    use crate::tracker::buckets::DailyBucketStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
    }

    #[test]
    fn window_fills_missing_days_with_zero() {
        let db = Database::open_in_memory().unwrap();
        let store = DailyBucketStore::new(&db);
        store.apply_delta("2024-07-20", MetricKind::Water, 2.4).unwrap();
        store.apply_delta("2024-07-18", MetricKind::Water, 1.8).unwrap();

        let series = RollingWindowReader::new(&db)
            .get_window(today(), MetricKind::Water)
            .unwrap();

        let pairs = series
            .entries
            .iter()
            .map(|entry| (entry.date.as_str(), entry.value))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("2024-07-14", 0.0),
                ("2024-07-15", 0.0),
                ("2024-07-16", 0.0),
                ("2024-07-17", 0.0),
                ("2024-07-18", 1.8),
                ("2024-07-19", 0.0),
                ("2024-07-20", 2.4),
            ]
        );
        assert_eq!(series.entries[0].day_label, "Sun");
        assert_eq!(series.entries[6].day_label, "Sat");
    }

    #[test]
    fn window_is_always_seven_days() {
        let db = Database::open_in_memory().unwrap();
        let reader = RollingWindowReader::new(&db);
        assert_eq!(
            reader.get_window(today(), MetricKind::Protein).unwrap().entries.len(),
            7
        );

        let store = DailyBucketStore::new(&db);
        for day in 10..=25 {
            store
                .apply_delta(&format!("2024-07-{day:02}"), MetricKind::Protein, 10.0)
                .unwrap();
        }

        let series = reader.get_window(today(), MetricKind::Protein).unwrap();
        assert_eq!(series.entries.len(), 7);
        assert_eq!(series.entries.first().unwrap().date, "2024-07-14");
        assert_eq!(series.entries.last().unwrap().date, "2024-07-20");
        assert_eq!(series.total(), 70.0);
        assert!(series.entries.windows(2).all(|pair| pair[0].date < pair[1].date));
    }

    #[test]
    fn single_bucket_lands_on_its_day_and_the_rest_are_zero() {
        let db = Database::open_in_memory().unwrap();
        DailyBucketStore::new(&db).set_steps("2024-07-16", 5200).unwrap();

        let series = RollingWindowReader::new(&db)
            .get_window(today(), MetricKind::Steps)
            .unwrap();

        assert_eq!(series.entries.len(), 7);
        assert_eq!(series.entries[2].date, "2024-07-16");
        assert_eq!(series.entries[2].value, 5200.0);
        assert!(
            series
                .entries
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != 2)
                .all(|(_, entry)| entry.value == 0.0)
        );
    }

    #[test]
    fn window_does_not_create_buckets() {
        let db = Database::open_in_memory().unwrap();
        RollingWindowReader::new(&db)
            .get_window(today(), MetricKind::Steps)
            .unwrap();

        assert_eq!(db.collection_counts().unwrap().daily_stats, 0);
    }

    #[test]
    fn window_spans_month_boundary() {
        let db = Database::open_in_memory().unwrap();
        DailyBucketStore::new(&db).set_steps("2024-02-28", 4000).unwrap();

        let series = RollingWindowReader::new(&db)
            .get_window(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), MetricKind::Steps)
            .unwrap();

        assert_eq!(series.entries[0].date, "2024-02-25");
        assert_eq!(series.entries[3].value, 4000.0);
        assert_eq!(series.entries[4].date, "2024-02-29");
    }

    #[test]
    fn failed_range_query_is_not_reported_as_zeros() {
        let db = Database::open_in_memory().unwrap();
        db.execute_raw("DROP TABLE protein_intake;").unwrap();

        let result = RollingWindowReader::new(&db).get_window(today(), MetricKind::Protein);
        assert!(matches!(result, Err(TrackerError::StoreUnavailable(_))));
    }
}
