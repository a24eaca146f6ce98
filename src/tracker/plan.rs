use crate::tracker::workouts::{BodyPart, Workout};
use chrono::{DateTime, Datelike, TimeZone, Weekday};
use serde::Serialize;

pub const WEEKLY_PLAN: [(Weekday, BodyPart); 7] = [
    (Weekday::Mon, BodyPart::Chest),
    (Weekday::Tue, BodyPart::Back),
    (Weekday::Wed, BodyPart::Legs),
    (Weekday::Thu, BodyPart::Shoulders),
    (Weekday::Fri, BodyPart::Arms),
    (Weekday::Sat, BodyPart::Core),
    (Weekday::Sun, BodyPart::Rest),
];

#[derive(Debug, Clone, Serialize)]
pub struct PlanDay {
    pub day: String,
    pub focus: BodyPart,
    pub workouts: Vec<Workout>,
}

/// Groups workouts under the plan day matching the weekday they were logged
/// on, as seen in `tz`. Workouts with an unparseable date are skipped.
pub fn weekly_plan<Tz: TimeZone>(workouts: &[Workout], tz: &Tz) -> Vec<PlanDay> {
    WEEKLY_PLAN
        .iter()
        .map(|(weekday, focus)| PlanDay {
            day: weekday_name(*weekday).to_string(),
            focus: *focus,
            workouts: workouts
                .iter()
                .filter(|workout| logged_weekday(workout, tz) == Some(*weekday))
                .cloned()
                .collect(),
        })
        .collect()
}

pub fn focus_for(weekday: Weekday) -> BodyPart {
    WEEKLY_PLAN
        .iter()
        .find(|(day, _)| *day == weekday)
        .map(|(_, focus)| *focus)
        .unwrap_or(BodyPart::Rest)
}

fn logged_weekday<Tz: TimeZone>(workout: &Workout, tz: &Tz) -> Option<Weekday> {
    DateTime::parse_from_rfc3339(&workout.date)
        .ok()
        .map(|logged| logged.with_timezone(tz).weekday())
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn workout(id: &str, date: &str) -> Workout {
        Workout {
            id: id.to_string(),
            date: date.to_string(),
            workout_type: "Bench Press".to_string(),
            reps: 8,
            sets: 4,
            equipment: "Barbell".to_string(),
            body_part: BodyPart::Chest,
            kg: 70.0,
        }
    }

    #[test]
    fn plan_covers_the_week_in_order() {
        let plan = weekly_plan(&[], &Utc);
        let days = plan.iter().map(|day| day.day.as_str()).collect::<Vec<_>>();

        assert_eq!(
            days,
            vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(plan[6].focus, BodyPart::Rest);
    }

    #[test]
    fn workouts_land_on_their_weekday() {
        let workouts = vec![
            workout("mon", "2024-07-15T09:00:00.000Z"),
            workout("sat", "2024-07-20T18:30:00.000Z"),
            workout("bad", "yesterday"),
        ];

        let plan = weekly_plan(&workouts, &Utc);
        assert_eq!(plan[0].workouts.len(), 1);
        assert_eq!(plan[0].workouts[0].id, "mon");
        assert_eq!(plan[5].workouts[0].id, "sat");
        assert_eq!(plan.iter().map(|day| day.workouts.len()).sum::<usize>(), 2);
    }

    #[test]
    fn weekday_follows_the_given_timezone() {
        let workouts = vec![workout("late", "2024-07-20T23:30:00.000Z")];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        let plan = weekly_plan(&workouts, &tokyo);
        assert_eq!(plan[6].workouts[0].id, "late");
    }

    #[test]
    fn focus_lookup() {
        assert_eq!(focus_for(Weekday::Wed), BodyPart::Legs);
        assert_eq!(focus_for(Weekday::Sun), BodyPart::Rest);
    }
}
