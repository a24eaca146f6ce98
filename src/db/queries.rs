pub const CREATE_DAILY_STATS: &str = r#"
CREATE TABLE IF NOT EXISTS daily_stats (
  id          TEXT PRIMARY KEY,
  date        TEXT NOT NULL,
  steps       INTEGER NOT NULL DEFAULT 0,
  steps_goal  INTEGER NOT NULL DEFAULT 8000
);
"#;

pub const CREATE_WATER_INTAKE: &str = r#"
CREATE TABLE IF NOT EXISTS water_intake (
  id      TEXT PRIMARY KEY,
  date    TEXT NOT NULL,
  intake  REAL NOT NULL DEFAULT 0
);
"#;

pub const CREATE_PROTEIN_INTAKE: &str = r#"
CREATE TABLE IF NOT EXISTS protein_intake (
  id      TEXT PRIMARY KEY,
  date    TEXT NOT NULL,
  intake  REAL NOT NULL DEFAULT 0
);
"#;

pub const CREATE_WORKOUTS: &str = r#"
CREATE TABLE IF NOT EXISTS workouts (
  id         TEXT PRIMARY KEY,
  date       TEXT NOT NULL,
  type       TEXT NOT NULL,
  reps       INTEGER NOT NULL,
  sets       INTEGER NOT NULL,
  equipment  TEXT NOT NULL,
  body_part  TEXT NOT NULL,
  kg         REAL NOT NULL DEFAULT 0
);
"#;

pub const CREATE_USER_PROFILE: &str = r#"
CREATE TABLE IF NOT EXISTS user_profile (
  id            TEXT PRIMARY KEY,
  weight        TEXT NOT NULL,
  height        TEXT NOT NULL,
  last_updated  TEXT NOT NULL
);
"#;

pub const INDEX_WORKOUTS_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);";

pub const INDEX_WORKOUTS_BODY_PART: &str =
    "CREATE INDEX IF NOT EXISTS idx_workouts_body_part ON workouts(body_part);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_DAILY_STATS,
        CREATE_WATER_INTAKE,
        CREATE_PROTEIN_INTAKE,
        CREATE_WORKOUTS,
        CREATE_USER_PROFILE,
        INDEX_WORKOUTS_DATE,
        INDEX_WORKOUTS_BODY_PART,
    ]
}
