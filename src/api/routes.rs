use crate::ai::{self, AiError, NutritionInfo};
use crate::config::Config;
use crate::db::{CollectionCounts, Database};
use crate::tracker::buckets::DailyBucketStore;
use crate::tracker::dashboard::{DashboardSummary, build_dashboard};
use crate::tracker::plan::{PlanDay, weekly_plan};
use crate::tracker::profile::{ProfileStore, ProfileUpdate, UserProfile};
use crate::tracker::window::{RollingWindowReader, RollingWindowSeries};
use crate::tracker::workouts::{BodyPart, Workout, WorkoutInput, WorkoutLog};
use crate::tracker::{MetricKind, TrackerError, date_key, parse_date_key};
use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub db: Arc<Mutex<Database>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/window/:metric", get(window))
        .route("/api/v1/water", post(water_add))
        .route("/api/v1/protein", post(protein_add))
        .route("/api/v1/steps", put(steps_set))
        .route("/api/v1/steps/sync", post(steps_sync))
        .route("/api/v1/workouts", get(workouts_list).post(workouts_create))
        .route(
            "/api/v1/workouts/:id",
            put(workouts_update).delete(workouts_delete),
        )
        .route("/api/v1/profile", get(profile_get).put(profile_put))
        .route("/api/v1/plan", get(plan))
        .route("/api/v1/ai/suggestions", post(ai_suggestions))
        .route("/api/v1/ai/nutrition", post(ai_nutrition))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutsQuery {
    body_part: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IntakePayload {
    amount: f64,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StepsPayload {
    steps: i64,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StepsSyncPayload {
    text: String,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionsPayload {
    fitness_goals: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutritionPayload {
    meal_description: String,
}

#[derive(Debug, Serialize)]
struct TotalPayload {
    date: String,
    metric: MetricKind,
    total: f64,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    db_path: String,
    api_port: u16,
    ai_enabled: bool,
    ai_api_key_set: bool,
    collections: CollectionCounts,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let db = state.db.lock().await;
    let collections = db.collection_counts().map_err(TrackerError::from)?;

    Ok(Json(StatusPayload {
        db_path: state.config.db_path.display().to_string(),
        api_port: state.config.api_port,
        ai_enabled: state.config.ai_enabled,
        ai_api_key_set: state.config.resolve_api_key().is_some(),
        collections,
    }))
}

async fn dashboard(
    State(state): State<ApiState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<DashboardSummary>> {
    let today = resolve_date(query.date.as_deref())?;
    let db = state.db.lock().await;

    Ok(Json(build_dashboard(&db, &state.config, today)?))
}

async fn window(
    State(state): State<ApiState>,
    Path(metric): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<RollingWindowSeries>> {
    let metric = metric.parse::<MetricKind>()?;
    let today = resolve_date(query.date.as_deref())?;
    let db = state.db.lock().await;

    Ok(Json(RollingWindowReader::new(&db).get_window(today, metric)?))
}

async fn water_add(
    State(state): State<ApiState>,
    Json(payload): Json<IntakePayload>,
) -> ApiResult<Json<TotalPayload>> {
    add_intake(&state, MetricKind::Water, payload).await
}

async fn protein_add(
    State(state): State<ApiState>,
    Json(payload): Json<IntakePayload>,
) -> ApiResult<Json<TotalPayload>> {
    add_intake(&state, MetricKind::Protein, payload).await
}

async fn add_intake(
    state: &ApiState,
    metric: MetricKind,
    payload: IntakePayload,
) -> ApiResult<Json<TotalPayload>> {
    let date = date_key(resolve_date(payload.date.as_deref())?);
    let db = state.db.lock().await;
    let total = DailyBucketStore::new(&db).apply_delta(&date, metric, payload.amount)?;

    Ok(Json(TotalPayload {
        date,
        metric,
        total,
    }))
}

async fn steps_set(
    State(state): State<ApiState>,
    Json(payload): Json<StepsPayload>,
) -> ApiResult<Json<TotalPayload>> {
    let date = date_key(resolve_date(payload.date.as_deref())?);
    let db = state.db.lock().await;
    DailyBucketStore::new(&db)
        .with_steps_goal(state.config.steps_goal)
        .set_steps(&date, payload.steps)?;

    Ok(Json(TotalPayload {
        date,
        metric: MetricKind::Steps,
        total: payload.steps as f64,
    }))
}

async fn steps_sync(
    State(state): State<ApiState>,
    Json(payload): Json<StepsSyncPayload>,
) -> ApiResult<Json<TotalPayload>> {
    let date = date_key(resolve_date(payload.date.as_deref())?);
    let db = state.db.lock().await;
    let steps = DailyBucketStore::new(&db)
        .with_steps_goal(state.config.steps_goal)
        .sync_steps_from_text(&date, &payload.text)?;

    Ok(Json(TotalPayload {
        date,
        metric: MetricKind::Steps,
        total: steps as f64,
    }))
}

async fn workouts_list(
    State(state): State<ApiState>,
    Query(query): Query<WorkoutsQuery>,
) -> ApiResult<Json<Vec<Workout>>> {
    let body_part = parse_body_part_filter(query.body_part.as_deref())?;
    let db = state.db.lock().await;

    Ok(Json(WorkoutLog::new(&db).list(body_part)?))
}

async fn workouts_create(
    State(state): State<ApiState>,
    Json(payload): Json<WorkoutInput>,
) -> ApiResult<(StatusCode, Json<Workout>)> {
    let db = state.db.lock().await;
    let workout = WorkoutLog::new(&db).create(&payload)?;

    Ok((StatusCode::CREATED, Json(workout)))
}

async fn workouts_update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<WorkoutInput>,
) -> ApiResult<Json<Workout>> {
    let db = state.db.lock().await;

    WorkoutLog::new(&db)
        .update(&id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No workout found with id: {id}")))
}

async fn workouts_delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let db = state.db.lock().await;
    let deleted = WorkoutLog::new(&db).delete(&id)?;

    Ok(Json(json!({ "id": id, "deleted": deleted })))
}

async fn profile_get(State(state): State<ApiState>) -> ApiResult<Json<UserProfile>> {
    let db = state.db.lock().await;
    Ok(Json(ProfileStore::new(&db).get_or_create()?))
}

async fn profile_put(
    State(state): State<ApiState>,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<Json<UserProfile>> {
    let db = state.db.lock().await;
    Ok(Json(ProfileStore::new(&db).update(&payload)?))
}

async fn plan(State(state): State<ApiState>) -> ApiResult<Json<Vec<PlanDay>>> {
    let db = state.db.lock().await;
    let workouts = WorkoutLog::new(&db).list(None)?;

    Ok(Json(weekly_plan(&workouts, &Local)))
}

async fn ai_suggestions(
    State(state): State<ApiState>,
    Json(payload): Json<SuggestionsPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    let workouts = {
        let db = state.db.lock().await;
        WorkoutLog::new(&db).list(None)?
    };

    let config = Arc::clone(&state.config);
    let suggestions = tokio::task::spawn_blocking(move || {
        ai::suggest_workouts(&config, &workouts, &payload.fitness_goals)
    })
    .await
    .context("AI task failed")??;

    Ok(Json(json!({ "suggestions": suggestions })))
}

async fn ai_nutrition(
    State(state): State<ApiState>,
    Json(payload): Json<NutritionPayload>,
) -> ApiResult<Json<NutritionInfo>> {
    let config = Arc::clone(&state.config);
    let info = tokio::task::spawn_blocking(move || {
        ai::analyze_nutrition(&config, &payload.meal_description)
    })
    .await
    .context("AI task failed")??;

    Ok(Json(info))
}

fn resolve_date(input: Option<&str>) -> Result<NaiveDate, TrackerError> {
    match input {
        Some(value) => parse_date_key(value),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_body_part_filter(input: Option<&str>) -> ApiResult<Option<BodyPart>> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value
            .parse::<BodyPart>()
            .map(Some)
            .map_err(|error| ApiError::BadRequest(error.to_string())),
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Upstream(String),
    Internal(anyhow::Error),
}

impl From<TrackerError> for ApiError {
    fn from(value: TrackerError) -> Self {
        match value {
            TrackerError::Validation(message) => Self::BadRequest(message),
            TrackerError::StoreUnavailable(_) => Self::Unavailable(value.to_string()),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(value: AiError) -> Self {
        match value {
            AiError::Validation(message) => Self::BadRequest(message),
            AiError::Disabled | AiError::MissingKey | AiError::Failed { .. } => {
                Self::Upstream(value.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
