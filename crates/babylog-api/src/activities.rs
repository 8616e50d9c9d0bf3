// Activity HTTP routes
//
// CRUD over the store plus the interpretation endpoints. Handlers only map
// between HTTP and ActivityService.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use babylog_core::{ActivityFilter, ActivityPage, ActivityRecord, DailySummary};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::{ApiError, ErrorResponse};
use crate::services::ActivityService;

/// App state for activity routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ActivityService>,
}

impl AppState {
    pub fn new(service: ActivityService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// ============================================
// Request / response bodies
// ============================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct ParseRequest {
    /// Free text describing one or more activities
    #[schema(example = "20:00 190ml")]
    pub text: String,
    /// Known event types; read from the store when omitted
    #[serde(default)]
    pub known_types: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ParseUpdateRequest {
    #[schema(example = "change to 16:30")]
    pub instruction: String,
    pub existing: ActivityRecord,
    #[serde(default)]
    pub known_types: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivityResponse {
    pub activity: ActivityRecord,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogRequest {
    #[schema(example = "poo and 20:00 190ml")]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogResponse {
    pub activities: Vec<ActivityRecord>,
    /// True when the text was stored as a note because the interpreter was unavailable
    pub fallback: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AmendRequest {
    #[schema(example = "make it 200ml")]
    pub instruction: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateActivityResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FetchQuery {
    /// Window end (exclusive, RFC 3339). Defaults to now when `days` is given.
    #[param(value_type = Option<String>, format = DateTime)]
    pub before: Option<DateTime<FixedOffset>>,
    /// Window length in days. Defaults to 14 when `before` is given.
    #[param(example = 14)]
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// Local calendar day (YYYY-MM-DD). Defaults to today.
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

/// Create activity routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/activities",
            get(list_activities).post(create_activity),
        )
        .route("/v1/activities/parse", post(parse_activities))
        .route("/v1/activities/parse-update", post(parse_update))
        .route("/v1/activities/log", post(log_activities))
        .route("/v1/activities/summary", get(get_summary))
        .route(
            "/v1/activities/:id",
            get(get_activity)
                .put(replace_activity)
                .delete(delete_activity),
        )
        .route("/v1/activities/:id/amend", post(amend_activity))
        .with_state(state)
}

/// GET /v1/activities - Fetch activities, optionally one window at a time
#[utoipa::path(
    get,
    path = "/v1/activities",
    params(FetchQuery),
    responses(
        (status = 200, description = "Activities, newest first", body = ActivityPage),
        (status = 400, description = "Window out of range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<ActivityPage>, ApiError> {
    let filter = ActivityFilter {
        before: query.before,
        days: query.days,
    };
    let page = state.service.fetch(filter).await.map_err(|e| {
        tracing::error!("Failed to fetch activities: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(page))
}

/// POST /v1/activities - Append a structured activity
#[utoipa::path(
    post,
    path = "/v1/activities",
    request_body = ActivityRecord,
    responses(
        (status = 201, description = "Activity created", body = CreateActivityResponse),
        (status = 400, description = "Invalid activity", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    Json(record): Json<ActivityRecord>,
) -> Result<(StatusCode, Json<CreateActivityResponse>), ApiError> {
    let id = state.service.create(record).await.map_err(|e| {
        tracing::error!("Failed to create activity: {}", e);
        ApiError::from(e)
    })?;
    Ok((StatusCode::CREATED, Json(CreateActivityResponse { id })))
}

/// GET /v1/activities/{id} - Get activity by ID
#[utoipa::path(
    get,
    path = "/v1/activities/{id}",
    params(
        ("id" = Uuid, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Activity found", body = ActivityRecord),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActivityRecord>, ApiError> {
    let record = state.service.get(id).await?;
    Ok(Json(record))
}

/// PUT /v1/activities/{id} - Replace an activity
#[utoipa::path(
    put,
    path = "/v1/activities/{id}",
    params(
        ("id" = Uuid, Path, description = "Activity ID")
    ),
    request_body = ActivityRecord,
    responses(
        (status = 200, description = "Activity replaced", body = ActivityRecord),
        (status = 400, description = "Invalid activity", body = ErrorResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn replace_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(record): Json<ActivityRecord>,
) -> Result<Json<ActivityRecord>, ApiError> {
    let record = state.service.replace(id, record).await?;
    Ok(Json(record))
}

/// DELETE /v1/activities/{id} - Delete an activity
#[utoipa::path(
    delete,
    path = "/v1/activities/{id}",
    params(
        ("id" = Uuid, Path, description = "Activity ID")
    ),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/activities/parse - Interpret text without storing it
#[utoipa::path(
    post,
    path = "/v1/activities/parse",
    request_body = ParseRequest,
    responses(
        (status = 200, description = "Interpreted activities", body = ActivitiesResponse),
        (status = 400, description = "Empty input", body = ErrorResponse),
        (status = 422, description = "No activity recognized", body = ErrorResponse),
        (status = 502, description = "Interpreter failure", body = ErrorResponse)
    ),
    tag = "interpretation"
)]
pub async fn parse_activities(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ActivitiesResponse>, ApiError> {
    let activities = state
        .service
        .parse(&req.text, req.known_types)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to parse activity text: {}", e);
            ApiError::from(e)
        })?;
    Ok(Json(ActivitiesResponse { activities }))
}

/// POST /v1/activities/parse-update - Apply an instruction to a given activity without storing it
#[utoipa::path(
    post,
    path = "/v1/activities/parse-update",
    request_body = ParseUpdateRequest,
    responses(
        (status = 200, description = "Replacement activity", body = ActivityResponse),
        (status = 400, description = "Empty instruction or invalid activity", body = ErrorResponse),
        (status = 422, description = "Ambiguous instruction", body = ErrorResponse),
        (status = 502, description = "Interpreter failure", body = ErrorResponse)
    ),
    tag = "interpretation"
)]
pub async fn parse_update(
    State(state): State<AppState>,
    Json(req): Json<ParseUpdateRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state
        .service
        .parse_update(&req.instruction, &req.existing, req.known_types)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to parse update instruction: {}", e);
            ApiError::from(e)
        })?;
    Ok(Json(ActivityResponse { activity }))
}

/// POST /v1/activities/log - Interpret text and store the result
#[utoipa::path(
    post,
    path = "/v1/activities/log",
    request_body = LogRequest,
    responses(
        (status = 201, description = "Activities logged", body = LogResponse),
        (status = 400, description = "Empty input", body = ErrorResponse),
        (status = 422, description = "No activity recognized", body = ErrorResponse),
        (status = 502, description = "Interpreter failure", body = ErrorResponse)
    ),
    tag = "interpretation"
)]
pub async fn log_activities(
    State(state): State<AppState>,
    Json(req): Json<LogRequest>,
) -> Result<(StatusCode, Json<LogResponse>), ApiError> {
    let outcome = state.service.log(&req.text).await.map_err(|e| {
        tracing::warn!("Failed to log activity text: {}", e);
        ApiError::from(e)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(LogResponse {
            activities: outcome.activities,
            fallback: outcome.fallback,
        }),
    ))
}

/// POST /v1/activities/{id}/amend - Apply an instruction to a stored activity
#[utoipa::path(
    post,
    path = "/v1/activities/{id}/amend",
    params(
        ("id" = Uuid, Path, description = "Activity ID")
    ),
    request_body = AmendRequest,
    responses(
        (status = 200, description = "Activity amended", body = ActivityResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 422, description = "Ambiguous instruction", body = ErrorResponse),
        (status = 502, description = "Interpreter failure", body = ErrorResponse)
    ),
    tag = "interpretation"
)]
pub async fn amend_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AmendRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state
        .service
        .amend(id, &req.instruction)
        .await
        .map_err(|e| {
            tracing::warn!(activity_id = %id, "Failed to amend activity: {}", e);
            ApiError::from(e)
        })?;
    Ok(Json(ActivityResponse { activity }))
}

/// GET /v1/activities/summary - Daily counts and feed total
#[utoipa::path(
    get,
    path = "/v1/activities/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Daily summary", body = DailySummary),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    let summary = state.service.summary(query.date).await.map_err(|e| {
        tracing::error!("Failed to build daily summary: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(summary))
}
