use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::budget_validation::BudgetError;
use crate::conflicts::{ConflictSummary, ConflictType, Severity};
use crate::engine::{ConflictQuery, EngineError, TimetableEngine};
use crate::lesson::{GroupRef, Lesson};
use crate::persistence::Catalog;
use crate::resource::{Schedule, ScheduleDraft, ScheduleId};
use crate::teaching_load::{
    AssignmentDraft, AssignmentId, BudgetUsage, ContractId, SubjectAssignment, Workload,
    WorkloadDraft, WorkloadId,
};
use crate::warnings::WorkloadWarningReport;

pub type SharedEngine = Arc<RwLock<TimetableEngine<Box<dyn Catalog>>>>;

#[derive(Clone)]
pub struct AppState {
    engine: SharedEngine,
}

impl AppState {
    pub fn new(engine: TimetableEngine<Box<dyn Catalog>>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    fn engine(&self) -> SharedEngine {
        self.engine.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Rejected { code: &'static str, message: String },
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::Budget(err @ (BudgetError::BudgetExceeded { .. }
            | BudgetError::DuplicateBinding { .. })) => ApiError::Rejected {
                code: err.code(),
                message: err.to_string(),
            },
            EngineError::Budget(
                err @ (BudgetError::UnknownContract(_)
                | BudgetError::UnknownWorkload(_)
                | BudgetError::UnknownAssignment(_)),
            ) => ApiError::NotFound(err.to_string()),
            EngineError::InvalidQuery(message) => ApiError::Invalid(message),
            other => {
                error!(error = %other, "request failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Rejected { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConflictParams {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    date: Option<NaiveDate>,
    /// Comma separated, e.g. `room,group`.
    conflict_types: Option<String>,
    schedule_id: Option<ScheduleId>,
    severity: Option<String>,
}

impl ConflictParams {
    fn into_query(self) -> Result<ConflictQuery, ApiError> {
        let conflict_types = self
            .conflict_types
            .as_deref()
            .map(ConflictType::parse_list)
            .transpose()
            .map_err(ApiError::invalid)?;
        let severity = self
            .severity
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()
            .map_err(ApiError::invalid)?;
        Ok(ConflictQuery {
            date_from: self.date_from,
            date_to: self.date_to,
            date: self.date,
            conflict_types,
            schedule_id: self.schedule_id,
            severity,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct CalendarParams {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

/// Body of the dry-run endpoints: the draft plus the row id when checking
/// an update.
#[derive(Debug, Deserialize)]
struct ValidatePayload<T> {
    #[serde(flatten)]
    draft: T,
    #[serde(default)]
    id: Option<i32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/conflicts", get(detect_conflicts))
        .route("/schedules", post(create_schedule))
        .route("/schedules/:id/workload-warnings", get(workload_warnings))
        .route("/schedules/:id/lessons", get(calendar_lessons))
        .route("/schedules/:id/groups", get(schedule_groups))
        .route("/workloads", post(create_workload))
        .route("/workloads/validate", post(validate_workload))
        .route("/workloads/:id", put(update_workload))
        .route("/workloads/:id/usage", get(workload_usage))
        .route("/assignments", post(create_assignment))
        .route("/assignments/validate", post(validate_assignment))
        .route("/assignments/:id", put(update_assignment))
        .route("/contracts/:id/usage", get(contract_usage))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, engine: TimetableEngine<Box<dyn Catalog>>) -> std::io::Result<()> {
    let state = AppState::new(engine);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn detect_conflicts(
    State(state): State<AppState>,
    Query(params): Query<ConflictParams>,
) -> Result<Json<ConflictSummary>, ApiError> {
    let query = params.into_query()?;
    let engine = state.engine();
    let summary = {
        let guard = engine.read();
        guard.detect_conflicts(&query)?
    };
    Ok(Json(summary))
}

async fn workload_warnings(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Json<WorkloadWarningReport>, ApiError> {
    let engine = state.engine();
    let report = {
        let guard = engine.read();
        guard.report_workload_warnings(schedule_id)?
    };
    Ok(Json(report))
}

async fn calendar_lessons(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    let engine = state.engine();
    let lessons = {
        let guard = engine.read();
        guard.calendar_lessons(schedule_id, params.date_from, params.date_to)?
    };
    Ok(Json(lessons))
}

async fn schedule_groups(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Json<Vec<GroupRef>>, ApiError> {
    let engine = state.engine();
    let groups = {
        let guard = engine.read();
        guard.schedule_groups(schedule_id)?
    };
    Ok(Json(groups))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(draft): Json<ScheduleDraft>,
) -> Result<(StatusCode, Json<Schedule>), ApiError> {
    let engine = state.engine();
    let schedule = {
        let mut guard = engine.write();
        guard.create_schedule(draft)?
    };
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn create_workload(
    State(state): State<AppState>,
    Json(draft): Json<WorkloadDraft>,
) -> Result<(StatusCode, Json<Workload>), ApiError> {
    let engine = state.engine();
    let workload = {
        let mut guard = engine.write();
        guard.create_workload(draft)?
    };
    Ok((StatusCode::CREATED, Json(workload)))
}

async fn update_workload(
    State(state): State<AppState>,
    Path(workload_id): Path<WorkloadId>,
    Json(draft): Json<WorkloadDraft>,
) -> Result<Json<Workload>, ApiError> {
    let engine = state.engine();
    let workload = {
        let mut guard = engine.write();
        guard.update_workload(workload_id, draft)?
    };
    Ok(Json(workload))
}

async fn validate_workload(
    State(state): State<AppState>,
    Json(payload): Json<ValidatePayload<WorkloadDraft>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine();
    {
        let guard = engine.read();
        guard.validate_workload(&payload.draft, payload.id)?;
    }
    Ok(Json(json!({ "valid": true })))
}

async fn workload_usage(
    State(state): State<AppState>,
    Path(workload_id): Path<WorkloadId>,
) -> Result<Json<BudgetUsage>, ApiError> {
    let engine = state.engine();
    let usage = {
        let guard = engine.read();
        guard.workload_usage(workload_id)?
    };
    Ok(Json(usage))
}

async fn create_assignment(
    State(state): State<AppState>,
    Json(draft): Json<AssignmentDraft>,
) -> Result<(StatusCode, Json<SubjectAssignment>), ApiError> {
    let engine = state.engine();
    let assignment = {
        let mut guard = engine.write();
        guard.create_assignment(draft)?
    };
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn update_assignment(
    State(state): State<AppState>,
    Path(assignment_id): Path<AssignmentId>,
    Json(draft): Json<AssignmentDraft>,
) -> Result<Json<SubjectAssignment>, ApiError> {
    let engine = state.engine();
    let assignment = {
        let mut guard = engine.write();
        guard.update_assignment(assignment_id, draft)?
    };
    Ok(Json(assignment))
}

async fn validate_assignment(
    State(state): State<AppState>,
    Json(payload): Json<ValidatePayload<AssignmentDraft>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine();
    {
        let guard = engine.read();
        guard.validate_assignment(&payload.draft, payload.id)?;
    }
    Ok(Json(json!({ "valid": true })))
}

async fn contract_usage(
    State(state): State<AppState>,
    Path(contract_id): Path<ContractId>,
) -> Result<Json<BudgetUsage>, ApiError> {
    let engine = state.engine();
    let usage = {
        let guard = engine.read();
        guard.contract_usage(contract_id)?
    };
    Ok(Json(usage))
}
