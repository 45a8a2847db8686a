//! services/api/src/web/goals.rs
//!
//! Axum handlers for creating, listing and resolving goals.

use crate::error::ApiError;
use crate::web::rest::{user_id_from_headers, GoalProgressResponse, LevelResponse, LevelUpResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use dream_journal_core::domain::{ActivityKind, Goal, GoalPeriod, GoalStatus};
use dream_journal_core::engine::{GoalOutcome, GoalWithProgress};
use dream_journal_core::error::CoreError;
use dream_journal_core::SubmitGoal;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateGoalRequest {
    /// Which activity kind the goal counts: dream, mood, sleep or journal.
    pub goal_type: String,
    /// How many entries of that kind the window must collect.
    pub target_value: u32,
    /// daily, weekly, monthly or custom.
    pub period: String,
    /// Defaults to today (UTC).
    pub start_date: Option<NaiveDate>,
    /// Required for custom periods, ignored otherwise.
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListGoalsQuery {
    /// Filter to one status: active, completed, failed or abandoned.
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GoalResponse {
    pub id: Uuid,
    pub goal_type: String,
    pub target_value: u32,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Goal> for GoalResponse {
    fn from(goal: Goal) -> Self {
        GoalResponse {
            id: goal.id,
            goal_type: goal.goal_type.as_str().to_string(),
            target_value: goal.target_value,
            period: goal.period.as_str().to_string(),
            start_date: goal.start_date,
            end_date: goal.end_date,
            status: goal.status.as_str().to_string(),
            created_at: goal.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GoalWithProgressResponse {
    pub goal: GoalResponse,
    pub progress: GoalProgressResponse,
}

impl From<GoalWithProgress> for GoalWithProgressResponse {
    fn from(listed: GoalWithProgress) -> Self {
        GoalWithProgressResponse {
            goal: GoalResponse::from(listed.goal),
            progress: GoalProgressResponse::from(listed.progress),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GoalOutcomeResponse {
    pub goal: GoalResponse,
    pub xp_awarded: u64,
    pub total_xp: u64,
    pub level: LevelResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_up: Option<LevelUpResponse>,
}

impl From<GoalOutcome> for GoalOutcomeResponse {
    fn from(outcome: GoalOutcome) -> Self {
        GoalOutcomeResponse {
            goal: GoalResponse::from(outcome.goal),
            xp_awarded: outcome.xp_awarded,
            total_xp: outcome.total_xp,
            level: LevelResponse::from(outcome.level),
            level_up: outcome.level_up.map(LevelUpResponse::from),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a goal.
#[utoipa::path(
    post,
    path = "/goals",
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created", body = GoalResponse),
        (status = 400, description = "Unknown kind or period, zero target, or bad window"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_goal_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateGoalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let goal_type = ActivityKind::parse(&payload.goal_type).ok_or_else(|| {
        ApiError::Core(CoreError::Validation(format!(
            "unknown goal type '{}'",
            payload.goal_type
        )))
    })?;
    let period = GoalPeriod::parse(&payload.period).ok_or_else(|| {
        ApiError::Core(CoreError::Validation(format!(
            "unknown goal period '{}'",
            payload.period
        )))
    })?;
    let goal = app_state
        .engine
        .create_goal(
            user_id,
            SubmitGoal {
                goal_type,
                target_value: payload.target_value,
                period,
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(GoalResponse::from(goal))))
}

/// List goals with fresh progress, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/goals",
    responses(
        (status = 200, description = "The user's goals", body = [GoalWithProgressResponse]),
        (status = 400, description = "Unknown status filter or missing header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ListGoalsQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_goals_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListGoalsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let status = match &query.status {
        Some(raw) => Some(GoalStatus::parse(raw).ok_or_else(|| {
            ApiError::Core(CoreError::Validation(format!(
                "unknown goal status '{}'",
                raw
            )))
        })?),
        None => None,
    };
    let listed = app_state.engine.list_goals(user_id, status).await?;
    let out: Vec<GoalWithProgressResponse> = listed
        .into_iter()
        .map(GoalWithProgressResponse::from)
        .collect();
    Ok(Json(out))
}

/// Fetch one goal with fresh progress.
#[utoipa::path(
    get,
    path = "/goals/{goal_id}",
    responses(
        (status = 200, description = "The goal", body = GoalWithProgressResponse),
        (status = 404, description = "No goal with this id for this user"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("goal_id" = Uuid, Path, description = "The goal's id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_goal_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let listed = app_state.engine.get_goal(user_id, goal_id).await?;
    Ok(Json(GoalWithProgressResponse::from(listed)))
}

/// Confirm a reached goal as completed, awarding its XP.
#[utoipa::path(
    post,
    path = "/goals/{goal_id}/complete",
    responses(
        (status = 200, description = "Goal completed", body = GoalOutcomeResponse),
        (status = 404, description = "No goal with this id for this user"),
        (status = 409, description = "Goal already resolved, or target not reached yet"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("goal_id" = Uuid, Path, description = "The goal's id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn complete_goal_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let outcome = app_state.engine.complete_goal(user_id, goal_id).await?;
    Ok(Json(GoalOutcomeResponse::from(outcome)))
}

/// Give up on an active goal.
#[utoipa::path(
    post,
    path = "/goals/{goal_id}/abandon",
    responses(
        (status = 200, description = "Goal abandoned", body = GoalResponse),
        (status = 404, description = "No goal with this id for this user"),
        (status = 409, description = "Goal already resolved"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("goal_id" = Uuid, Path, description = "The goal's id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn abandon_goal_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let goal = app_state.engine.abandon_goal(user_id, goal_id).await?;
    Ok(Json(GoalResponse::from(goal)))
}
