//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the activity endpoints (dreams, moods,
//! sleep, journal) plus dream interpretation, and the master definition for
//! the OpenAPI specification.

use crate::error::ApiError;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use dream_journal_core::achievements::AchievementDef;
use dream_journal_core::domain::{ActivityDetails, ActivityEntry, ActivityKind, DreamInterpretation};
use dream_journal_core::engine::ActivityOutcome;
use dream_journal_core::error::CoreError;
use dream_journal_core::goals::GoalProgress;
use dream_journal_core::levels::{LevelInfo, LevelUp};
use dream_journal_core::streaks::StreakUpdate;
use dream_journal_core::SubmitActivity;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_dream_handler,
        list_dreams_handler,
        get_dream_handler,
        interpret_dream_handler,
        create_mood_handler,
        create_sleep_handler,
        create_journal_handler,
        crate::web::goals::create_goal_handler,
        crate::web::goals::list_goals_handler,
        crate::web::goals::get_goal_handler,
        crate::web::goals::complete_goal_handler,
        crate::web::goals::abandon_goal_handler,
        crate::web::progress::list_streaks_handler,
        crate::web::progress::freeze_streak_handler,
        crate::web::progress::list_achievements_handler,
        crate::web::progress::stats_handler,
    ),
    components(
        schemas(
            CreateDreamRequest,
            CreateMoodRequest,
            CreateSleepRequest,
            CreateJournalRequest,
            ActivityOutcomeResponse,
            EntryResponse,
            DreamDetailResponse,
            InterpretationResponse,
            StreakUpdateResponse,
            GoalProgressResponse,
            AchievementSummaryResponse,
            LevelResponse,
            LevelUpResponse,
            crate::web::goals::CreateGoalRequest,
            crate::web::goals::GoalResponse,
            crate::web::goals::GoalWithProgressResponse,
            crate::web::goals::GoalOutcomeResponse,
            crate::web::progress::StreakResponse,
            crate::web::progress::AchievementResponse,
            crate::web::progress::StatsResponse,
            crate::web::progress::TagCountResponse,
        )
    ),
    tags(
        (name = "Dream Journal API", description = "API endpoints for dream journaling, sleep scoring and progress tracking.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Identity Extraction
//=========================================================================================

/// Pull the caller's id from the `x-user-id` header. Authentication proper
/// is a collaborator concern; every route trusts this header.
pub fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Core(CoreError::Validation(
                "x-user-id header is required".to_string(),
            ))
        })?;
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::Core(CoreError::Validation(
            "x-user-id must be a valid UUID".to_string(),
        ))
    })
}

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateDreamRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lucid: bool,
    /// Calendar day of the dream; defaults to today (UTC).
    pub entry_date: Option<NaiveDate>,
    /// Spend a freeze token if this entry arrives one day late.
    #[serde(default)]
    pub use_streak_freeze: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateMoodRequest {
    /// Mood rating on a 1-5 scale.
    pub rating: u8,
    pub note: Option<String>,
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub use_streak_freeze: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSleepRequest {
    /// Hours slept, fractional allowed.
    pub duration_hours: f64,
    /// Subjective quality, 1-5.
    pub quality_rating: u8,
    /// How rested the user woke up, 1-5.
    pub restfulness_rating: u8,
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub use_streak_freeze: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateJournalRequest {
    pub body: String,
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub use_streak_freeze: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDreamsQuery {
    /// Earliest entry date to include, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest entry date to include, inclusive.
    pub to: Option<NaiveDate>,
    /// Page size, capped at 200. Defaults to 50.
    pub limit: Option<i64>,
    /// Entries to skip. Defaults to 0.
    pub offset: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

//=========================================================================================
// Response Payloads
//=========================================================================================

/// One stored journal entry; only the fields for its kind are present.
#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub id: Uuid,
    pub kind: String,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lucid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restfulness_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<ActivityEntry> for EntryResponse {
    fn from(entry: ActivityEntry) -> Self {
        let mut out = EntryResponse {
            id: entry.id,
            kind: entry.kind().as_str().to_string(),
            entry_date: entry.entry_date,
            created_at: entry.created_at,
            title: None,
            description: None,
            tags: None,
            lucid: None,
            rating: None,
            note: None,
            duration_hours: None,
            quality_rating: None,
            restfulness_rating: None,
            body: None,
        };
        match entry.details {
            ActivityDetails::Dream {
                title,
                description,
                tags,
                lucid,
            } => {
                out.title = Some(title);
                out.description = Some(description);
                out.tags = Some(tags);
                out.lucid = Some(lucid);
            }
            ActivityDetails::Mood { rating, note } => {
                out.rating = Some(rating);
                out.note = note;
            }
            ActivityDetails::Sleep { sample } => {
                out.duration_hours = Some(sample.duration_hours);
                out.quality_rating = Some(sample.quality_rating);
                out.restfulness_rating = Some(sample.restfulness_rating);
            }
            ActivityDetails::Journal { body } => {
                out.body = Some(body);
            }
        }
        out
    }
}

#[derive(Serialize, ToSchema)]
pub struct LevelResponse {
    pub level: u32,
    pub title: String,
    pub total_xp: u64,
    pub xp_into_level: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_to_next_level: Option<u64>,
    pub progress_percentage: u8,
}

impl From<LevelInfo> for LevelResponse {
    fn from(info: LevelInfo) -> Self {
        LevelResponse {
            level: info.level,
            title: info.title,
            total_xp: info.total_xp,
            xp_into_level: info.xp_into_level,
            xp_to_next_level: info.xp_to_next_level,
            progress_percentage: info.progress_percentage,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LevelUpResponse {
    pub from_level: u32,
    pub to_level: u32,
    pub new_title: String,
}

impl From<LevelUp> for LevelUpResponse {
    fn from(level_up: LevelUp) -> Self {
        LevelUpResponse {
            from_level: level_up.from_level,
            to_level: level_up.to_level,
            new_title: level_up.new_title,
        }
    }
}

/// What one submission did to one streak.
#[derive(Serialize, ToSchema)]
pub struct StreakUpdateResponse {
    pub kind: String,
    pub change: String,
    pub current_length: u32,
    pub longest_length: u32,
    pub freeze_used: bool,
    pub freeze_earned: bool,
    pub freezes_available: u32,
}

impl From<&StreakUpdate> for StreakUpdateResponse {
    fn from(update: &StreakUpdate) -> Self {
        StreakUpdateResponse {
            kind: update.streak.kind.as_str().to_string(),
            change: update.change.as_str().to_string(),
            current_length: update.streak.current_length,
            longest_length: update.streak.longest_length,
            freeze_used: update.freeze_used,
            freeze_earned: update.freeze_earned,
            freezes_available: update.streak.freezes_available,
        }
    }
}

/// Fresh progress of one goal.
#[derive(Serialize, ToSchema)]
pub struct GoalProgressResponse {
    pub goal_id: Uuid,
    pub current_value: u32,
    pub target_value: u32,
    pub percentage: u8,
    /// Days left in the window; 0 on the final day, negative after it.
    pub days_remaining: i64,
    pub is_on_track: bool,
    pub target_reached: bool,
}

impl From<GoalProgress> for GoalProgressResponse {
    fn from(progress: GoalProgress) -> Self {
        GoalProgressResponse {
            goal_id: progress.goal_id,
            current_value: progress.current_value,
            target_value: progress.target_value,
            percentage: progress.percentage,
            days_remaining: progress.days_remaining,
            is_on_track: progress.is_on_track,
            target_reached: progress.target_reached,
        }
    }
}

/// An achievement earned by the current request.
#[derive(Serialize, ToSchema)]
pub struct AchievementSummaryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tier: String,
    pub xp_reward: u64,
}

impl From<&AchievementDef> for AchievementSummaryResponse {
    fn from(def: &AchievementDef) -> Self {
        AchievementSummaryResponse {
            id: def.id.as_str().to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            tier: def.tier.as_str().to_string(),
            xp_reward: def.xp_reward,
        }
    }
}

/// Everything a submission changed, sent back in one envelope.
#[derive(Serialize, ToSchema)]
pub struct ActivityOutcomeResponse {
    pub entry: EntryResponse,
    /// Sleep score, present for sleep entries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub xp_awarded: u64,
    pub total_xp: u64,
    /// Length of the activity's own streak after this submission.
    pub new_streak_length: u32,
    pub streaks: Vec<StreakUpdateResponse>,
    pub goals_updated: Vec<GoalProgressResponse>,
    pub achievements_unlocked: Vec<AchievementSummaryResponse>,
    pub level: LevelResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_up: Option<LevelUpResponse>,
}

impl From<ActivityOutcome> for ActivityOutcomeResponse {
    fn from(outcome: ActivityOutcome) -> Self {
        ActivityOutcomeResponse {
            entry: EntryResponse::from(outcome.entry),
            score: outcome.sleep_score.as_ref().map(|s| s.score),
            grade: outcome
                .sleep_score
                .as_ref()
                .map(|s| s.grade.as_str().to_string()),
            xp_awarded: outcome.xp_awarded,
            total_xp: outcome.total_xp,
            new_streak_length: outcome
                .streaks
                .first()
                .map(|u| u.streak.current_length)
                .unwrap_or(0),
            streaks: outcome.streaks.iter().map(StreakUpdateResponse::from).collect(),
            goals_updated: outcome
                .goals
                .into_iter()
                .map(GoalProgressResponse::from)
                .collect(),
            achievements_unlocked: outcome
                .unlocked
                .iter()
                .map(|def| AchievementSummaryResponse::from(*def))
                .collect(),
            level: LevelResponse::from(outcome.level),
            level_up: outcome.level_up.map(LevelUpResponse::from),
        }
    }
}

/// A stored interpretation of one dream.
#[derive(Serialize, ToSchema)]
pub struct InterpretationResponse {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub summary: String,
    pub symbols: Vec<String>,
    pub reflection: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl From<DreamInterpretation> for InterpretationResponse {
    fn from(interpretation: DreamInterpretation) -> Self {
        InterpretationResponse {
            id: interpretation.id,
            entry_id: interpretation.entry_id,
            summary: interpretation.summary,
            symbols: interpretation.symbols,
            reflection: interpretation.reflection,
            model: interpretation.model,
            created_at: interpretation.created_at,
        }
    }
}

/// One dream together with its interpretation, when one exists.
#[derive(Serialize, ToSchema)]
pub struct DreamDetailResponse {
    pub entry: EntryResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<InterpretationResponse>,
}

//=========================================================================================
// Activity Handlers
//=========================================================================================

/// Run one submission through the engine and wrap the outcome.
async fn submit(
    app_state: &AppState,
    headers: &HeaderMap,
    entry_date: Option<NaiveDate>,
    use_streak_freeze: bool,
    details: ActivityDetails,
) -> Result<(StatusCode, Json<ActivityOutcomeResponse>), ApiError> {
    let user_id = user_id_from_headers(headers)?;
    let outcome = app_state
        .engine
        .submit_activity(
            user_id,
            SubmitActivity {
                entry_date,
                details,
                use_streak_freeze,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ActivityOutcomeResponse::from(outcome))))
}

/// Log a dream.
#[utoipa::path(
    post,
    path = "/dreams",
    request_body = CreateDreamRequest,
    responses(
        (status = 201, description = "Dream recorded", body = ActivityOutcomeResponse),
        (status = 400, description = "Invalid payload, missing header, or future date"),
        (status = 409, description = "Freeze requested but no token available"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_dream_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateDreamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    submit(
        &app_state,
        &headers,
        payload.entry_date,
        payload.use_streak_freeze,
        ActivityDetails::Dream {
            title: payload.title,
            description: payload.description,
            tags: payload.tags,
            lucid: payload.lucid,
        },
    )
    .await
}

/// List the user's dream entries, newest first.
#[utoipa::path(
    get,
    path = "/dreams",
    responses(
        (status = 200, description = "Dream entries", body = [EntryResponse]),
        (status = 400, description = "Missing or malformed x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ListDreamsQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_dreams_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListDreamsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let entries = app_state
        .engine
        .list_entries(
            user_id,
            Some(ActivityKind::Dream),
            query.from,
            query.to,
            limit,
            offset,
        )
        .await?;
    let listed: Vec<EntryResponse> = entries.into_iter().map(EntryResponse::from).collect();
    Ok(Json(listed))
}

/// Fetch one dream with its interpretation, when one has been generated.
#[utoipa::path(
    get,
    path = "/dreams/{entry_id}",
    responses(
        (status = 200, description = "The dream entry", body = DreamDetailResponse),
        (status = 404, description = "No dream with this id for this user"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("entry_id" = Uuid, Path, description = "The dream entry's id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_dream_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let entry = app_state.engine.fetch_entry(user_id, entry_id).await?;
    if entry.kind() != ActivityKind::Dream {
        return Err(ApiError::Core(CoreError::NotFound(format!(
            "dream {} not found",
            entry_id
        ))));
    }
    let interpretation = app_state
        .engine
        .interpretation_for_entry(user_id, entry_id)
        .await?;
    Ok(Json(DreamDetailResponse {
        entry: EntryResponse::from(entry),
        interpretation: interpretation.map(InterpretationResponse::from),
    }))
}

/// Generate (or return the stored) interpretation for a dream.
#[utoipa::path(
    post,
    path = "/dreams/{entry_id}/interpretation",
    responses(
        (status = 200, description = "The interpretation, existing or newly generated", body = InterpretationResponse),
        (status = 400, description = "The entry is not a dream"),
        (status = 404, description = "No entry with this id for this user"),
        (status = 500, description = "Interpretation service failure")
    ),
    params(
        ("entry_id" = Uuid, Path, description = "The dream entry's id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn interpret_dream_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let interpretation = app_state.engine.interpret_dream(user_id, entry_id).await?;
    Ok(Json(InterpretationResponse::from(interpretation)))
}

/// Log a mood check-in.
#[utoipa::path(
    post,
    path = "/moods",
    request_body = CreateMoodRequest,
    responses(
        (status = 201, description = "Mood recorded", body = ActivityOutcomeResponse),
        (status = 400, description = "Rating outside 1-5, missing header, or future date"),
        (status = 409, description = "Freeze requested but no token available"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_mood_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateMoodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    submit(
        &app_state,
        &headers,
        payload.entry_date,
        payload.use_streak_freeze,
        ActivityDetails::Mood {
            rating: payload.rating,
            note: payload.note,
        },
    )
    .await
}

/// Log a night of sleep; the response carries the computed score and grade.
#[utoipa::path(
    post,
    path = "/sleep",
    request_body = CreateSleepRequest,
    responses(
        (status = 201, description = "Sleep recorded and scored", body = ActivityOutcomeResponse),
        (status = 400, description = "Ratings outside 1-5, non-finite duration, missing header, or future date"),
        (status = 409, description = "Freeze requested but no token available"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_sleep_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateSleepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    submit(
        &app_state,
        &headers,
        payload.entry_date,
        payload.use_streak_freeze,
        ActivityDetails::Sleep {
            sample: dream_journal_core::SleepSample {
                duration_hours: payload.duration_hours,
                quality_rating: payload.quality_rating,
                restfulness_rating: payload.restfulness_rating,
            },
        },
    )
    .await
}

/// Log a free-form journal entry.
#[utoipa::path(
    post,
    path = "/journal",
    request_body = CreateJournalRequest,
    responses(
        (status = 201, description = "Journal entry recorded", body = ActivityOutcomeResponse),
        (status = 400, description = "Empty body, missing header, or future date"),
        (status = 409, description = "Freeze requested but no token available"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_journal_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateJournalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    submit(
        &app_state,
        &headers,
        payload.entry_date,
        payload.use_streak_freeze,
        ActivityDetails::Journal { body: payload.body },
    )
    .await
}
