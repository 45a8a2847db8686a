//! services/api/src/web/progress.rs
//!
//! Axum handlers for the progression surfaces: streak health, the
//! achievement catalog, and lifetime stats.

use crate::error::ApiError;
use crate::web::rest::{user_id_from_headers, LevelResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use dream_journal_core::achievements::{AchievementId, CATALOG};
use dream_journal_core::domain::StreakKind;
use dream_journal_core::engine::StreakOverview;
use dream_journal_core::error::CoreError;

//=========================================================================================
// Response Types
//=========================================================================================

/// One streak with its current health evaluation.
#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    pub kind: String,
    pub current_length: u32,
    pub longest_length: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub freezes_available: u32,
    /// empty, safe, at_risk, recoverable or broken.
    pub health: String,
    /// Hours until the UTC day boundary ends the streak, when it would.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_until_break: Option<i64>,
}

impl From<StreakOverview> for StreakResponse {
    fn from(overview: StreakOverview) -> Self {
        StreakResponse {
            kind: overview.streak.kind.as_str().to_string(),
            current_length: overview.streak.current_length,
            longest_length: overview.streak.longest_length,
            last_activity_date: overview.streak.last_activity_date,
            freezes_available: overview.streak.freezes_available,
            health: overview.status.health.as_str().to_string(),
            hours_until_break: overview.status.hours_until_break,
        }
    }
}

/// One catalog entry merged with the user's unlock state.
#[derive(Serialize, ToSchema)]
pub struct AchievementResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tier: String,
    pub xp_reward: u64,
    pub hidden: bool,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct TagCountResponse {
    pub tag: String,
    pub count: u64,
}

/// Lifetime aggregates, streak standing and level, recomputed from source
/// tables on every call.
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub dream_count: u64,
    pub mood_count: u64,
    pub sleep_count: u64,
    pub journal_count: u64,
    pub total_entries: u64,
    pub lucid_dream_count: u64,
    pub interpretation_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_sleep_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_sleep_score: Option<f64>,
    pub dream_streak: u32,
    pub mood_streak: u32,
    pub wellness_streak: u32,
    pub longest_dream_streak: u32,
    pub longest_mood_streak: u32,
    pub longest_wellness_streak: u32,
    pub level: LevelResponse,
    pub top_dream_tags: Vec<TagCountResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// All three streaks with at-risk evaluation.
#[utoipa::path(
    get,
    path = "/streaks",
    responses(
        (status = 200, description = "The user's streaks", body = [StreakResponse]),
        (status = 400, description = "Missing or malformed x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_streaks_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let overview = app_state.engine.streak_overview(user_id).await?;
    let listed: Vec<StreakResponse> = overview.into_iter().map(StreakResponse::from).collect();
    Ok(Json(listed))
}

/// Spend a freeze token to protect a streak.
#[utoipa::path(
    post,
    path = "/streaks/{kind}/freeze",
    responses(
        (status = 200, description = "Freeze applied", body = StreakResponse),
        (status = 400, description = "Unknown streak kind or missing header"),
        (status = 409, description = "No token available, or the streak cannot be frozen"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("kind" = String, Path, description = "dream, mood or wellness."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn freeze_streak_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let kind = StreakKind::parse(&kind).ok_or_else(|| {
        ApiError::Core(CoreError::Validation(format!(
            "unknown streak kind '{}'",
            kind
        )))
    })?;
    let overview = app_state.engine.use_streak_freeze(user_id, kind).await?;
    Ok(Json(StreakResponse::from(overview)))
}

/// The achievement catalog merged with the user's unlocks. Hidden entries
/// stay out of the list until earned.
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Catalog with unlock state", body = [AchievementResponse]),
        (status = 400, description = "Missing or malformed x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_achievements_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let unlocks: HashMap<AchievementId, DateTime<Utc>> = app_state
        .engine
        .unlocked_achievements(user_id)
        .await?
        .into_iter()
        .map(|u| (u.achievement_id, u.unlocked_at))
        .collect();

    let listed: Vec<AchievementResponse> = CATALOG
        .iter()
        .filter_map(|def| {
            let unlocked_at = unlocks.get(&def.id).copied();
            if def.hidden && unlocked_at.is_none() {
                return None;
            }
            Some(AchievementResponse {
                id: def.id.as_str().to_string(),
                name: def.name.to_string(),
                description: def.description.to_string(),
                tier: def.tier.as_str().to_string(),
                xp_reward: def.xp_reward,
                hidden: def.hidden,
                unlocked: unlocked_at.is_some(),
                unlocked_at,
            })
        })
        .collect();
    Ok(Json(listed))
}

/// Lifetime stats: counts, streaks, sleep scores, favorite tags and level.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "The user's lifetime stats", body = StatsResponse),
        (status = 400, description = "Missing or malformed x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let overview = app_state.engine.stats_overview(user_id).await?;
    let stats = overview.stats;
    Ok(Json(StatsResponse {
        dream_count: stats.dream_count,
        mood_count: stats.mood_count,
        sleep_count: stats.sleep_count,
        journal_count: stats.journal_count,
        total_entries: stats.total_entries(),
        lucid_dream_count: stats.lucid_dream_count,
        interpretation_count: stats.interpretation_count,
        best_sleep_score: stats.best_sleep_score,
        average_sleep_score: stats.average_sleep_score,
        dream_streak: stats.dream_streak,
        mood_streak: stats.mood_streak,
        wellness_streak: stats.wellness_streak,
        longest_dream_streak: stats.longest_dream_streak,
        longest_mood_streak: stats.longest_mood_streak,
        longest_wellness_streak: stats.longest_wellness_streak,
        level: LevelResponse::from(overview.level),
        top_dream_tags: overview
            .top_dream_tags
            .into_iter()
            .map(|t| TagCountResponse {
                tag: t.tag,
                count: t.count,
            })
            .collect(),
    }))
}
