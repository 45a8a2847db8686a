//! crates/dream_journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or LLM providers.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::achievements::{AchievementId, AchievementUnlock};
use crate::domain::{
    ActivityEntry, ActivityKind, ActivityTotals, DreamInterpretation, Goal, GoalStatus, Streak,
    StreakKind, TagCount,
};
use crate::error::CoreResult;

//=========================================================================================
// Activity Store
//=========================================================================================

/// Persistence for journal entries and their interpretations.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    // --- Entries ---
    /// Persist a new entry. The caller supplies the id; storing it twice is
    /// a conflict.
    async fn insert_entry(&self, entry: &ActivityEntry) -> CoreResult<()>;

    async fn fetch_entry(&self, user_id: Uuid, entry_id: Uuid) -> CoreResult<ActivityEntry>;

    /// List entries newest-first, optionally restricted to one kind and to a
    /// date window. `from`/`to` bound `entry_date` inclusively when present.
    async fn list_entries(
        &self,
        user_id: Uuid,
        kind: Option<ActivityKind>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> CoreResult<Vec<ActivityEntry>>;

    /// Number of entries of one kind dated inside `[start, end]`, inclusive.
    /// Goal progress is recomputed from this rather than a stored counter.
    async fn count_entries_between(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<u64>;

    /// Lifetime aggregates derived from the entry tables in one pass.
    async fn activity_totals(&self, user_id: Uuid) -> CoreResult<ActivityTotals>;

    /// The user's most used dream tags, most frequent first. Ties break by
    /// tag name so the ordering is stable.
    async fn top_dream_tags(&self, user_id: Uuid, limit: i64) -> CoreResult<Vec<TagCount>>;

    // --- Interpretations ---
    async fn insert_interpretation(&self, interpretation: &DreamInterpretation) -> CoreResult<()>;

    async fn interpretation_for_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> CoreResult<Option<DreamInterpretation>>;
}

//=========================================================================================
// Progress Store
//=========================================================================================

/// Persistence for the progression state: streaks, goals, achievement
/// unlocks and the XP ledger.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    // --- Streaks ---
    async fn fetch_streaks(&self, user_id: Uuid) -> CoreResult<Vec<Streak>>;

    async fn fetch_streak(&self, user_id: Uuid, kind: StreakKind) -> CoreResult<Option<Streak>>;

    async fn upsert_streak(&self, streak: &Streak) -> CoreResult<()>;

    /// Streaks still counted as alive whose last activity is strictly older
    /// than `cutoff`. Scanned across all users by the maintenance sweep.
    async fn stale_streaks(&self, cutoff: NaiveDate) -> CoreResult<Vec<Streak>>;

    // --- Goals ---
    async fn insert_goal(&self, goal: &Goal) -> CoreResult<()>;

    async fn fetch_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Goal>;

    async fn list_goals(&self, user_id: Uuid, status: Option<GoalStatus>) -> CoreResult<Vec<Goal>>;

    async fn set_goal_status(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        status: GoalStatus,
    ) -> CoreResult<()>;

    /// Active goals across all users whose window ended before `today`.
    async fn overdue_goals(&self, today: NaiveDate) -> CoreResult<Vec<Goal>>;

    // --- Achievements ---
    async fn unlocked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<AchievementUnlock>>;

    /// Record an unlock. Returns `false` when the unlock already existed, in
    /// which case nothing was written and no reward should be granted again.
    async fn record_unlock(
        &self,
        user_id: Uuid,
        achievement_id: AchievementId,
        unlocked_at: DateTime<Utc>,
    ) -> CoreResult<bool>;

    // --- XP Ledger ---
    /// Atomically add `amount` to the user's lifetime XP and return the new
    /// total. Concurrent awards must both land.
    async fn add_xp(&self, user_id: Uuid, amount: u64) -> CoreResult<u64>;

    async fn total_xp(&self, user_id: Uuid) -> CoreResult<u64>;
}

//=========================================================================================
// Dream Interpreter
//=========================================================================================

/// What the language model produced for one dream.
#[derive(Debug, Clone)]
pub struct InterpretationOutcome {
    pub summary: String,
    pub symbols: Vec<String>,
    pub reflection: String,
    /// Which model produced the text.
    pub model: String,
}

/// An opaque collaborator that turns a recorded dream into an
/// interpretation. Implementations talk to an external model; the core only
/// sees this contract.
#[async_trait]
pub trait DreamInterpreter: Send + Sync {
    async fn interpret(
        &self,
        title: &str,
        description: &str,
        tags: &[String],
        lucid: bool,
    ) -> CoreResult<InterpretationOutcome>;
}
