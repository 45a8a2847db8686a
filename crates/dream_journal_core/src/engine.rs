//! crates/dream_journal_core/src/engine.rs
//!
//! The orchestration layer. One call into [`JournalEngine`] runs the whole
//! submission pipeline: validate, persist, award XP, advance streaks,
//! refresh goal progress, evaluate achievements, and hand back everything
//! the caller needs to render the result. The engine owns no state of its
//! own; everything it knows comes through the store ports.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::achievements::{self, AchievementDef, AchievementId, AchievementUnlock};
use crate::domain::{
    ActivityDetails, ActivityEntry, ActivityKind, DreamInterpretation, Goal, GoalPeriod,
    GoalStatus, Streak, StreakKind, TagCount, UserStats,
};
use crate::error::{CoreError, CoreResult};
use crate::goals::{self, GoalProgress};
use crate::levels::{self, LevelInfo, LevelUp};
use crate::ports::{ActivityStore, DreamInterpreter, ProgressStore};
use crate::scoring::{self, SleepScore};
use crate::streaks::{self, StreakChange, StreakStatus, StreakUpdate};

/// XP granted for recording a dream.
pub const XP_PER_DREAM: u64 = 10;
/// XP granted for logging a night of sleep.
pub const XP_PER_SLEEP: u64 = 10;
/// XP granted for a journal entry.
pub const XP_PER_JOURNAL: u64 = 10;
/// XP granted for a mood check-in.
pub const XP_PER_MOOD: u64 = 5;
/// XP granted when a user confirms a reached goal as completed.
pub const XP_GOAL_COMPLETED: u64 = 50;

/// How many favorite dream tags the stats overview reports.
const TOP_TAG_LIMIT: i64 = 5;

pub fn xp_for_activity(kind: ActivityKind) -> u64 {
    match kind {
        ActivityKind::Dream => XP_PER_DREAM,
        ActivityKind::Sleep => XP_PER_SLEEP,
        ActivityKind::Journal => XP_PER_JOURNAL,
        ActivityKind::Mood => XP_PER_MOOD,
    }
}

/// A new activity as submitted by the user.
#[derive(Debug, Clone)]
pub struct SubmitActivity {
    /// Calendar day the entry belongs to; today when omitted. Future dates
    /// are rejected.
    pub entry_date: Option<NaiveDate>,
    pub details: ActivityDetails,
    /// Spend a freeze token if this submission arrives one day late.
    pub use_streak_freeze: bool,
}

/// Everything that happened as a result of one submission.
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    pub entry: ActivityEntry,
    /// Present only for sleep entries.
    pub sleep_score: Option<SleepScore>,
    /// Base activity XP plus any achievement rewards from this submission.
    pub xp_awarded: u64,
    pub total_xp: u64,
    pub level: LevelInfo,
    pub level_up: Option<LevelUp>,
    pub streaks: Vec<StreakUpdate>,
    /// Progress of the user's active goals matching this activity kind.
    pub goals: Vec<GoalProgress>,
    pub unlocked: Vec<&'static AchievementDef>,
}

/// Result of confirming or abandoning a goal.
#[derive(Debug, Clone)]
pub struct GoalOutcome {
    pub goal: Goal,
    pub xp_awarded: u64,
    pub total_xp: u64,
    pub level: LevelInfo,
    pub level_up: Option<LevelUp>,
}

/// A goal paired with its freshly computed progress.
#[derive(Debug, Clone)]
pub struct GoalWithProgress {
    pub goal: Goal,
    pub progress: GoalProgress,
}

/// A streak paired with its current health.
#[derive(Debug, Clone)]
pub struct StreakOverview {
    pub streak: Streak,
    pub status: StreakStatus,
}

/// What a maintenance pass cleaned up.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub goals_failed: u64,
    pub streaks_expired: u64,
}

/// The lifetime-stats payload: aggregates, level standing, favorite tags.
#[derive(Debug, Clone)]
pub struct StatsOverview {
    pub stats: UserStats,
    pub level: LevelInfo,
    pub top_dream_tags: Vec<TagCount>,
}

/// New goal parameters as submitted by the user.
#[derive(Debug, Clone)]
pub struct SubmitGoal {
    pub goal_type: ActivityKind,
    pub target_value: u32,
    pub period: GoalPeriod,
    /// Defaults to today when omitted.
    pub start_date: Option<NaiveDate>,
    /// Required for custom periods, ignored otherwise.
    pub end_date: Option<NaiveDate>,
}

pub struct JournalEngine {
    activities: Arc<dyn ActivityStore>,
    progress: Arc<dyn ProgressStore>,
    interpreter: Arc<dyn DreamInterpreter>,
}

impl JournalEngine {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        progress: Arc<dyn ProgressStore>,
        interpreter: Arc<dyn DreamInterpreter>,
    ) -> Self {
        Self {
            activities,
            progress,
            interpreter,
        }
    }

    //=====================================================================================
    // Activity submission
    //=====================================================================================

    /// Record an activity and run the full progression pipeline.
    ///
    /// Streak transitions are computed before anything is written so that a
    /// freeze request the bank cannot honor rejects the submission whole,
    /// rather than leaving a persisted entry with half-applied progression.
    pub async fn submit_activity(
        &self,
        user_id: Uuid,
        submission: SubmitActivity,
    ) -> CoreResult<ActivityOutcome> {
        let now = Utc::now();
        let today = now.date_naive();
        let entry_date = submission.entry_date.unwrap_or(today);
        if entry_date > today {
            return Err(CoreError::Validation(
                "entries cannot be dated in the future".to_string(),
            ));
        }

        submission.details.validate()?;
        let sleep_score = match &submission.details {
            ActivityDetails::Sleep { sample } => Some(scoring::score_sleep(sample)?),
            _ => None,
        };
        let kind = submission.details.kind();

        let existing = self.progress.fetch_streaks(user_id).await?;
        let updates = plan_streak_updates(
            &existing,
            user_id,
            kind,
            entry_date,
            submission.use_streak_freeze,
        )?;

        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            user_id,
            entry_date,
            created_at: now,
            details: submission.details,
        };
        self.activities.insert_entry(&entry).await?;

        let base_xp = xp_for_activity(kind);
        let total_after_base = self.progress.add_xp(user_id, base_xp).await?;
        let xp_before = total_after_base.saturating_sub(base_xp);

        for update in &updates {
            if update.change != StreakChange::Unchanged {
                self.progress.upsert_streak(&update.streak).await?;
            }
        }

        let goals = self.matching_goal_progress(user_id, kind, today).await?;

        let streak_state = merge_streak_state(existing, &updates);
        let (unlocked, total_after_awards) =
            self.award_achievements(user_id, &streak_state).await?;
        let achievement_xp: u64 = unlocked.iter().map(|def| def.xp_reward).sum();
        let total_xp = total_after_awards.unwrap_or(total_after_base);

        Ok(ActivityOutcome {
            entry,
            sleep_score,
            xp_awarded: base_xp + achievement_xp,
            total_xp,
            level: levels::level_info(total_xp),
            level_up: levels::detect_level_up(xp_before, total_xp),
            streaks: updates,
            goals,
            unlocked,
        })
    }

    pub async fn fetch_entry(&self, user_id: Uuid, entry_id: Uuid) -> CoreResult<ActivityEntry> {
        self.activities.fetch_entry(user_id, entry_id).await
    }

    pub async fn interpretation_for_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> CoreResult<Option<DreamInterpretation>> {
        self.activities.interpretation_for_entry(user_id, entry_id).await
    }

    pub async fn list_entries(
        &self,
        user_id: Uuid,
        kind: Option<ActivityKind>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> CoreResult<Vec<ActivityEntry>> {
        self.activities
            .list_entries(user_id, kind, from, to, limit, offset)
            .await
    }

    //=====================================================================================
    // Dream interpretation
    //=====================================================================================

    /// Produce (or return the already-stored) interpretation for a dream.
    /// Repeat requests for the same entry are answered from storage without
    /// another model call.
    pub async fn interpret_dream(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> CoreResult<DreamInterpretation> {
        let entry = self.activities.fetch_entry(user_id, entry_id).await?;
        let ActivityDetails::Dream {
            title,
            description,
            tags,
            lucid,
        } = &entry.details
        else {
            return Err(CoreError::Validation(
                "only dream entries can be interpreted".to_string(),
            ));
        };

        if let Some(existing) = self
            .activities
            .interpretation_for_entry(user_id, entry_id)
            .await?
        {
            return Ok(existing);
        }

        let outcome = self
            .interpreter
            .interpret(title, description, tags, *lucid)
            .await?;
        let interpretation = DreamInterpretation {
            id: Uuid::new_v4(),
            entry_id,
            summary: outcome.summary,
            symbols: outcome.symbols,
            reflection: outcome.reflection,
            model: outcome.model,
            created_at: Utc::now(),
        };
        self.activities.insert_interpretation(&interpretation).await?;

        // The first interpretation is itself achievement-worthy.
        let streaks = self.progress.fetch_streaks(user_id).await?;
        self.award_achievements(user_id, &streaks).await?;

        Ok(interpretation)
    }

    //=====================================================================================
    // Goals
    //=====================================================================================

    pub async fn create_goal(&self, user_id: Uuid, submission: SubmitGoal) -> CoreResult<Goal> {
        let now = Utc::now();
        let start = submission.start_date.unwrap_or_else(|| now.date_naive());
        let goal = goals::create(
            user_id,
            submission.goal_type,
            submission.target_value,
            submission.period,
            start,
            submission.end_date,
            now,
        )?;
        self.progress.insert_goal(&goal).await?;
        Ok(goal)
    }

    pub async fn list_goals(
        &self,
        user_id: Uuid,
        status: Option<GoalStatus>,
    ) -> CoreResult<Vec<GoalWithProgress>> {
        let today = Utc::now().date_naive();
        let mut listed = Vec::new();
        for goal in self.progress.list_goals(user_id, status).await? {
            let progress = self.progress_for(&goal, today).await?;
            listed.push(GoalWithProgress { goal, progress });
        }
        Ok(listed)
    }

    pub async fn get_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<GoalWithProgress> {
        let today = Utc::now().date_naive();
        let goal = self.progress.fetch_goal(user_id, goal_id).await?;
        let progress = self.progress_for(&goal, today).await?;
        Ok(GoalWithProgress { goal, progress })
    }

    /// Confirm a reached goal as completed. Completion is always an explicit
    /// user action; hitting the target alone never flips the status.
    pub async fn complete_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<GoalOutcome> {
        let today = Utc::now().date_naive();
        let mut goal = self.progress.fetch_goal(user_id, goal_id).await?;
        if goal.status != GoalStatus::Active {
            return Err(CoreError::Conflict(format!(
                "goal is already {}",
                goal.status.as_str()
            )));
        }
        let progress = self.progress_for(&goal, today).await?;
        if !progress.target_reached {
            return Err(CoreError::Conflict(format!(
                "goal target not reached: {} of {}",
                progress.current_value, goal.target_value
            )));
        }

        self.progress
            .set_goal_status(user_id, goal_id, GoalStatus::Completed)
            .await?;
        goal.status = GoalStatus::Completed;

        let total_xp = self.progress.add_xp(user_id, XP_GOAL_COMPLETED).await?;
        let xp_before = total_xp.saturating_sub(XP_GOAL_COMPLETED);
        Ok(GoalOutcome {
            goal,
            xp_awarded: XP_GOAL_COMPLETED,
            total_xp,
            level: levels::level_info(total_xp),
            level_up: levels::detect_level_up(xp_before, total_xp),
        })
    }

    /// Give up on an active goal. No XP either way.
    pub async fn abandon_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Goal> {
        let mut goal = self.progress.fetch_goal(user_id, goal_id).await?;
        if goal.status != GoalStatus::Active {
            return Err(CoreError::Conflict(format!(
                "goal is already {}",
                goal.status.as_str()
            )));
        }
        self.progress
            .set_goal_status(user_id, goal_id, GoalStatus::Abandoned)
            .await?;
        goal.status = GoalStatus::Abandoned;
        Ok(goal)
    }

    //=====================================================================================
    // Streaks
    //=====================================================================================

    /// All three streaks with their health, materializing empty records for
    /// kinds the user has never touched.
    pub async fn streak_overview(&self, user_id: Uuid) -> CoreResult<Vec<StreakOverview>> {
        let now = Utc::now();
        let stored = self.progress.fetch_streaks(user_id).await?;
        let overview = StreakKind::all()
            .iter()
            .map(|&kind| {
                let streak = stored
                    .iter()
                    .find(|s| s.kind == kind)
                    .cloned()
                    .unwrap_or_else(|| Streak::new(user_id, kind));
                let status = streaks::status(&streak, now);
                StreakOverview { streak, status }
            })
            .collect();
        Ok(overview)
    }

    /// Spend a freeze token to protect a streak that is about to break.
    pub async fn use_streak_freeze(
        &self,
        user_id: Uuid,
        kind: StreakKind,
    ) -> CoreResult<StreakOverview> {
        let now = Utc::now();
        let streak = self
            .progress
            .fetch_streak(user_id, kind)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!("no {} streak to protect", kind.as_str()))
            })?;
        let frozen = streaks::apply_freeze(&streak, now.date_naive())?;
        self.progress.upsert_streak(&frozen).await?;
        let status = streaks::status(&frozen, now);
        Ok(StreakOverview {
            streak: frozen,
            status,
        })
    }

    //=====================================================================================
    // Achievements, stats, levels
    //=====================================================================================

    pub async fn unlocked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<AchievementUnlock>> {
        self.progress.unlocked_achievements(user_id).await
    }

    /// Lifetime aggregates, the level the XP total lands on, and the user's
    /// most used dream tags.
    pub async fn stats_overview(&self, user_id: Uuid) -> CoreResult<StatsOverview> {
        let totals = self.activities.activity_totals(user_id).await?;
        let streaks = self.progress.fetch_streaks(user_id).await?;
        let stats = UserStats::assemble(totals, &streaks);
        let total_xp = self.progress.total_xp(user_id).await?;
        let top_dream_tags = self.activities.top_dream_tags(user_id, TOP_TAG_LIMIT).await?;
        Ok(StatsOverview {
            stats,
            level: levels::level_info(total_xp),
            top_dream_tags,
        })
    }

    //=====================================================================================
    // Maintenance sweep
    //=====================================================================================

    /// Close out expired state: active goals whose window has passed become
    /// failed, and streaks whose last activity is older than yesterday drop
    /// to zero. Run daily; running twice is harmless.
    pub async fn sweep_expired(&self) -> CoreResult<SweepReport> {
        let today = Utc::now().date_naive();
        let mut report = SweepReport::default();

        for goal in self.progress.overdue_goals(today).await? {
            self.progress
                .set_goal_status(goal.user_id, goal.id, GoalStatus::Failed)
                .await?;
            report.goals_failed += 1;
        }

        // A streak last fed the day before yesterday or earlier can no
        // longer be extended, only restarted.
        let cutoff = today - Duration::days(1);
        for streak in self.progress.stale_streaks(cutoff).await? {
            let expired = streaks::expire(&streak);
            self.progress.upsert_streak(&expired).await?;
            report.streaks_expired += 1;
        }

        Ok(report)
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    async fn progress_for(&self, goal: &Goal, today: NaiveDate) -> CoreResult<GoalProgress> {
        let count = self
            .activities
            .count_entries_between(goal.user_id, goal.goal_type, goal.start_date, goal.end_date)
            .await?;
        let current = u32::try_from(count).unwrap_or(u32::MAX);
        Ok(goals::progress(goal, current, today))
    }

    async fn matching_goal_progress(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        today: NaiveDate,
    ) -> CoreResult<Vec<GoalProgress>> {
        let active = self
            .progress
            .list_goals(user_id, Some(GoalStatus::Active))
            .await?;
        let mut out = Vec::new();
        for goal in active.into_iter().filter(|g| g.goal_type == kind) {
            out.push(self.progress_for(&goal, today).await?);
        }
        Ok(out)
    }

    /// Evaluate the catalog against fresh stats and persist any new unlocks,
    /// crediting their XP through the ledger exactly once. Returns what was
    /// newly unlocked and the ledger total after the credit (`None` when
    /// nothing new unlocked); losing an unlock race to a concurrent request
    /// simply skips the award.
    async fn award_achievements(
        &self,
        user_id: Uuid,
        streaks: &[Streak],
    ) -> CoreResult<(Vec<&'static AchievementDef>, Option<u64>)> {
        let totals = self.activities.activity_totals(user_id).await?;
        let stats = UserStats::assemble(totals, streaks);
        let held: HashSet<AchievementId> = self
            .progress
            .unlocked_achievements(user_id)
            .await?
            .into_iter()
            .map(|u| u.achievement_id)
            .collect();

        let mut unlocked = Vec::new();
        let mut xp = 0;
        let now = Utc::now();
        for def in achievements::evaluate(&stats, &held) {
            if self.progress.record_unlock(user_id, def.id, now).await? {
                unlocked.push(def);
                xp += def.xp_reward;
            }
        }
        let total_after = if xp > 0 {
            Some(self.progress.add_xp(user_id, xp).await?)
        } else {
            None
        };
        Ok((unlocked, total_after))
    }
}

/// Compute the transitions for every streak this activity feeds. The freeze
/// flag is honored on the activity's own streak unconditionally, so an
/// unfulfillable request surfaces as a conflict; secondary streaks only
/// spend tokens they actually have.
fn plan_streak_updates(
    existing: &[Streak],
    user_id: Uuid,
    kind: ActivityKind,
    entry_date: NaiveDate,
    use_freeze: bool,
) -> CoreResult<Vec<StreakUpdate>> {
    let affected = StreakKind::affected_by(kind);
    let primary = affected[0];
    let mut updates = Vec::with_capacity(affected.len());
    for &streak_kind in affected {
        let current = existing
            .iter()
            .find(|s| s.kind == streak_kind)
            .cloned()
            .unwrap_or_else(|| Streak::new(user_id, streak_kind));
        let wants_freeze =
            use_freeze && (streak_kind == primary || current.freezes_available > 0);
        updates.push(streaks::advance(&current, entry_date, wants_freeze)?);
    }
    Ok(updates)
}

/// Post-update view of all streaks: planned updates replace their stored
/// rows, untouched kinds keep theirs.
fn merge_streak_state(existing: Vec<Streak>, updates: &[StreakUpdate]) -> Vec<Streak> {
    let mut merged: Vec<Streak> = updates.iter().map(|u| u.streak.clone()).collect();
    for streak in existing {
        if !merged.iter().any(|s| s.kind == streak.kind) {
            merged.push(streak);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_xp_table() {
        assert_eq!(xp_for_activity(ActivityKind::Dream), 10);
        assert_eq!(xp_for_activity(ActivityKind::Sleep), 10);
        assert_eq!(xp_for_activity(ActivityKind::Journal), 10);
        assert_eq!(xp_for_activity(ActivityKind::Mood), 5);
    }

    #[test]
    fn planning_covers_every_affected_streak() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let updates = plan_streak_updates(&[], user, ActivityKind::Dream, date, false).unwrap();
        let kinds: Vec<_> = updates.iter().map(|u| u.streak.kind).collect();
        assert_eq!(kinds, vec![StreakKind::Dream, StreakKind::Wellness]);

        let updates = plan_streak_updates(&[], user, ActivityKind::Journal, date, false).unwrap();
        let kinds: Vec<_> = updates.iter().map(|u| u.streak.kind).collect();
        assert_eq!(kinds, vec![StreakKind::Wellness]);
    }

    #[test]
    fn freeze_conflict_on_primary_blocks_the_plan() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut dream = Streak::new(user, StreakKind::Dream);
        dream.current_length = 4;
        dream.longest_length = 4;
        dream.last_activity_date = Some(date - Duration::days(2));
        dream.freezes_available = 0;

        let err =
            plan_streak_updates(&[dream], user, ActivityKind::Dream, date, true).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn secondary_streak_without_tokens_resets_instead_of_failing() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut dream = Streak::new(user, StreakKind::Dream);
        dream.current_length = 4;
        dream.longest_length = 4;
        dream.last_activity_date = Some(date - Duration::days(2));
        dream.freezes_available = 1;
        let mut wellness = Streak::new(user, StreakKind::Wellness);
        wellness.current_length = 4;
        wellness.longest_length = 4;
        wellness.last_activity_date = Some(date - Duration::days(2));
        wellness.freezes_available = 0;

        let updates =
            plan_streak_updates(&[dream, wellness], user, ActivityKind::Dream, date, true)
                .unwrap();
        assert_eq!(updates[0].change, StreakChange::Bridged);
        assert_eq!(updates[1].change, StreakChange::Reset);
    }

    #[test]
    fn merged_state_prefers_updates() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut mood = Streak::new(user, StreakKind::Mood);
        mood.current_length = 9;
        let stored = vec![Streak::new(user, StreakKind::Dream), mood.clone()];

        let updates = plan_streak_updates(&stored, user, ActivityKind::Dream, date, false).unwrap();
        let merged = merge_streak_state(stored, &updates);

        assert_eq!(merged.len(), 3);
        let dream = merged.iter().find(|s| s.kind == StreakKind::Dream).unwrap();
        assert_eq!(dream.current_length, 1);
        let mood = merged.iter().find(|s| s.kind == StreakKind::Mood).unwrap();
        assert_eq!(mood.current_length, 9);
    }
}
