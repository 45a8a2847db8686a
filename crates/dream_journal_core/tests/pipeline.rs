//! End-to-end pipeline tests against in-memory stores. Everything the
//! engine touches goes through the port traits, so the whole submission
//! flow can run without a database or a model behind it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use dream_journal_core::achievements::{AchievementId, AchievementUnlock};
use dream_journal_core::domain::{
    ActivityDetails, ActivityEntry, ActivityKind, ActivityTotals, DreamInterpretation, Goal,
    GoalPeriod, GoalStatus, SleepSample, Streak, StreakKind, TagCount,
};
use dream_journal_core::engine::{JournalEngine, SubmitActivity, SubmitGoal};
use dream_journal_core::error::{CoreError, CoreResult};
use dream_journal_core::ports::{
    ActivityStore, DreamInterpreter, InterpretationOutcome, ProgressStore,
};
use dream_journal_core::scoring;
use dream_journal_core::streaks::StreakChange;

//=========================================================================================
// In-memory fakes
//=========================================================================================

#[derive(Default)]
struct MemStore {
    entries: Mutex<Vec<ActivityEntry>>,
    interpretations: Mutex<Vec<(Uuid, DreamInterpretation)>>,
    streaks: Mutex<Vec<Streak>>,
    goals: Mutex<Vec<Goal>>,
    unlocks: Mutex<Vec<(Uuid, AchievementId, DateTime<Utc>)>>,
    xp: Mutex<HashMap<Uuid, u64>>,
}

#[async_trait]
impl ActivityStore for MemStore {
    async fn insert_entry(&self, entry: &ActivityEntry) -> CoreResult<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(CoreError::Conflict("duplicate entry id".into()));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn fetch_entry(&self, user_id: Uuid, entry_id: Uuid) -> CoreResult<ActivityEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == user_id && e.id == entry_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("entry {entry_id}")))
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        kind: Option<ActivityKind>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> CoreResult<Vec<ActivityEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && kind.is_none_or(|k| e.kind() == k)
                    && from.is_none_or(|f| e.entry_date >= f)
                    && to.is_none_or(|t| e.entry_date <= t)
            })
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_entries_between(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<u64> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.kind() == kind
                    && e.entry_date >= start
                    && e.entry_date <= end
            })
            .count() as u64)
    }

    async fn activity_totals(&self, user_id: Uuid) -> CoreResult<ActivityTotals> {
        let entries = self.entries.lock().unwrap();
        let mut totals = ActivityTotals::default();
        let mut score_sum = 0u64;
        let mut score_n = 0u64;
        for entry in entries.iter().filter(|e| e.user_id == user_id) {
            match &entry.details {
                ActivityDetails::Dream { lucid, .. } => {
                    totals.dream_count += 1;
                    if *lucid {
                        totals.lucid_dream_count += 1;
                    }
                }
                ActivityDetails::Mood { .. } => totals.mood_count += 1,
                ActivityDetails::Sleep { sample } => {
                    totals.sleep_count += 1;
                    if let Ok(scored) = scoring::score_sleep(sample) {
                        totals.best_sleep_score = Some(
                            totals.best_sleep_score.map_or(scored.score, |b| b.max(scored.score)),
                        );
                        score_sum += u64::from(scored.score);
                        score_n += 1;
                    }
                }
                ActivityDetails::Journal { .. } => totals.journal_count += 1,
            }
        }
        if score_n > 0 {
            totals.average_sleep_score = Some(score_sum as f64 / score_n as f64);
        }
        totals.interpretation_count = self
            .interpretations
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .count() as u64;
        Ok(totals)
    }

    async fn top_dream_tags(&self, user_id: Uuid, limit: i64) -> CoreResult<Vec<TagCount>> {
        let entries = self.entries.lock().unwrap();
        let mut counts: HashMap<String, u64> = HashMap::new();
        for entry in entries.iter().filter(|e| e.user_id == user_id) {
            if let ActivityDetails::Dream { tags, .. } = &entry.details {
                for tag in tags {
                    *counts.entry(tag.clone()).or_default() += 1;
                }
            }
        }
        let mut out: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn insert_interpretation(
        &self,
        interpretation: &DreamInterpretation,
    ) -> CoreResult<()> {
        let owner = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == interpretation.entry_id)
            .map(|e| e.user_id)
            .ok_or_else(|| CoreError::NotFound("entry for interpretation".into()))?;
        self.interpretations
            .lock()
            .unwrap()
            .push((owner, interpretation.clone()));
        Ok(())
    }

    async fn interpretation_for_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> CoreResult<Option<DreamInterpretation>> {
        Ok(self
            .interpretations
            .lock()
            .unwrap()
            .iter()
            .find(|(owner, i)| *owner == user_id && i.entry_id == entry_id)
            .map(|(_, i)| i.clone()))
    }
}

#[async_trait]
impl ProgressStore for MemStore {
    async fn fetch_streaks(&self, user_id: Uuid) -> CoreResult<Vec<Streak>> {
        Ok(self
            .streaks
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn fetch_streak(&self, user_id: Uuid, kind: StreakKind) -> CoreResult<Option<Streak>> {
        Ok(self
            .streaks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id && s.kind == kind)
            .cloned())
    }

    async fn upsert_streak(&self, streak: &Streak) -> CoreResult<()> {
        let mut streaks = self.streaks.lock().unwrap();
        match streaks
            .iter_mut()
            .find(|s| s.user_id == streak.user_id && s.kind == streak.kind)
        {
            Some(existing) => *existing = streak.clone(),
            None => streaks.push(streak.clone()),
        }
        Ok(())
    }

    async fn stale_streaks(&self, cutoff: NaiveDate) -> CoreResult<Vec<Streak>> {
        Ok(self
            .streaks
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                s.current_length > 0
                    && s.last_activity_date.is_some_and(|last| last < cutoff)
            })
            .cloned()
            .collect())
    }

    async fn insert_goal(&self, goal: &Goal) -> CoreResult<()> {
        self.goals.lock().unwrap().push(goal.clone());
        Ok(())
    }

    async fn fetch_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Goal> {
        self.goals
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.user_id == user_id && g.id == goal_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("goal {goal_id}")))
    }

    async fn list_goals(
        &self,
        user_id: Uuid,
        status: Option<GoalStatus>,
    ) -> CoreResult<Vec<Goal>> {
        Ok(self
            .goals
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id && status.is_none_or(|s| g.status == s))
            .cloned()
            .collect())
    }

    async fn set_goal_status(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        status: GoalStatus,
    ) -> CoreResult<()> {
        let mut goals = self.goals.lock().unwrap();
        let goal = goals
            .iter_mut()
            .find(|g| g.user_id == user_id && g.id == goal_id)
            .ok_or_else(|| CoreError::NotFound(format!("goal {goal_id}")))?;
        goal.status = status;
        Ok(())
    }

    async fn overdue_goals(&self, today: NaiveDate) -> CoreResult<Vec<Goal>> {
        Ok(self
            .goals
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.status == GoalStatus::Active && g.end_date < today)
            .cloned()
            .collect())
    }

    async fn unlocked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<AchievementUnlock>> {
        Ok(self
            .unlocks
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _, _)| *owner == user_id)
            .map(|(_, id, at)| AchievementUnlock {
                achievement_id: *id,
                unlocked_at: *at,
            })
            .collect())
    }

    async fn record_unlock(
        &self,
        user_id: Uuid,
        achievement_id: AchievementId,
        unlocked_at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut unlocks = self.unlocks.lock().unwrap();
        if unlocks
            .iter()
            .any(|(owner, id, _)| *owner == user_id && *id == achievement_id)
        {
            return Ok(false);
        }
        unlocks.push((user_id, achievement_id, unlocked_at));
        Ok(true)
    }

    async fn add_xp(&self, user_id: Uuid, amount: u64) -> CoreResult<u64> {
        let mut xp = self.xp.lock().unwrap();
        let total = xp.entry(user_id).or_insert(0);
        *total += amount;
        Ok(*total)
    }

    async fn total_xp(&self, user_id: Uuid) -> CoreResult<u64> {
        Ok(*self.xp.lock().unwrap().get(&user_id).unwrap_or(&0))
    }
}

#[derive(Default)]
struct CannedInterpreter {
    calls: AtomicUsize,
}

#[async_trait]
impl DreamInterpreter for CannedInterpreter {
    async fn interpret(
        &self,
        title: &str,
        _description: &str,
        _tags: &[String],
        _lucid: bool,
    ) -> CoreResult<InterpretationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(InterpretationOutcome {
            summary: format!("A dream about {title}"),
            symbols: vec!["water".to_string(), "doors".to_string()],
            reflection: "Consider what felt unresolved.".to_string(),
            model: "canned-interpreter-1".to_string(),
        })
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

struct Harness {
    engine: JournalEngine,
    store: Arc<MemStore>,
    interpreter: Arc<CannedInterpreter>,
    user: Uuid,
}

fn harness() -> Harness {
    let store = Arc::new(MemStore::default());
    let interpreter = Arc::new(CannedInterpreter::default());
    let engine = JournalEngine::new(store.clone(), store.clone(), interpreter.clone());
    Harness {
        engine,
        store,
        interpreter,
        user: Uuid::new_v4(),
    }
}

fn dream(title: &str) -> ActivityDetails {
    ActivityDetails::Dream {
        title: title.to_string(),
        description: "It was vivid.".to_string(),
        tags: vec!["recurring".to_string()],
        lucid: false,
    }
}

fn submission(date: NaiveDate, details: ActivityDetails) -> SubmitActivity {
    SubmitActivity {
        entry_date: Some(date),
        details,
        use_streak_freeze: false,
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn first_dream_awards_xp_streaks_and_a_badge() {
    let h = harness();
    let outcome = h
        .engine
        .submit_activity(h.user, submission(today(), dream("Falling")))
        .await
        .unwrap();

    // 10 base + 25 for the first-dream badge.
    assert_eq!(outcome.xp_awarded, 35);
    assert_eq!(outcome.total_xp, 35);
    assert_eq!(outcome.level.level, 1);
    assert!(outcome.level_up.is_none());

    let unlocked: Vec<_> = outcome.unlocked.iter().map(|d| d.id).collect();
    assert_eq!(unlocked, vec![AchievementId::FirstDream]);

    assert_eq!(outcome.streaks.len(), 2);
    for update in &outcome.streaks {
        assert_eq!(update.change, StreakChange::Started);
        assert_eq!(update.streak.current_length, 1);
    }
}

#[tokio::test]
async fn badge_xp_lands_in_the_ledger_exactly_once() {
    let h = harness();
    let first = h
        .engine
        .submit_activity(h.user, submission(today(), dream("Falling")))
        .await
        .unwrap();

    // 10 base + 25 for the first-dream badge; the persisted ledger agrees
    // with the reported total.
    assert_eq!(first.total_xp, 35);
    assert_eq!(h.store.total_xp(h.user).await.unwrap(), 35);

    // No new badge on the second dream; only the base lands.
    let second = h
        .engine
        .submit_activity(h.user, submission(today(), dream("Again")))
        .await
        .unwrap();
    assert_eq!(second.xp_awarded, 10);
    assert_eq!(second.total_xp, 45);
    assert_eq!(h.store.total_xp(h.user).await.unwrap(), 45);
}

#[tokio::test]
async fn same_day_submissions_do_not_inflate_streaks() {
    let h = harness();
    h.engine
        .submit_activity(h.user, submission(today(), dream("One")))
        .await
        .unwrap();
    let second = h
        .engine
        .submit_activity(h.user, submission(today(), dream("Two")))
        .await
        .unwrap();

    for update in &second.streaks {
        assert_eq!(update.change, StreakChange::Unchanged);
        assert_eq!(update.streak.current_length, 1);
    }

    let overview = h.engine.stats_overview(h.user).await.unwrap();
    assert_eq!(overview.stats.dream_count, 2);
    assert_eq!(overview.stats.dream_streak, 1);
}

#[tokio::test]
async fn three_consecutive_days_unlock_the_streak_badge() {
    let h = harness();
    let start = today() - Duration::days(2);
    for offset in 0..2 {
        h.engine
            .submit_activity(h.user, submission(start + Duration::days(offset), dream("D")))
            .await
            .unwrap();
    }
    let third = h
        .engine
        .submit_activity(h.user, submission(today(), dream("D")))
        .await
        .unwrap();

    let dream_update = third
        .streaks
        .iter()
        .find(|u| u.streak.kind == StreakKind::Dream)
        .unwrap();
    assert_eq!(dream_update.streak.current_length, 3);

    let unlocked: Vec<_> = third.unlocked.iter().map(|d| d.id).collect();
    assert!(unlocked.contains(&AchievementId::ThreeNightsRunning));
}

#[tokio::test]
async fn achievements_unlock_exactly_once() {
    let h = harness();
    for i in 0..3 {
        h.engine
            .submit_activity(h.user, submission(today(), dream(&format!("n{i}"))))
            .await
            .unwrap();
    }

    let unlocks = h.engine.unlocked_achievements(h.user).await.unwrap();
    let first_dream_rows = unlocks
        .iter()
        .filter(|u| u.achievement_id == AchievementId::FirstDream)
        .count();
    assert_eq!(first_dream_rows, 1);
}

#[tokio::test]
async fn perfect_sleep_cascades_into_score_badges_and_levels() {
    let h = harness();
    let outcome = h
        .engine
        .submit_activity(
            h.user,
            submission(
                today(),
                ActivityDetails::Sleep {
                    sample: SleepSample {
                        duration_hours: 8.0,
                        quality_rating: 5,
                        restfulness_rating: 5,
                    },
                },
            ),
        )
        .await
        .unwrap();

    assert_eq!(outcome.sleep_score.unwrap().score, 100);

    let unlocked: Vec<_> = outcome.unlocked.iter().map(|d| d.id).collect();
    assert!(unlocked.contains(&AchievementId::CountingSheep));
    assert!(unlocked.contains(&AchievementId::WellRested));
    assert!(unlocked.contains(&AchievementId::FlawlessSlumber));

    // 10 base + 25 + 75 + 500 in badge rewards crosses several levels.
    assert_eq!(outcome.total_xp, 610);
    assert_eq!(outcome.level.level, 4);
    let level_up = outcome.level_up.unwrap();
    assert_eq!(level_up.from_level, 1);
    assert_eq!(level_up.to_level, 4);
}

#[tokio::test]
async fn invalid_mood_is_rejected_before_any_write() {
    let h = harness();
    let err = h
        .engine
        .submit_activity(
            h.user,
            submission(today(), ActivityDetails::Mood { rating: 0, note: None }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(h.store.entries.lock().unwrap().is_empty());
    assert_eq!(h.engine.stats_overview(h.user).await.unwrap().level.total_xp, 0);
}

#[tokio::test]
async fn future_dated_entries_are_rejected() {
    let h = harness();
    let err = h
        .engine
        .submit_activity(h.user, submission(today() + Duration::days(1), dream("X")))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn goal_progress_rides_along_and_completion_is_confirmed() {
    let h = harness();
    let goal = h
        .engine
        .create_goal(
            h.user,
            SubmitGoal {
                goal_type: ActivityKind::Dream,
                target_value: 3,
                period: GoalPeriod::Weekly,
                start_date: Some(today()),
                end_date: None,
            },
        )
        .await
        .unwrap();

    let first = h
        .engine
        .submit_activity(h.user, submission(today(), dream("a")))
        .await
        .unwrap();
    assert_eq!(first.goals.len(), 1);
    assert_eq!(first.goals[0].current_value, 1);
    assert_eq!(first.goals[0].percentage, 33);
    assert!(!first.goals[0].target_reached);

    // Completing before the target is reached is refused.
    let early = h.engine.complete_goal(h.user, goal.id).await.unwrap_err();
    assert!(matches!(early, CoreError::Conflict(_)));

    for title in ["b", "c"] {
        h.engine
            .submit_activity(h.user, submission(today(), dream(title)))
            .await
            .unwrap();
    }

    let xp_before = h.engine.stats_overview(h.user).await.unwrap().level.total_xp;
    let completed = h.engine.complete_goal(h.user, goal.id).await.unwrap();
    assert_eq!(completed.goal.status, GoalStatus::Completed);
    assert_eq!(completed.xp_awarded, 50);
    assert_eq!(completed.total_xp, xp_before + 50);

    // A second confirmation is a conflict, and no more XP lands.
    let again = h.engine.complete_goal(h.user, goal.id).await.unwrap_err();
    assert!(matches!(again, CoreError::Conflict(_)));
    assert_eq!(
        h.engine.stats_overview(h.user).await.unwrap().level.total_xp,
        completed.total_xp
    );
}

#[tokio::test]
async fn abandoning_a_goal_is_terminal() {
    let h = harness();
    let goal = h
        .engine
        .create_goal(
            h.user,
            SubmitGoal {
                goal_type: ActivityKind::Journal,
                target_value: 5,
                period: GoalPeriod::Monthly,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();

    let abandoned = h.engine.abandon_goal(h.user, goal.id).await.unwrap();
    assert_eq!(abandoned.status, GoalStatus::Abandoned);

    let err = h.engine.abandon_goal(h.user, goal.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn freeze_bridges_a_missed_day_on_submission() {
    let h = harness();
    let start = today() - Duration::days(3);
    h.engine
        .submit_activity(h.user, submission(start, dream("d1")))
        .await
        .unwrap();
    h.engine
        .submit_activity(h.user, submission(start + Duration::days(1), dream("d2")))
        .await
        .unwrap();

    // Nothing on day 3; day 4 arrives with a freeze request.
    let bridged = h
        .engine
        .submit_activity(
            h.user,
            SubmitActivity {
                entry_date: Some(today()),
                details: dream("d3"),
                use_streak_freeze: true,
            },
        )
        .await
        .unwrap();

    let dream_update = bridged
        .streaks
        .iter()
        .find(|u| u.streak.kind == StreakKind::Dream)
        .unwrap();
    assert_eq!(dream_update.change, StreakChange::Bridged);
    assert!(dream_update.freeze_used);
    assert_eq!(dream_update.streak.current_length, 3);
    assert_eq!(dream_update.streak.freezes_available, 0);
}

#[tokio::test]
async fn unfulfillable_freeze_request_rejects_the_whole_submission() {
    let h = harness();
    let start = today() - Duration::days(2);
    h.engine
        .submit_activity(h.user, submission(start, dream("d1")))
        .await
        .unwrap();

    // Drain the dream streak's only token.
    let mut streak = h
        .store
        .fetch_streak(h.user, StreakKind::Dream)
        .await
        .unwrap()
        .unwrap();
    streak.freezes_available = 0;
    h.store.upsert_streak(&streak).await.unwrap();

    let entries_before = h.store.entries.lock().unwrap().len();
    let err = h
        .engine
        .submit_activity(
            h.user,
            SubmitActivity {
                entry_date: Some(today()),
                details: dream("d2"),
                use_streak_freeze: true,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(h.store.entries.lock().unwrap().len(), entries_before);
}

#[tokio::test]
async fn interpretation_is_generated_once_and_reused() {
    let h = harness();
    let outcome = h
        .engine
        .submit_activity(h.user, submission(today(), dream("The Lighthouse")))
        .await
        .unwrap();

    let first = h
        .engine
        .interpret_dream(h.user, outcome.entry.id)
        .await
        .unwrap();
    assert_eq!(first.summary, "A dream about The Lighthouse");
    assert_eq!(h.interpreter.calls.load(Ordering::SeqCst), 1);

    let second = h
        .engine
        .interpret_dream(h.user, outcome.entry.id)
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(h.interpreter.calls.load(Ordering::SeqCst), 1);

    let unlocks = h.engine.unlocked_achievements(h.user).await.unwrap();
    assert!(unlocks
        .iter()
        .any(|u| u.achievement_id == AchievementId::SeekingMeaning));
}

#[tokio::test]
async fn only_dreams_can_be_interpreted() {
    let h = harness();
    let outcome = h
        .engine
        .submit_activity(
            h.user,
            submission(today(), ActivityDetails::Mood { rating: 4, note: None }),
        )
        .await
        .unwrap();

    let err = h
        .engine
        .interpret_dream(h.user, outcome.entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn sweep_fails_overdue_goals_and_expires_dead_streaks() {
    let h = harness();
    h.engine
        .create_goal(
            h.user,
            SubmitGoal {
                goal_type: ActivityKind::Dream,
                target_value: 2,
                period: GoalPeriod::Custom,
                start_date: Some(today() - Duration::days(5)),
                end_date: Some(today() - Duration::days(1)),
            },
        )
        .await
        .unwrap();
    h.engine
        .submit_activity(h.user, submission(today() - Duration::days(3), dream("old")))
        .await
        .unwrap();

    let report = h.engine.sweep_expired().await.unwrap();
    assert_eq!(report.goals_failed, 1);
    assert_eq!(report.streaks_expired, 2); // dream and wellness

    let goals = h.engine.list_goals(h.user, None).await.unwrap();
    assert_eq!(goals[0].goal.status, GoalStatus::Failed);

    let overview = h.engine.streak_overview(h.user).await.unwrap();
    for entry in overview
        .iter()
        .filter(|o| o.streak.last_activity_date.is_some())
    {
        assert_eq!(entry.streak.current_length, 0);
        assert_eq!(entry.streak.longest_length, 1);
    }

    // A second pass finds nothing left to clean.
    let repeat = h.engine.sweep_expired().await.unwrap();
    assert_eq!(repeat.goals_failed, 0);
    assert_eq!(repeat.streaks_expired, 0);
}

#[tokio::test]
async fn stats_overview_reflects_recomputed_truth() {
    let h = harness();
    h.engine
        .submit_activity(h.user, submission(today(), dream("a")))
        .await
        .unwrap();
    h.engine
        .submit_activity(
            h.user,
            submission(today(), ActivityDetails::Mood { rating: 3, note: None }),
        )
        .await
        .unwrap();
    h.engine
        .submit_activity(
            h.user,
            submission(
                today(),
                ActivityDetails::Journal {
                    body: "Slept well, woke early.".to_string(),
                },
            ),
        )
        .await
        .unwrap();

    let overview = h.engine.stats_overview(h.user).await.unwrap();
    assert_eq!(overview.stats.dream_count, 1);
    assert_eq!(overview.stats.mood_count, 1);
    assert_eq!(overview.stats.journal_count, 1);
    assert_eq!(overview.stats.total_entries(), 3);
    assert_eq!(overview.stats.wellness_streak, 1);
    assert_eq!(overview.top_dream_tags.len(), 1);
    assert_eq!(overview.top_dream_tags[0].tag, "recurring");
    assert_eq!(overview.top_dream_tags[0].count, 1);

    // 10 + 5 + 10 base, plus first-dream, first-mood and first-journal
    // badges at 25 each.
    assert_eq!(overview.level.total_xp, 100);
    assert_eq!(overview.level.level, 2);
}
