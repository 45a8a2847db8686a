//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `ActivityStore` and `ProgressStore` ports from the
//! `core` crate. It handles all interactions with the PostgreSQL database
//! using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use dream_journal_core::achievements::{AchievementId, AchievementUnlock};
use dream_journal_core::domain::{
    ActivityDetails, ActivityEntry, ActivityKind, ActivityTotals, DreamInterpretation, Goal,
    GoalPeriod, GoalStatus, SleepSample, Streak, StreakKind, TagCount,
};
use dream_journal_core::error::{CoreError, CoreResult};
use dream_journal_core::ports::{ActivityStore, ProgressStore};
use dream_journal_core::scoring;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the core store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Upsert the user row so foreign keys hold on first contact. The app
    /// has no signup; a user exists once their id first writes anything.
    async fn ensure_user(&self, user_id: Uuid) -> CoreResult<()> {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

fn store_err(e: sqlx::Error) -> CoreError {
    CoreError::Store(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct EntryRecord {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    entry_date: NaiveDate,
    created_at: DateTime<Utc>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    lucid: Option<bool>,
    mood_rating: Option<i16>,
    mood_note: Option<String>,
    sleep_duration_hours: Option<f64>,
    sleep_quality: Option<i16>,
    sleep_restfulness: Option<i16>,
    journal_body: Option<String>,
}

impl EntryRecord {
    fn to_domain(self) -> CoreResult<ActivityEntry> {
        let kind = ActivityKind::parse(&self.kind)
            .ok_or_else(|| CoreError::Store(format!("entry {} has unknown kind", self.id)))?;
        let malformed =
            || CoreError::Store(format!("entry {} has a malformed {} payload", self.id, kind.as_str()));

        let details = match kind {
            ActivityKind::Dream => ActivityDetails::Dream {
                title: self.title.ok_or_else(malformed)?,
                description: self.description.ok_or_else(malformed)?,
                tags: self.tags.unwrap_or_default(),
                lucid: self.lucid.unwrap_or(false),
            },
            ActivityKind::Mood => ActivityDetails::Mood {
                rating: self.mood_rating.ok_or_else(malformed)? as u8,
                note: self.mood_note,
            },
            ActivityKind::Sleep => ActivityDetails::Sleep {
                sample: SleepSample {
                    duration_hours: self.sleep_duration_hours.ok_or_else(malformed)?,
                    quality_rating: self.sleep_quality.ok_or_else(malformed)? as u8,
                    restfulness_rating: self.sleep_restfulness.ok_or_else(malformed)? as u8,
                },
            },
            ActivityKind::Journal => ActivityDetails::Journal {
                body: self.journal_body.ok_or_else(malformed)?,
            },
        };

        Ok(ActivityEntry {
            id: self.id,
            user_id: self.user_id,
            entry_date: self.entry_date,
            created_at: self.created_at,
            details,
        })
    }
}

const ENTRY_COLUMNS: &str = "id, user_id, kind, entry_date, created_at, title, description, \
     tags, lucid, mood_rating, mood_note, sleep_duration_hours, sleep_quality, \
     sleep_restfulness, journal_body";

#[derive(FromRow)]
struct TotalsRecord {
    dream_count: i64,
    mood_count: i64,
    sleep_count: i64,
    journal_count: i64,
    lucid_dream_count: i64,
    best_sleep_score: Option<i16>,
    average_sleep_score: Option<f64>,
}

#[derive(FromRow)]
struct TagCountRecord {
    tag: String,
    count: i64,
}

#[derive(FromRow)]
struct InterpretationRecord {
    id: Uuid,
    entry_id: Uuid,
    summary: String,
    symbols: Vec<String>,
    reflection: String,
    model: String,
    created_at: DateTime<Utc>,
}

impl InterpretationRecord {
    fn to_domain(self) -> DreamInterpretation {
        DreamInterpretation {
            id: self.id,
            entry_id: self.entry_id,
            summary: self.summary,
            symbols: self.symbols,
            reflection: self.reflection,
            model: self.model,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StreakRecord {
    user_id: Uuid,
    kind: String,
    current_length: i32,
    longest_length: i32,
    last_activity_date: Option<NaiveDate>,
    freezes_available: i32,
}

impl StreakRecord {
    fn to_domain(self) -> CoreResult<Streak> {
        let kind = StreakKind::parse(&self.kind).ok_or_else(|| {
            CoreError::Store(format!("streak row has unknown kind '{}'", self.kind))
        })?;
        Ok(Streak {
            user_id: self.user_id,
            kind,
            current_length: self.current_length as u32,
            longest_length: self.longest_length as u32,
            last_activity_date: self.last_activity_date,
            freezes_available: self.freezes_available as u32,
        })
    }
}

const STREAK_COLUMNS: &str =
    "user_id, kind, current_length, longest_length, last_activity_date, freezes_available";

#[derive(FromRow)]
struct GoalRecord {
    id: Uuid,
    user_id: Uuid,
    goal_type: String,
    target_value: i32,
    period: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl GoalRecord {
    fn to_domain(self) -> CoreResult<Goal> {
        let goal_type = ActivityKind::parse(&self.goal_type)
            .ok_or_else(|| CoreError::Store(format!("goal {} has unknown type", self.id)))?;
        let period = GoalPeriod::parse(&self.period)
            .ok_or_else(|| CoreError::Store(format!("goal {} has unknown period", self.id)))?;
        let status = GoalStatus::parse(&self.status)
            .ok_or_else(|| CoreError::Store(format!("goal {} has unknown status", self.id)))?;
        Ok(Goal {
            id: self.id,
            user_id: self.user_id,
            goal_type,
            target_value: self.target_value as u32,
            period,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            created_at: self.created_at,
        })
    }
}

const GOAL_COLUMNS: &str =
    "id, user_id, goal_type, target_value, period, start_date, end_date, status, created_at";

#[derive(FromRow)]
struct UnlockRecord {
    achievement_id: String,
    unlocked_at: DateTime<Utc>,
}

//=========================================================================================
// `ActivityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ActivityStore for DbAdapter {
    async fn insert_entry(&self, entry: &ActivityEntry) -> CoreResult<()> {
        self.ensure_user(entry.user_id).await?;

        let mut title: Option<&str> = None;
        let mut description: Option<&str> = None;
        let mut tags: Option<&[String]> = None;
        let mut lucid: Option<bool> = None;
        let mut mood_rating: Option<i16> = None;
        let mut mood_note: Option<&str> = None;
        let mut sleep_duration: Option<f64> = None;
        let mut sleep_quality: Option<i16> = None;
        let mut sleep_restfulness: Option<i16> = None;
        let mut sleep_score: Option<i16> = None;
        let mut journal_body: Option<&str> = None;

        match &entry.details {
            ActivityDetails::Dream {
                title: t,
                description: d,
                tags: tg,
                lucid: l,
            } => {
                title = Some(t);
                description = Some(d);
                tags = Some(tg);
                lucid = Some(*l);
            }
            ActivityDetails::Mood { rating, note } => {
                mood_rating = Some(i16::from(*rating));
                mood_note = note.as_deref();
            }
            ActivityDetails::Sleep { sample } => {
                sleep_duration = Some(sample.duration_hours);
                sleep_quality = Some(i16::from(sample.quality_rating));
                sleep_restfulness = Some(i16::from(sample.restfulness_rating));
                // Entries reach the store validated, so scoring cannot fail
                // here; a NULL would only mean the row predates scoring.
                sleep_score = scoring::score_sleep(sample).ok().map(|s| i16::from(s.score));
            }
            ActivityDetails::Journal { body } => {
                journal_body = Some(body);
            }
        }

        sqlx::query(
            "INSERT INTO activity_entries (id, user_id, kind, entry_date, created_at, title, \
             description, tags, lucid, mood_rating, mood_note, sleep_duration_hours, \
             sleep_quality, sleep_restfulness, sleep_score, journal_body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.kind().as_str())
        .bind(entry.entry_date)
        .bind(entry.created_at)
        .bind(title)
        .bind(description)
        .bind(tags)
        .bind(lucid)
        .bind(mood_rating)
        .bind(mood_note)
        .bind(sleep_duration)
        .bind(sleep_quality)
        .bind(sleep_restfulness)
        .bind(sleep_score)
        .bind(journal_body)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!("entry {} already exists", entry.id))
            } else {
                store_err(e)
            }
        })?;
        Ok(())
    }

    async fn fetch_entry(&self, user_id: Uuid, entry_id: Uuid) -> CoreResult<ActivityEntry> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM activity_entries WHERE user_id = $1 AND id = $2"
        );
        let record = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(user_id)
            .bind(entry_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    CoreError::NotFound(format!("entry {} not found", entry_id))
                }
                _ => store_err(e),
            })?;
        record.to_domain()
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
        // NULL filters are no-ops so one statement covers every combination.
        let records = match kind {
            Some(kind) => {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM activity_entries \
                     WHERE user_id = $1 AND kind = $2 \
                     AND ($3::date IS NULL OR entry_date >= $3::date) \
                     AND ($4::date IS NULL OR entry_date <= $4::date) \
                     ORDER BY entry_date DESC, created_at DESC LIMIT $5 OFFSET $6"
                );
                sqlx::query_as::<_, EntryRecord>(&sql)
                    .bind(user_id)
                    .bind(kind.as_str())
                    .bind(from)
                    .bind(to)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM activity_entries WHERE user_id = $1 \
                     AND ($2::date IS NULL OR entry_date >= $2::date) \
                     AND ($3::date IS NULL OR entry_date <= $3::date) \
                     ORDER BY entry_date DESC, created_at DESC LIMIT $4 OFFSET $5"
                );
                sqlx::query_as::<_, EntryRecord>(&sql)
                    .bind(user_id)
                    .bind(from)
                    .bind(to)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(store_err)?;

        records.into_iter().map(EntryRecord::to_domain).collect()
    }

    async fn count_entries_between(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM activity_entries \
             WHERE user_id = $1 AND kind = $2 AND entry_date BETWEEN $3 AND $4",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(count as u64)
    }

    async fn activity_totals(&self, user_id: Uuid) -> CoreResult<ActivityTotals> {
        let record = sqlx::query_as::<_, TotalsRecord>(
            "SELECT \
               COUNT(*) FILTER (WHERE kind = 'dream') AS dream_count, \
               COUNT(*) FILTER (WHERE kind = 'mood') AS mood_count, \
               COUNT(*) FILTER (WHERE kind = 'sleep') AS sleep_count, \
               COUNT(*) FILTER (WHERE kind = 'journal') AS journal_count, \
               COUNT(*) FILTER (WHERE kind = 'dream' AND lucid) AS lucid_dream_count, \
               MAX(sleep_score) AS best_sleep_score, \
               AVG(sleep_score)::double precision AS average_sleep_score \
             FROM activity_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        let interpretation_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dream_interpretations di \
             JOIN activity_entries e ON e.id = di.entry_id WHERE e.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(ActivityTotals {
            dream_count: record.dream_count as u64,
            mood_count: record.mood_count as u64,
            sleep_count: record.sleep_count as u64,
            journal_count: record.journal_count as u64,
            lucid_dream_count: record.lucid_dream_count as u64,
            interpretation_count: interpretation_count as u64,
            best_sleep_score: record.best_sleep_score.map(|s| s as u8),
            average_sleep_score: record.average_sleep_score,
        })
    }

    async fn top_dream_tags(&self, user_id: Uuid, limit: i64) -> CoreResult<Vec<TagCount>> {
        let records = sqlx::query_as::<_, TagCountRecord>(
            "SELECT tag, COUNT(*) AS count \
             FROM activity_entries, UNNEST(tags) AS tag \
             WHERE user_id = $1 AND kind = 'dream' \
             GROUP BY tag ORDER BY count DESC, tag LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records
            .into_iter()
            .map(|r| TagCount {
                tag: r.tag,
                count: r.count as u64,
            })
            .collect())
    }

    async fn insert_interpretation(
        &self,
        interpretation: &DreamInterpretation,
    ) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO dream_interpretations \
             (id, entry_id, summary, symbols, reflection, model, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(interpretation.id)
        .bind(interpretation.entry_id)
        .bind(&interpretation.summary)
        .bind(&interpretation.symbols)
        .bind(&interpretation.reflection)
        .bind(&interpretation.model)
        .bind(interpretation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!(
                    "entry {} is already interpreted",
                    interpretation.entry_id
                ))
            } else {
                store_err(e)
            }
        })?;
        Ok(())
    }

    async fn interpretation_for_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> CoreResult<Option<DreamInterpretation>> {
        let record = sqlx::query_as::<_, InterpretationRecord>(
            "SELECT di.id, di.entry_id, di.summary, di.symbols, di.reflection, di.model, \
             di.created_at \
             FROM dream_interpretations di \
             JOIN activity_entries e ON e.id = di.entry_id \
             WHERE e.user_id = $1 AND di.entry_id = $2",
        )
        .bind(user_id)
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(record.map(InterpretationRecord::to_domain))
    }
}

//=========================================================================================
// `ProgressStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressStore for DbAdapter {
    async fn fetch_streaks(&self, user_id: Uuid) -> CoreResult<Vec<Streak>> {
        let sql = format!("SELECT {STREAK_COLUMNS} FROM streaks WHERE user_id = $1");
        let records = sqlx::query_as::<_, StreakRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        records.into_iter().map(StreakRecord::to_domain).collect()
    }

    async fn fetch_streak(&self, user_id: Uuid, kind: StreakKind) -> CoreResult<Option<Streak>> {
        let sql =
            format!("SELECT {STREAK_COLUMNS} FROM streaks WHERE user_id = $1 AND kind = $2");
        let record = sqlx::query_as::<_, StreakRecord>(&sql)
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        record.map(StreakRecord::to_domain).transpose()
    }

    async fn upsert_streak(&self, streak: &Streak) -> CoreResult<()> {
        self.ensure_user(streak.user_id).await?;
        sqlx::query(
            "INSERT INTO streaks \
             (user_id, kind, current_length, longest_length, last_activity_date, freezes_available) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, kind) DO UPDATE SET \
               current_length = EXCLUDED.current_length, \
               longest_length = EXCLUDED.longest_length, \
               last_activity_date = EXCLUDED.last_activity_date, \
               freezes_available = EXCLUDED.freezes_available",
        )
        .bind(streak.user_id)
        .bind(streak.kind.as_str())
        .bind(streak.current_length as i32)
        .bind(streak.longest_length as i32)
        .bind(streak.last_activity_date)
        .bind(streak.freezes_available as i32)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn stale_streaks(&self, cutoff: NaiveDate) -> CoreResult<Vec<Streak>> {
        let sql = format!(
            "SELECT {STREAK_COLUMNS} FROM streaks \
             WHERE current_length > 0 AND last_activity_date IS NOT NULL \
             AND last_activity_date < $1"
        );
        let records = sqlx::query_as::<_, StreakRecord>(&sql)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        records.into_iter().map(StreakRecord::to_domain).collect()
    }

    async fn insert_goal(&self, goal: &Goal) -> CoreResult<()> {
        self.ensure_user(goal.user_id).await?;
        sqlx::query(
            "INSERT INTO goals \
             (id, user_id, goal_type, target_value, period, start_date, end_date, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(goal.id)
        .bind(goal.user_id)
        .bind(goal.goal_type.as_str())
        .bind(goal.target_value as i32)
        .bind(goal.period.as_str())
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.status.as_str())
        .bind(goal.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn fetch_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Goal> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = $1 AND id = $2");
        let record = sqlx::query_as::<_, GoalRecord>(&sql)
            .bind(user_id)
            .bind(goal_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    CoreError::NotFound(format!("goal {} not found", goal_id))
                }
                _ => store_err(e),
            })?;
        record.to_domain()
    }

    async fn list_goals(
        &self,
        user_id: Uuid,
        status: Option<GoalStatus>,
    ) -> CoreResult<Vec<Goal>> {
        let records = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = $1 AND status = $2 \
                     ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, GoalRecord>(&sql)
                    .bind(user_id)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = $1 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, GoalRecord>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(store_err)?;
        records.into_iter().map(GoalRecord::to_domain).collect()
    }

    async fn set_goal_status(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        status: GoalStatus,
    ) -> CoreResult<()> {
        let result = sqlx::query("UPDATE goals SET status = $1 WHERE user_id = $2 AND id = $3")
            .bind(status.as_str())
            .bind(user_id)
            .bind(goal_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("goal {} not found", goal_id)));
        }
        Ok(())
    }

    async fn overdue_goals(&self, today: NaiveDate) -> CoreResult<Vec<Goal>> {
        let sql = format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE status = 'active' AND end_date < $1"
        );
        let records = sqlx::query_as::<_, GoalRecord>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        records.into_iter().map(GoalRecord::to_domain).collect()
    }

    async fn unlocked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<AchievementUnlock>> {
        let records = sqlx::query_as::<_, UnlockRecord>(
            "SELECT achievement_id, unlocked_at FROM achievement_unlocks \
             WHERE user_id = $1 ORDER BY unlocked_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        // Rows written by a newer deployment may hold ids this build does
        // not know; skip them rather than failing the whole listing.
        Ok(records
            .into_iter()
            .filter_map(|r| match AchievementId::parse(&r.achievement_id) {
                Some(achievement_id) => Some(AchievementUnlock {
                    achievement_id,
                    unlocked_at: r.unlocked_at,
                }),
                None => {
                    warn!("skipping unknown achievement id '{}'", r.achievement_id);
                    None
                }
            })
            .collect())
    }

    async fn record_unlock(
        &self,
        user_id: Uuid,
        achievement_id: AchievementId,
        unlocked_at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        self.ensure_user(user_id).await?;
        let result = sqlx::query(
            "INSERT INTO achievement_unlocks (user_id, achievement_id, unlocked_at) \
             VALUES ($1, $2, $3) ON CONFLICT (user_id, achievement_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(achievement_id.as_str())
        .bind(unlocked_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn add_xp(&self, user_id: Uuid, amount: u64) -> CoreResult<u64> {
        self.ensure_user(user_id).await?;
        // A single statement keeps concurrent awards additive.
        let total: i64 = sqlx::query_scalar(
            "INSERT INTO xp_ledgers (user_id, total_xp) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
               total_xp = xp_ledgers.total_xp + EXCLUDED.total_xp \
             RETURNING total_xp",
        )
        .bind(user_id)
        .bind(amount as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(total as u64)
    }

    async fn total_xp(&self, user_id: Uuid) -> CoreResult<u64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total_xp FROM xp_ledgers WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(total.unwrap_or(0) as u64)
    }
}
