//! crates/dream_journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format
//! beyond the serde derives needed to cross the API boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// The kind of action a user logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Dream,
    Mood,
    Sleep,
    Journal,
}

impl ActivityKind {
    /// Stable string form used for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dream => "dream",
            Self::Mood => "mood",
            Self::Sleep => "sleep",
            Self::Journal => "journal",
        }
    }

    /// Parse from the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dream" => Some(Self::Dream),
            "mood" => Some(Self::Mood),
            "sleep" => Some(Self::Sleep),
            "journal" => Some(Self::Journal),
            _ => None,
        }
    }
}

/// The three sleep inputs a user records. Score and grade are derived from
/// this triple on demand and are never stored as independent truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepSample {
    pub duration_hours: f64,
    /// Subjective sleep quality, integer 1–5.
    pub quality_rating: u8,
    /// How rested the user felt on waking, integer 1–5.
    pub restfulness_rating: u8,
}

/// Kind-specific payload of an activity entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityDetails {
    Dream {
        title: String,
        description: String,
        tags: Vec<String>,
        lucid: bool,
    },
    Mood {
        /// Integer 1–5.
        rating: u8,
        note: Option<String>,
    },
    Sleep {
        sample: SleepSample,
    },
    Journal {
        body: String,
    },
}

impl ActivityDetails {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityDetails::Dream { .. } => ActivityKind::Dream,
            ActivityDetails::Mood { .. } => ActivityKind::Mood,
            ActivityDetails::Sleep { .. } => ActivityKind::Sleep,
            ActivityDetails::Journal { .. } => ActivityKind::Journal,
        }
    }

    /// Field-level checks on the user-supplied payload. Sleep samples are
    /// not checked here; scoring validates them when the score is computed.
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            ActivityDetails::Dream { title, description, .. } => {
                if title.trim().is_empty() {
                    return Err(CoreError::Validation("dream title must not be empty".into()));
                }
                if description.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "dream description must not be empty".into(),
                    ));
                }
                Ok(())
            }
            ActivityDetails::Mood { rating, .. } => {
                if !(1..=5).contains(rating) {
                    return Err(CoreError::Validation(
                        "mood rating must be between 1 and 5".into(),
                    ));
                }
                Ok(())
            }
            ActivityDetails::Sleep { .. } => Ok(()),
            ActivityDetails::Journal { body } => {
                if body.trim().is_empty() {
                    return Err(CoreError::Validation("journal body must not be empty".into()));
                }
                Ok(())
            }
        }
    }
}

/// One user action at a user-local calendar day. Immutable once created
/// except for explicit edits.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Calendar day the entry belongs to, in the user's local time. The
    /// client supplies it; the core never guesses timezones.
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub details: ActivityDetails,
}

impl ActivityEntry {
    pub fn kind(&self) -> ActivityKind {
        self.details.kind()
    }
}

/// Which consecutive-day streak a record tracks. `Wellness` counts activity
/// of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakKind {
    Dream,
    Mood,
    Wellness,
}

impl StreakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dream => "dream",
            Self::Mood => "mood",
            Self::Wellness => "wellness",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dream" => Some(Self::Dream),
            "mood" => Some(Self::Mood),
            "wellness" => Some(Self::Wellness),
            _ => None,
        }
    }

    pub fn all() -> &'static [StreakKind] {
        &[Self::Dream, Self::Mood, Self::Wellness]
    }

    /// The streaks an activity of `kind` feeds. Every kind counts toward
    /// wellness; dreams and moods additionally have a streak of their own.
    pub fn affected_by(kind: ActivityKind) -> &'static [StreakKind] {
        match kind {
            ActivityKind::Dream => &[Self::Dream, Self::Wellness],
            ActivityKind::Mood => &[Self::Mood, Self::Wellness],
            ActivityKind::Sleep | ActivityKind::Journal => &[Self::Wellness],
        }
    }
}

/// Per-user, per-kind streak state. `longest_length = max(longest_length,
/// current_length)` holds after every update.
#[derive(Debug, Clone, Serialize)]
pub struct Streak {
    pub user_id: Uuid,
    pub kind: StreakKind,
    pub current_length: u32,
    pub longest_length: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub freezes_available: u32,
}

impl Streak {
    /// A streak that has never seen activity. New streaks start with one
    /// freeze token in the bank.
    pub fn new(user_id: Uuid, kind: StreakKind) -> Self {
        Self {
            user_id,
            kind,
            current_length: 0,
            longest_length: 0,
            last_activity_date: None,
            freezes_available: 1,
        }
    }
}

/// The time window shape of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl GoalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Goal lifecycle. `Completed`, `Failed` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Failed,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// A user-created target over a date window. `current_value` is not a field:
/// it is re-aggregated from activity entries inside the window whenever it
/// is needed, which keeps progress drift-free and re-runs harmless.
#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_type: ActivityKind,
    pub target_value: u32,
    pub period: GoalPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

/// A stored LLM interpretation of a dream entry.
#[derive(Debug, Clone, Serialize)]
pub struct DreamInterpretation {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub summary: String,
    pub symbols: Vec<String>,
    pub reflection: String,
    /// Which model produced this interpretation.
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregates derivable from the entry and interpretation tables alone.
/// Produced by the activity store in one query pass; the engine overlays
/// streak state to build a full [`UserStats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityTotals {
    pub dream_count: u64,
    pub mood_count: u64,
    pub sleep_count: u64,
    pub journal_count: u64,
    pub lucid_dream_count: u64,
    pub interpretation_count: u64,
    pub best_sleep_score: Option<u8>,
    pub average_sleep_score: Option<f64>,
}

/// How often a tag appears across a user's dream entries.
#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Snapshot of a user's lifetime aggregates, used by the achievement
/// evaluator and the stats endpoint. Always recomputed from source entries,
/// never incremented, so duplicate or replayed writes cannot skew it.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct UserStats {
    pub dream_count: u64,
    pub mood_count: u64,
    pub sleep_count: u64,
    pub journal_count: u64,
    pub lucid_dream_count: u64,
    pub interpretation_count: u64,
    /// Best sleep score ever recorded, absent until the first sleep log.
    pub best_sleep_score: Option<u8>,
    pub average_sleep_score: Option<f64>,
    pub dream_streak: u32,
    pub mood_streak: u32,
    pub wellness_streak: u32,
    pub longest_dream_streak: u32,
    pub longest_mood_streak: u32,
    pub longest_wellness_streak: u32,
}

impl UserStats {
    /// Merge entry-table aggregates with the current streak rows. Kinds with
    /// no streak row yet read as zero.
    pub fn assemble(totals: ActivityTotals, streaks: &[Streak]) -> Self {
        let mut stats = UserStats {
            dream_count: totals.dream_count,
            mood_count: totals.mood_count,
            sleep_count: totals.sleep_count,
            journal_count: totals.journal_count,
            lucid_dream_count: totals.lucid_dream_count,
            interpretation_count: totals.interpretation_count,
            best_sleep_score: totals.best_sleep_score,
            average_sleep_score: totals.average_sleep_score,
            ..UserStats::default()
        };
        for streak in streaks {
            match streak.kind {
                StreakKind::Dream => {
                    stats.dream_streak = streak.current_length;
                    stats.longest_dream_streak = streak.longest_length;
                }
                StreakKind::Mood => {
                    stats.mood_streak = streak.current_length;
                    stats.longest_mood_streak = streak.longest_length;
                }
                StreakKind::Wellness => {
                    stats.wellness_streak = streak.current_length;
                    stats.longest_wellness_streak = streak.longest_length;
                }
            }
        }
        stats
    }

    pub fn count(&self, kind: ActivityKind) -> u64 {
        match kind {
            ActivityKind::Dream => self.dream_count,
            ActivityKind::Mood => self.mood_count,
            ActivityKind::Sleep => self.sleep_count,
            ActivityKind::Journal => self.journal_count,
        }
    }

    pub fn total_entries(&self) -> u64 {
        self.dream_count + self.mood_count + self.sleep_count + self.journal_count
    }

    /// Current length of the named streak.
    pub fn streak(&self, kind: StreakKind) -> u32 {
        match kind {
            StreakKind::Dream => self.dream_streak,
            StreakKind::Mood => self.mood_streak,
            StreakKind::Wellness => self.wellness_streak,
        }
    }
}
