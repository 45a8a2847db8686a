//! crates/dream_journal_core/src/streaks.rs
//!
//! Consecutive-day streak tracking. The transition rules are pure functions
//! over the `Streak` record; persistence and "when is now" both belong to
//! the caller, which keeps every rule directly testable.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::domain::Streak;
use crate::error::{CoreError, CoreResult};

/// A streak can hold at most this many unused freeze tokens.
pub const MAX_FREEZES: u32 = 3;

/// Every full week of streak earns one freeze token (up to [`MAX_FREEZES`]).
const FREEZE_GRANT_EVERY: u32 = 7;

/// What a transition did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First ever activity on this streak.
    Started,
    /// Consecutive day, length grew by one.
    Extended,
    /// Same-day duplicate or out-of-order date; nothing moved.
    Unchanged,
    /// A one-day gap was covered by a freeze token.
    Bridged,
    /// The gap was too large; length restarted at one.
    Reset,
}

impl StreakChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakChange::Started => "started",
            StreakChange::Extended => "extended",
            StreakChange::Unchanged => "unchanged",
            StreakChange::Bridged => "bridged",
            StreakChange::Reset => "reset",
        }
    }
}

/// Result of advancing a streak with a new activity date.
#[derive(Debug, Clone)]
pub struct StreakUpdate {
    pub streak: Streak,
    pub change: StreakChange,
    pub freeze_used: bool,
    /// A weekly milestone was crossed and a token was banked.
    pub freeze_earned: bool,
}

/// How healthy a streak currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakHealth {
    /// Never had any activity.
    Empty,
    /// Activity already logged today.
    Safe,
    /// Last activity was yesterday; breaks at the next day boundary.
    AtRisk,
    /// Yesterday was missed, but activity today with a freeze still bridges
    /// the gap.
    Recoverable,
    /// More than one day missed; the next activity starts over.
    Broken,
}

impl StreakHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakHealth::Empty => "empty",
            StreakHealth::Safe => "safe",
            StreakHealth::AtRisk => "at_risk",
            StreakHealth::Recoverable => "recoverable",
            StreakHealth::Broken => "broken",
        }
    }
}

/// Point-in-time evaluation of a streak, computed fresh on every call so a
/// caller can decide to apply a freeze before the day boundary passes.
#[derive(Debug, Clone, Serialize)]
pub struct StreakStatus {
    pub health: StreakHealth,
    /// Hours until the current UTC day ends, present when the streak will
    /// break (or become unrecoverable) at that boundary.
    pub hours_until_break: Option<i64>,
    pub freeze_available: bool,
}

/// Advance a streak with activity on `date`.
///
/// Rules, in order: a first activity starts at one; a same-day duplicate
/// does not double-count; the next day extends; a two-day jump (exactly one
/// missed day) extends only when `use_freeze` is set and a token is
/// available, consuming the token; anything else resets to one. A dated
/// submission older than `last_activity_date` leaves the streak alone.
/// `longest_length` is re-derived after every change.
///
/// Requesting a freeze for a one-day gap with an empty bank is an error, so
/// the caller can surface it instead of quietly resetting the streak.
pub fn advance(streak: &Streak, date: NaiveDate, use_freeze: bool) -> CoreResult<StreakUpdate> {
    let mut next = streak.clone();
    let mut freeze_used = false;

    let change = match streak.last_activity_date {
        None => {
            next.current_length = 1;
            next.last_activity_date = Some(date);
            StreakChange::Started
        }
        Some(last) => match (date - last).num_days() {
            d if d <= 0 => StreakChange::Unchanged,
            1 => {
                next.current_length += 1;
                next.last_activity_date = Some(date);
                StreakChange::Extended
            }
            2 if use_freeze => {
                if streak.freezes_available == 0 {
                    return Err(CoreError::Conflict(format!(
                        "no streak freeze available for {} streak",
                        streak.kind.as_str()
                    )));
                }
                next.current_length += 1;
                next.freezes_available -= 1;
                next.last_activity_date = Some(date);
                freeze_used = true;
                StreakChange::Bridged
            }
            _ => {
                next.current_length = 1;
                next.last_activity_date = Some(date);
                StreakChange::Reset
            }
        },
    };

    let freeze_earned = match change {
        StreakChange::Unchanged => false,
        _ => earn_freeze(&mut next),
    };
    next.longest_length = next.longest_length.max(next.current_length);

    Ok(StreakUpdate {
        streak: next,
        change,
        freeze_used,
        freeze_earned,
    })
}

/// Evaluate a streak against the current instant.
pub fn status(streak: &Streak, now: DateTime<Utc>) -> StreakStatus {
    let today = now.date_naive();
    let freeze_available = streak.freezes_available > 0;

    let health = match streak.last_activity_date {
        None => StreakHealth::Empty,
        Some(last) => match (today - last).num_days() {
            d if d <= 0 => StreakHealth::Safe,
            1 => StreakHealth::AtRisk,
            2 => StreakHealth::Recoverable,
            _ => StreakHealth::Broken,
        },
    };

    let hours_until_break = match health {
        StreakHealth::AtRisk | StreakHealth::Recoverable => Some(hours_until_midnight(now)),
        _ => None,
    };

    StreakStatus {
        health,
        hours_until_break,
        freeze_available,
    }
}

/// Explicitly spend a freeze token to cover a missed day.
///
/// At risk (last activity yesterday): today is marked covered, so tomorrow's
/// activity continues the run. Recoverable (yesterday missed): yesterday is
/// marked covered, so activity later today extends normally. Both consume
/// one token. Anything else — no tokens, streak safe, empty or already
/// broken — is a conflict the caller reports to the user.
pub fn apply_freeze(streak: &Streak, today: NaiveDate) -> CoreResult<Streak> {
    if streak.freezes_available == 0 {
        return Err(CoreError::Conflict(format!(
            "no streak freeze available for {} streak",
            streak.kind.as_str()
        )));
    }

    let last = streak.last_activity_date.ok_or_else(|| {
        CoreError::Conflict("streak has no activity to protect".to_string())
    })?;

    let covered = match (today - last).num_days() {
        1 => today,
        2 => today - Duration::days(1),
        _ => {
            return Err(CoreError::Conflict(
                "streak is not at risk; freeze not applied".to_string(),
            ))
        }
    };

    let mut next = streak.clone();
    next.freezes_available -= 1;
    next.last_activity_date = Some(covered);
    Ok(next)
}

/// Zero out a streak that a scheduled check found broken. Longest length and
/// banked freezes survive.
pub fn expire(streak: &Streak) -> Streak {
    let mut next = streak.clone();
    next.current_length = 0;
    next
}

fn earn_freeze(streak: &mut Streak) -> bool {
    if streak.current_length > 0
        && streak.current_length % FREEZE_GRANT_EVERY == 0
        && streak.freezes_available < MAX_FREEZES
    {
        streak.freezes_available += 1;
        true
    } else {
        false
    }
}

fn hours_until_midnight(now: DateTime<Utc>) -> i64 {
    let seconds_into_day = i64::from(now.time().num_seconds_from_midnight());
    (86_400 - seconds_into_day) / 3_600
}
