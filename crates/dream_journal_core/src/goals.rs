//! crates/dream_journal_core/src/goals.rs
//!
//! Goal windows and progress. Progress is always recomputed from the
//! caller-supplied activity count rather than a stored counter, so a stale
//! or duplicated write can never leave a goal permanently wrong.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{ActivityKind, Goal, GoalPeriod, GoalStatus};
use crate::error::{CoreError, CoreResult};

/// Snapshot of how a goal is doing, relative to `today`.
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub goal_id: Uuid,
    pub current_value: u32,
    pub target_value: u32,
    /// Completion percentage, capped at 100.
    pub percentage: u8,
    /// Whole days until the window closes. Zero on the final day, negative
    /// once the window has passed.
    pub days_remaining: i64,
    /// Whether completed work is keeping pace with elapsed window time.
    pub is_on_track: bool,
    /// The target has been met; the user can confirm completion.
    pub target_reached: bool,
}

/// Last day of a goal window starting at `start`. Daily goals close the same
/// day, weekly after seven calendar days, monthly one calendar month later
/// (clamped for short months). Custom windows supply their own end date.
pub fn period_end(
    period: GoalPeriod,
    start: NaiveDate,
    custom_end: Option<NaiveDate>,
) -> CoreResult<NaiveDate> {
    match period {
        GoalPeriod::Daily => Ok(start),
        GoalPeriod::Weekly => Ok(start + Duration::days(6)),
        GoalPeriod::Monthly => start
            .checked_add_months(Months::new(1))
            .map(|d| d - Duration::days(1))
            .ok_or_else(|| CoreError::Validation("goal start date out of range".to_string())),
        GoalPeriod::Custom => {
            let end = custom_end.ok_or_else(|| {
                CoreError::Validation("custom goals require an end date".to_string())
            })?;
            if end < start {
                return Err(CoreError::Validation(
                    "goal end date must not precede its start date".to_string(),
                ));
            }
            Ok(end)
        }
    }
}

/// Build a new active goal, deriving the window end from the period. An end
/// date supplied for a non-custom period is ignored in favor of the derived
/// one.
pub fn create(
    user_id: Uuid,
    goal_type: ActivityKind,
    target_value: u32,
    period: GoalPeriod,
    start_date: NaiveDate,
    custom_end: Option<NaiveDate>,
    created_at: DateTime<Utc>,
) -> CoreResult<Goal> {
    if target_value == 0 {
        return Err(CoreError::Validation(
            "goal target must be at least 1".to_string(),
        ));
    }
    let end_date = period_end(period, start_date, custom_end)?;
    Ok(Goal {
        id: Uuid::new_v4(),
        user_id,
        goal_type,
        target_value,
        period,
        start_date,
        end_date,
        status: GoalStatus::Active,
        created_at,
    })
}

/// Compute progress for a goal given the activity count inside its window.
pub fn progress(goal: &Goal, current_value: u32, today: NaiveDate) -> GoalProgress {
    let target = goal.target_value.max(1);
    let raw_pct = (f64::from(current_value) * 100.0 / f64::from(target)).round();
    let percentage = raw_pct.min(100.0) as u8;

    let days_remaining = (goal.end_date - today).num_days();

    let window_days = (goal.end_date - goal.start_date).num_days();
    let elapsed_fraction = if window_days == 0 {
        // Single-day window: nothing has elapsed before the day, all of it
        // from the day on.
        if today < goal.start_date {
            0.0
        } else {
            1.0
        }
    } else {
        let elapsed_days = (today - goal.start_date).num_days().clamp(0, window_days);
        elapsed_days as f64 / window_days as f64
    };
    let progress_fraction = f64::from(current_value) / f64::from(target);

    GoalProgress {
        goal_id: goal.id,
        current_value,
        target_value: goal.target_value,
        percentage,
        days_remaining,
        is_on_track: progress_fraction >= elapsed_fraction,
        target_reached: current_value >= goal.target_value,
    }
}

/// An active goal whose window has fully passed.
pub fn is_overdue(goal: &Goal, today: NaiveDate) -> bool {
    goal.status == GoalStatus::Active && today > goal.end_date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target: u32, period: GoalPeriod, start: NaiveDate, end: NaiveDate) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            goal_type: ActivityKind::Dream,
            target_value: target,
            period,
            start_date: start,
            end_date: end,
            status: GoalStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn daily_window_is_a_single_day() {
        let end = period_end(GoalPeriod::Daily, date(2026, 3, 10), None).unwrap();
        assert_eq!(end, date(2026, 3, 10));
    }

    #[test]
    fn weekly_window_spans_seven_days() {
        let end = period_end(GoalPeriod::Weekly, date(2026, 3, 10), None).unwrap();
        assert_eq!(end, date(2026, 3, 16));
    }

    #[test]
    fn monthly_window_ends_a_month_later() {
        let end = period_end(GoalPeriod::Monthly, date(2026, 3, 10), None).unwrap();
        assert_eq!(end, date(2026, 4, 9));
        // Late January starts clamp into February.
        let end = period_end(GoalPeriod::Monthly, date(2026, 1, 31), None).unwrap();
        assert_eq!(end, date(2026, 2, 27));
    }

    #[test]
    fn custom_window_requires_a_sane_end() {
        let end =
            period_end(GoalPeriod::Custom, date(2026, 3, 1), Some(date(2026, 3, 21))).unwrap();
        assert_eq!(end, date(2026, 3, 21));

        let missing = period_end(GoalPeriod::Custom, date(2026, 3, 1), None).unwrap_err();
        assert!(matches!(missing, CoreError::Validation(_)));

        let backwards =
            period_end(GoalPeriod::Custom, date(2026, 3, 10), Some(date(2026, 3, 1))).unwrap_err();
        assert!(matches!(backwards, CoreError::Validation(_)));
    }

    #[test]
    fn create_rejects_zero_target() {
        let err = create(
            Uuid::new_v4(),
            ActivityKind::Dream,
            0,
            GoalPeriod::Weekly,
            date(2026, 3, 10),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn percentage_counts_up_and_caps_at_100() {
        let g = goal(4, GoalPeriod::Weekly, date(2026, 3, 10), date(2026, 3, 16));
        assert_eq!(progress(&g, 0, date(2026, 3, 10)).percentage, 0);
        assert_eq!(progress(&g, 1, date(2026, 3, 10)).percentage, 25);
        assert_eq!(progress(&g, 4, date(2026, 3, 10)).percentage, 100);
        // Over-achieving never reports more than 100.
        assert_eq!(progress(&g, 9, date(2026, 3, 10)).percentage, 100);
    }

    #[test]
    fn percentage_rounds_to_the_nearest_point() {
        let g = goal(3, GoalPeriod::Weekly, date(2026, 3, 10), date(2026, 3, 16));
        assert_eq!(progress(&g, 1, date(2026, 3, 10)).percentage, 33);
        assert_eq!(progress(&g, 2, date(2026, 3, 10)).percentage, 67);
    }

    #[test]
    fn days_remaining_hits_zero_then_goes_negative() {
        let g = goal(4, GoalPeriod::Weekly, date(2026, 3, 10), date(2026, 3, 16));
        assert_eq!(progress(&g, 0, date(2026, 3, 10)).days_remaining, 6);
        assert_eq!(progress(&g, 0, date(2026, 3, 16)).days_remaining, 0);
        assert_eq!(progress(&g, 0, date(2026, 3, 18)).days_remaining, -2);
    }

    #[test]
    fn on_track_tracks_elapsed_window_time() {
        // Weekly window Mar 10-16: by Mar 13 three of its six days have
        // passed, so half the target is exactly on pace.
        let g = goal(4, GoalPeriod::Weekly, date(2026, 3, 10), date(2026, 3, 16));
        let on_pace = progress(&g, 2, date(2026, 3, 13));
        assert!(on_pace.is_on_track); // 50% done, 50% elapsed

        let lagging = progress(&g, 1, date(2026, 3, 13));
        assert!(!lagging.is_on_track); // 25% done, 50% elapsed

        // Past the window the elapsed fraction pins at 1; only a met target
        // still counts as on track.
        let overdue = progress(&g, 3, date(2026, 3, 20));
        assert!(!overdue.is_on_track);
        let finished = progress(&g, 4, date(2026, 3, 20));
        assert!(finished.is_on_track);
    }

    #[test]
    fn single_day_window_is_elapsed_from_its_start() {
        let g = goal(1, GoalPeriod::Daily, date(2026, 3, 10), date(2026, 3, 10));
        let before = progress(&g, 0, date(2026, 3, 9));
        assert!(before.is_on_track); // nothing elapsed yet

        let on_the_day = progress(&g, 0, date(2026, 3, 10));
        assert!(!on_the_day.is_on_track);

        let done = progress(&g, 1, date(2026, 3, 10));
        assert!(done.is_on_track);
        assert!(done.target_reached);
    }

    #[test]
    fn target_reached_does_not_cap_current_value() {
        let g = goal(3, GoalPeriod::Weekly, date(2026, 3, 10), date(2026, 3, 16));
        let p = progress(&g, 5, date(2026, 3, 12));
        assert!(p.target_reached);
        assert_eq!(p.current_value, 5);
    }

    #[test]
    fn overdue_only_applies_to_active_goals_past_their_window() {
        let mut g = goal(3, GoalPeriod::Weekly, date(2026, 3, 10), date(2026, 3, 16));
        assert!(!is_overdue(&g, date(2026, 3, 16)));
        assert!(is_overdue(&g, date(2026, 3, 17)));

        g.status = GoalStatus::Completed;
        assert!(!is_overdue(&g, date(2026, 3, 17)));
    }
}
