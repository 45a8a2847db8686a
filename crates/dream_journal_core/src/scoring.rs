//! crates/dream_journal_core/src/scoring.rs
//!
//! Sleep-quality scoring: a pure function from the recorded triple
//! (duration, quality, restfulness) to a 0–100 score and a letter grade.
//! Derived values are recomputed from the inputs wherever they are needed;
//! nothing here reads or writes state.

use serde::Serialize;

use crate::domain::SleepSample;
use crate::error::{CoreError, CoreResult};

/// Letter grade on the S/A/B/C/D/F scale. S is the top band (score ≥ 90).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SleepGrade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl SleepGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

/// The derived pair for a sleep sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SleepScore {
    pub score: u8,
    pub grade: SleepGrade,
}

/// Score a sleep sample.
///
/// Weighted sum of three parts:
/// - duration sub-score (0–40): 7–9h is the optimal band;
/// - quality sub-score (0–40): linear in the 1–5 rating;
/// - restfulness sub-score (0–20): linear in the 1–5 rating.
///
/// Ratings outside 1–5 or a duration outside 0–24h are rejected rather than
/// clamped, so a bad client payload cannot quietly produce a plausible score.
pub fn score_sleep(sample: &SleepSample) -> CoreResult<SleepScore> {
    validate_sample(sample)?;

    let duration_points = duration_subscore(sample.duration_hours);
    let quality_points = f64::from(sample.quality_rating) / 5.0 * 40.0;
    let restfulness_points = f64::from(sample.restfulness_rating) / 5.0 * 20.0;

    let total = (duration_points + quality_points + restfulness_points).round();
    let score = total.clamp(0.0, 100.0) as u8;

    Ok(SleepScore {
        score,
        grade: grade_for(score),
    })
}

/// Map a 0–100 score onto the letter scale. Deterministic, monotone step
/// function: a higher score never yields a lower grade.
pub fn grade_for(score: u8) -> SleepGrade {
    match score {
        90..=u8::MAX => SleepGrade::S,
        80..=89 => SleepGrade::A,
        70..=79 => SleepGrade::B,
        60..=69 => SleepGrade::C,
        50..=59 => SleepGrade::D,
        _ => SleepGrade::F,
    }
}

fn duration_subscore(hours: f64) -> f64 {
    if (7.0..=9.0).contains(&hours) {
        40.0
    } else if (6.0..7.0).contains(&hours) {
        30.0
    } else if (5.0..6.0).contains(&hours) {
        20.0
    } else if hours > 9.0 && hours <= 10.0 {
        30.0
    } else {
        10.0
    }
}

fn validate_sample(sample: &SleepSample) -> CoreResult<()> {
    if !sample.duration_hours.is_finite()
        || sample.duration_hours < 0.0
        || sample.duration_hours > 24.0
    {
        return Err(CoreError::Validation(format!(
            "duration_hours must be between 0 and 24, got {}",
            sample.duration_hours
        )));
    }
    if !(1..=5).contains(&sample.quality_rating) {
        return Err(CoreError::Validation(format!(
            "quality_rating must be between 1 and 5, got {}",
            sample.quality_rating
        )));
    }
    if !(1..=5).contains(&sample.restfulness_rating) {
        return Err(CoreError::Validation(format!(
            "restfulness_rating must be between 1 and 5, got {}",
            sample.restfulness_rating
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(duration: f64, quality: u8, restfulness: u8) -> SleepSample {
        SleepSample {
            duration_hours: duration,
            quality_rating: quality,
            restfulness_rating: restfulness,
        }
    }

    #[test]
    fn perfect_night_scores_100() {
        let scored = score_sleep(&sample(8.0, 5, 5)).unwrap();
        assert_eq!(scored.score, 100);
        assert_eq!(scored.grade, SleepGrade::S);
    }

    #[test]
    fn short_rough_night_scores_22() {
        // 10 (under 5h) + 8 (quality 1) + 4 (restfulness 1)
        let scored = score_sleep(&sample(4.0, 1, 1)).unwrap();
        assert_eq!(scored.score, 22);
        assert_eq!(scored.grade, SleepGrade::F);
    }

    #[test]
    fn duration_bands() {
        assert_eq!(duration_subscore(7.0), 40.0);
        assert_eq!(duration_subscore(9.0), 40.0);
        assert_eq!(duration_subscore(6.5), 30.0);
        assert_eq!(duration_subscore(9.5), 30.0);
        assert_eq!(duration_subscore(5.5), 20.0);
        assert_eq!(duration_subscore(4.9), 10.0);
        assert_eq!(duration_subscore(11.0), 10.0);
        assert_eq!(duration_subscore(0.0), 10.0);
    }

    #[test]
    fn score_stays_in_range_over_whole_domain() {
        for quality in 1..=5u8 {
            for restfulness in 1..=5u8 {
                for half_hours in 0..=48 {
                    let duration = f64::from(half_hours) * 0.5;
                    let scored = score_sleep(&sample(duration, quality, restfulness)).unwrap();
                    assert!(scored.score <= 100);
                }
            }
        }
    }

    #[test]
    fn grade_is_monotone_in_score() {
        fn rank(grade: SleepGrade) -> u8 {
            match grade {
                SleepGrade::F => 0,
                SleepGrade::D => 1,
                SleepGrade::C => 2,
                SleepGrade::B => 3,
                SleepGrade::A => 4,
                SleepGrade::S => 5,
            }
        }

        let mut previous = rank(grade_for(0));
        for score in 1..=100u8 {
            let current = rank(grade_for(score));
            assert!(current >= previous, "grade dropped at score {}", score);
            previous = current;
        }
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(grade_for(90), SleepGrade::S);
        assert_eq!(grade_for(89), SleepGrade::A);
        assert_eq!(grade_for(80), SleepGrade::A);
        assert_eq!(grade_for(79), SleepGrade::B);
        assert_eq!(grade_for(69), SleepGrade::C);
        assert_eq!(grade_for(59), SleepGrade::D);
        assert_eq!(grade_for(49), SleepGrade::F);
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        assert!(score_sleep(&sample(8.0, 0, 3)).is_err());
        assert!(score_sleep(&sample(8.0, 6, 3)).is_err());
        assert!(score_sleep(&sample(8.0, 3, 0)).is_err());
        assert!(score_sleep(&sample(-1.0, 3, 3)).is_err());
        assert!(score_sleep(&sample(25.0, 3, 3)).is_err());
        assert!(score_sleep(&sample(f64::NAN, 3, 3)).is_err());
    }
}
