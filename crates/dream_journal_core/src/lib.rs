pub mod achievements;
pub mod domain;
pub mod engine;
pub mod error;
pub mod goals;
pub mod levels;
pub mod ports;
pub mod scoring;
pub mod streaks;

pub use domain::{
    ActivityDetails, ActivityEntry, ActivityKind, ActivityTotals, DreamInterpretation, Goal,
    GoalPeriod, GoalStatus, SleepSample, Streak, StreakKind, TagCount, UserStats,
};
pub use engine::{
    ActivityOutcome, GoalOutcome, GoalWithProgress, JournalEngine, StatsOverview, StreakOverview,
    SubmitActivity, SubmitGoal, SweepReport,
};
pub use error::{CoreError, CoreResult};
pub use ports::{ActivityStore, DreamInterpreter, ProgressStore};
