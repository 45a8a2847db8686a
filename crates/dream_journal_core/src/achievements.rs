//! crates/dream_journal_core/src/achievements.rs
//!
//! The achievement catalog and its evaluator. The catalog is a static table;
//! criteria read the recomputed [`UserStats`] snapshot. Unlock persistence is
//! the store's problem; re-evaluating against an already-unlocked set is
//! always safe.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ActivityKind, StreakKind, UserStats};

/// Stable identifiers for every achievement. The string form is what gets
/// persisted, so variants can be reordered but never renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstDream,
    DreamCollector,
    DreamArchivist,
    KeeperOfTheDeep,
    DearDiary,
    CheckingIn,
    CountingSheep,
    ThreeNightsRunning,
    WeekOfWonders,
    LunarCycle,
    SteadyHabits,
    RitualKeeper,
    EmotionalCompass,
    WideAwakeInside,
    ArchitectOfDreams,
    SeekingMeaning,
    WellRested,
    FlawlessSlumber,
    HundredPages,
    YearOfDreams,
}

impl AchievementId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementId::FirstDream => "first_dream",
            AchievementId::DreamCollector => "dream_collector",
            AchievementId::DreamArchivist => "dream_archivist",
            AchievementId::KeeperOfTheDeep => "keeper_of_the_deep",
            AchievementId::DearDiary => "dear_diary",
            AchievementId::CheckingIn => "checking_in",
            AchievementId::CountingSheep => "counting_sheep",
            AchievementId::ThreeNightsRunning => "three_nights_running",
            AchievementId::WeekOfWonders => "week_of_wonders",
            AchievementId::LunarCycle => "lunar_cycle",
            AchievementId::SteadyHabits => "steady_habits",
            AchievementId::RitualKeeper => "ritual_keeper",
            AchievementId::EmotionalCompass => "emotional_compass",
            AchievementId::WideAwakeInside => "wide_awake_inside",
            AchievementId::ArchitectOfDreams => "architect_of_dreams",
            AchievementId::SeekingMeaning => "seeking_meaning",
            AchievementId::WellRested => "well_rested",
            AchievementId::FlawlessSlumber => "flawless_slumber",
            AchievementId::HundredPages => "hundred_pages",
            AchievementId::YearOfDreams => "year_of_dreams",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); `None` for ids this build does
    /// not know, e.g. rows written by a newer deployment.
    pub fn parse(s: &str) -> Option<Self> {
        CATALOG.iter().map(|def| def.id).find(|id| id.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Legendary,
}

impl AchievementTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementTier::Bronze => "bronze",
            AchievementTier::Silver => "silver",
            AchievementTier::Gold => "gold",
            AchievementTier::Platinum => "platinum",
            AchievementTier::Legendary => "legendary",
        }
    }
}

/// What has to be true of a user's stats for the achievement to unlock.
#[derive(Debug, Clone, Copy)]
pub enum Criteria {
    /// At least `count` entries of one activity kind.
    EntryCount { kind: ActivityKind, count: u64 },
    /// At least `count` entries across all kinds.
    TotalEntries { count: u64 },
    /// The named streak currently at `length` consecutive days. Unlocks land
    /// the moment a streak reaches the mark, since evaluation runs on every
    /// submission; once earned they persist through later resets.
    StreakLength { kind: StreakKind, length: u32 },
    LucidDreams { count: u64 },
    Interpretations { count: u64 },
    SleepScoreAtLeast { score: u8 },
}

impl Criteria {
    fn met(&self, stats: &UserStats) -> bool {
        match *self {
            Criteria::EntryCount { kind, count } => stats.count(kind) >= count,
            Criteria::TotalEntries { count } => stats.total_entries() >= count,
            Criteria::StreakLength { kind, length } => stats.streak(kind) >= length,
            Criteria::LucidDreams { count } => stats.lucid_dream_count >= count,
            Criteria::Interpretations { count } => stats.interpretation_count >= count,
            Criteria::SleepScoreAtLeast { score } => {
                stats.best_sleep_score.is_some_and(|best| best >= score)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub tier: AchievementTier,
    pub criteria: Criteria,
    pub xp_reward: u64,
    /// Hidden achievements are kept out of catalog listings until unlocked.
    pub hidden: bool,
}

pub static CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: AchievementId::FirstDream,
        name: "First Light",
        description: "Record your first dream",
        tier: AchievementTier::Bronze,
        criteria: Criteria::EntryCount { kind: ActivityKind::Dream, count: 1 },
        xp_reward: 25,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::DreamCollector,
        name: "Dream Collector",
        description: "Record ten dreams",
        tier: AchievementTier::Silver,
        criteria: Criteria::EntryCount { kind: ActivityKind::Dream, count: 10 },
        xp_reward: 50,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::DreamArchivist,
        name: "Dream Archivist",
        description: "Record fifty dreams",
        tier: AchievementTier::Gold,
        criteria: Criteria::EntryCount { kind: ActivityKind::Dream, count: 50 },
        xp_reward: 100,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::KeeperOfTheDeep,
        name: "Keeper of the Deep",
        description: "Record one hundred dreams",
        tier: AchievementTier::Platinum,
        criteria: Criteria::EntryCount { kind: ActivityKind::Dream, count: 100 },
        xp_reward: 200,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::DearDiary,
        name: "Dear Diary",
        description: "Write your first journal entry",
        tier: AchievementTier::Bronze,
        criteria: Criteria::EntryCount { kind: ActivityKind::Journal, count: 1 },
        xp_reward: 25,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::CheckingIn,
        name: "Checking In",
        description: "Log your first mood",
        tier: AchievementTier::Bronze,
        criteria: Criteria::EntryCount { kind: ActivityKind::Mood, count: 1 },
        xp_reward: 25,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::CountingSheep,
        name: "Counting Sheep",
        description: "Log your first night of sleep",
        tier: AchievementTier::Bronze,
        criteria: Criteria::EntryCount { kind: ActivityKind::Sleep, count: 1 },
        xp_reward: 25,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::ThreeNightsRunning,
        name: "Three Nights Running",
        description: "Reach a three-day dream streak",
        tier: AchievementTier::Bronze,
        criteria: Criteria::StreakLength { kind: StreakKind::Dream, length: 3 },
        xp_reward: 30,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::WeekOfWonders,
        name: "Week of Wonders",
        description: "Reach a seven-day dream streak",
        tier: AchievementTier::Silver,
        criteria: Criteria::StreakLength { kind: StreakKind::Dream, length: 7 },
        xp_reward: 75,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::LunarCycle,
        name: "Lunar Cycle",
        description: "Reach a thirty-day dream streak",
        tier: AchievementTier::Gold,
        criteria: Criteria::StreakLength { kind: StreakKind::Dream, length: 30 },
        xp_reward: 200,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::SteadyHabits,
        name: "Steady Habits",
        description: "Reach a seven-day wellness streak",
        tier: AchievementTier::Silver,
        criteria: Criteria::StreakLength { kind: StreakKind::Wellness, length: 7 },
        xp_reward: 75,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::RitualKeeper,
        name: "Ritual Keeper",
        description: "Reach a thirty-day wellness streak",
        tier: AchievementTier::Gold,
        criteria: Criteria::StreakLength { kind: StreakKind::Wellness, length: 30 },
        xp_reward: 200,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::EmotionalCompass,
        name: "Emotional Compass",
        description: "Reach a seven-day mood streak",
        tier: AchievementTier::Silver,
        criteria: Criteria::StreakLength { kind: StreakKind::Mood, length: 7 },
        xp_reward: 75,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::WideAwakeInside,
        name: "Wide Awake Inside",
        description: "Record five lucid dreams",
        tier: AchievementTier::Silver,
        criteria: Criteria::LucidDreams { count: 5 },
        xp_reward: 100,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::ArchitectOfDreams,
        name: "Architect of Dreams",
        description: "Record twenty lucid dreams",
        tier: AchievementTier::Platinum,
        criteria: Criteria::LucidDreams { count: 20 },
        xp_reward: 250,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::SeekingMeaning,
        name: "Seeking Meaning",
        description: "Request your first dream interpretation",
        tier: AchievementTier::Bronze,
        criteria: Criteria::Interpretations { count: 1 },
        xp_reward: 25,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::WellRested,
        name: "Well Rested",
        description: "Score 90 or better on a night of sleep",
        tier: AchievementTier::Silver,
        criteria: Criteria::SleepScoreAtLeast { score: 90 },
        xp_reward: 75,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::FlawlessSlumber,
        name: "Flawless Slumber",
        description: "Score a perfect 100 on a night of sleep",
        tier: AchievementTier::Legendary,
        criteria: Criteria::SleepScoreAtLeast { score: 100 },
        xp_reward: 500,
        hidden: true,
    },
    AchievementDef {
        id: AchievementId::HundredPages,
        name: "Hundred Pages",
        description: "Record one hundred entries of any kind",
        tier: AchievementTier::Gold,
        criteria: Criteria::TotalEntries { count: 100 },
        xp_reward: 150,
        hidden: false,
    },
    AchievementDef {
        id: AchievementId::YearOfDreams,
        name: "Year of Dreams",
        description: "Reach a 365-day dream streak",
        tier: AchievementTier::Legendary,
        criteria: Criteria::StreakLength { kind: StreakKind::Dream, length: 365 },
        xp_reward: 500,
        hidden: true,
    },
];

/// Catalog row for an id, `None` when the table no longer carries it.
/// Callers skip missing rows rather than guessing at a stand-in.
pub fn definition(id: AchievementId) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.id == id)
}

/// A persisted unlock.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementUnlock {
    pub achievement_id: AchievementId,
    pub unlocked_at: DateTime<Utc>,
}

/// Every catalog entry whose criteria the stats now satisfy and which is not
/// already unlocked. Running this twice with the unlock set updated in
/// between returns nothing the second time.
pub fn evaluate(stats: &UserStats, unlocked: &HashSet<AchievementId>) -> Vec<&'static AchievementDef> {
    CATALOG
        .iter()
        .filter(|def| !unlocked.contains(&def.id) && def.criteria.met(stats))
        .collect()
}
