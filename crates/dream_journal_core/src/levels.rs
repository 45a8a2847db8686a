//! crates/dream_journal_core/src/levels.rs
//!
//! The experience curve. Levels are a fixed table so the progression can be
//! tuned in one place; lookups are a linear scan over a dozen entries.

use serde::Serialize;

/// One rung of the progression ladder.
#[derive(Debug, Clone, Copy)]
pub struct LevelDef {
    pub level: u32,
    /// Total lifetime XP required to hold this level.
    pub xp_required: u64,
    pub title: &'static str,
}

/// Thresholds are strictly increasing; `level_for_xp` depends on that.
static LEVELS: &[LevelDef] = &[
    LevelDef { level: 1, xp_required: 0, title: "Drowsy Novice" },
    LevelDef { level: 2, xp_required: 100, title: "Dozing Dabbler" },
    LevelDef { level: 3, xp_required: 250, title: "Night Drifter" },
    LevelDef { level: 4, xp_required: 500, title: "Moonlit Rambler" },
    LevelDef { level: 5, xp_required: 900, title: "Sleep Scholar" },
    LevelDef { level: 6, xp_required: 1_400, title: "Dream Chronicler" },
    LevelDef { level: 7, xp_required: 2_100, title: "Twilight Wanderer" },
    LevelDef { level: 8, xp_required: 3_000, title: "Lucid Apprentice" },
    LevelDef { level: 9, xp_required: 4_200, title: "Oneironaut" },
    LevelDef { level: 10, xp_required: 5_800, title: "Dream Weaver" },
    LevelDef { level: 11, xp_required: 7_800, title: "Lucid Master" },
    LevelDef { level: 12, xp_required: 10_500, title: "Dream Oracle" },
];

/// The level a lifetime XP total lands on.
pub fn level_for_xp(total_xp: u64) -> &'static LevelDef {
    LEVELS
        .iter()
        .rev()
        .find(|def| total_xp >= def.xp_required)
        .unwrap_or(&LEVELS[0])
}

fn next_level(current: &LevelDef) -> Option<&'static LevelDef> {
    LEVELS.iter().find(|def| def.level == current.level + 1)
}

/// Where a user sits on the curve, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: String,
    pub total_xp: u64,
    /// XP earned past the current level's threshold.
    pub xp_into_level: u64,
    /// XP still needed for the next level; absent at the top of the table.
    pub xp_to_next_level: Option<u64>,
    /// How far through the current level, 0-100. Pinned to 100 at the cap.
    pub progress_percentage: u8,
}

pub fn level_info(total_xp: u64) -> LevelInfo {
    let current = level_for_xp(total_xp);
    let xp_into_level = total_xp - current.xp_required;

    let (xp_to_next_level, progress_percentage) = match next_level(current) {
        Some(next) => {
            let span = next.xp_required - current.xp_required;
            let pct = ((xp_into_level * 100) / span).min(100) as u8;
            (Some(next.xp_required - total_xp), pct)
        }
        None => (None, 100),
    };

    LevelInfo {
        level: current.level,
        title: current.title.to_string(),
        total_xp,
        xp_into_level,
        xp_to_next_level,
        progress_percentage,
    }
}

/// A crossing of one or more level thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct LevelUp {
    pub from_level: u32,
    pub to_level: u32,
    pub new_title: String,
}

/// Compare lifetime XP before and after an award. Awards are additive, so a
/// level can only ever be gained here, never lost.
pub fn detect_level_up(old_xp: u64, new_xp: u64) -> Option<LevelUp> {
    let before = level_for_xp(old_xp);
    let after = level_for_xp(new_xp);
    if after.level > before.level {
        Some(LevelUp {
            from_level: before.level,
            to_level: after.level,
            new_title: after.title.to_string(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_strictly_increasing() {
        for pair in LEVELS.windows(2) {
            assert!(pair[1].xp_required > pair[0].xp_required);
            assert_eq!(pair[1].level, pair[0].level + 1);
        }
        assert_eq!(LEVELS[0].xp_required, 0);
    }

    #[test]
    fn zero_xp_is_level_one() {
        let info = level_info(0);
        assert_eq!(info.level, 1);
        assert_eq!(info.xp_into_level, 0);
        assert_eq!(info.xp_to_next_level, Some(100));
        assert_eq!(info.progress_percentage, 0);
    }

    #[test]
    fn exact_threshold_lands_on_the_new_level() {
        assert_eq!(level_for_xp(99).level, 1);
        assert_eq!(level_for_xp(100).level, 2);
        assert_eq!(level_for_xp(101).level, 2);
    }

    #[test]
    fn info_meters_progress_within_a_level() {
        // Level 2 spans 100..250.
        let info = level_info(175);
        assert_eq!(info.level, 2);
        assert_eq!(info.xp_into_level, 75);
        assert_eq!(info.xp_to_next_level, Some(75));
        assert_eq!(info.progress_percentage, 50);
    }

    #[test]
    fn top_of_the_table_is_pinned() {
        let info = level_info(999_999);
        assert_eq!(info.level, 12);
        assert_eq!(info.xp_to_next_level, None);
        assert_eq!(info.progress_percentage, 100);
    }

    #[test]
    fn level_never_decreases_as_xp_grows() {
        let mut last = 0;
        for xp in (0..12_000).step_by(25) {
            let level = level_for_xp(xp).level;
            assert!(level >= last);
            last = level;
        }
        assert_eq!(last, 12);
    }

    #[test]
    fn detects_single_and_multi_level_jumps() {
        assert!(detect_level_up(50, 90).is_none());

        let single = detect_level_up(90, 110).unwrap();
        assert_eq!(single.from_level, 1);
        assert_eq!(single.to_level, 2);
        assert_eq!(single.new_title, "Dozing Dabbler");

        let jump = detect_level_up(0, 600).unwrap();
        assert_eq!(jump.to_level, 4);
    }
}
