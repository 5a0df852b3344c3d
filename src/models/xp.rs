//! XP record and level table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-user gamification counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpRecord {
    /// Accumulated XP.
    pub total_xp: u64,
    /// Consecutive active days.
    pub streak_days: u32,
    /// Calendar day (reference offset) of the last award.
    pub last_action_date: Option<NaiveDate>,
}

/// Level thresholds, titles and badges in ascending order.
pub const LEVELS: [(u64, &str, &str); 8] = [
    (0, "Seedling", "🌱"),
    (50, "Sprout", "🌿"),
    (150, "Sapling", "🌳"),
    (350, "Tree", "🌲"),
    (600, "Mountain", "⛰️"),
    (1000, "Star", "⭐"),
    (2000, "Superstar", "🌟"),
    (5000, "Legend", "👑"),
];

/// Derived level information for an XP total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    /// 1-based level number.
    pub number: u32,
    /// Tier title.
    pub title: &'static str,
    /// Tier badge.
    pub badge: &'static str,
    /// Fraction of the way to the next tier in `[0, 1]`; 1.0 at the top tier.
    pub progress: f64,
    /// XP still needed for the next tier, `None` at the top tier.
    pub xp_to_next: Option<u64>,
}

impl Level {
    /// Derive the level for `xp`.
    #[must_use]
    pub fn for_xp(xp: u64) -> Self {
        let index = LEVELS
            .iter()
            .rposition(|(threshold, _, _)| *threshold <= xp)
            .unwrap_or(0);
        let (threshold, title, badge) = LEVELS[index];
        let (progress, xp_to_next) = match LEVELS.get(index + 1) {
            Some((next, _, _)) => {
                #[allow(clippy::cast_precision_loss)]
                let fraction = (xp - threshold) as f64 / (next - threshold) as f64;
                (fraction.clamp(0.0, 1.0), Some(next - xp))
            }
            None => (1.0, None),
        };
        Self {
            number: u32::try_from(index + 1).unwrap_or(u32::MAX),
            title,
            badge,
            progress,
            xp_to_next,
        }
    }
}
