//! XP and streak ledger.
//!
//! The in-memory map is authoritative at runtime. It is mirrored into
//! `SQLite` by [`crate::persistence::snapshot`] on a best-effort basis.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{FixedOffset, NaiveDate};
use tracing::{debug, info};

use crate::clock::{today, Clock};
use crate::models::xp::{Level, XpRecord};

/// Bonus granted whenever the streak sits on a multiple of this many days.
pub const STREAK_BONUS_PERIOD: u32 = 7;

/// Flat bonus for a streak milestone.
pub const STREAK_BONUS_XP: u64 = 50;

/// Result of one award.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Award {
    /// Record after the award.
    pub record: XpRecord,
    /// XP granted on top of the base amount.
    pub streak_bonus: u64,
    /// Level after the award.
    pub level: Level,
    /// Whether this award crossed a level threshold.
    pub leveled_up: bool,
}

/// Per-user XP totals and day-based streaks.
pub struct XpLedger {
    records: Mutex<HashMap<String, XpRecord>>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl XpLedger {
    /// Create an empty ledger evaluating days in `offset`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            offset,
        }
    }

    /// Grant `amount` XP to `user_id`, updating the streak for today.
    pub fn award(&self, user_id: &str, amount: u64, reason: &str) -> Award {
        let day = today(self.clock.as_ref(), self.offset);
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = records.entry(user_id.to_owned()).or_default();

        let before = Level::for_xp(record.total_xp);
        *record = advance_streak(*record, day);
        let streak_bonus =
            if record.streak_days > 0 && record.streak_days % STREAK_BONUS_PERIOD == 0 {
                STREAK_BONUS_XP
            } else {
                0
            };
        record.total_xp = record
            .total_xp
            .saturating_add(amount)
            .saturating_add(streak_bonus);

        let level = Level::for_xp(record.total_xp);
        let leveled_up = level.number > before.number;
        debug!(
            user_id,
            amount,
            streak_bonus,
            reason,
            total_xp = record.total_xp,
            streak_days = record.streak_days,
            "xp awarded"
        );
        if leveled_up {
            info!(
                user_id,
                level = level.number,
                title = level.title,
                "level up"
            );
        }

        Award {
            record: *record,
            streak_bonus,
            level,
            leveled_up,
        }
    }

    /// Current record for `user_id` (zeroed when none exists).
    #[must_use]
    pub fn get(&self, user_id: &str) -> XpRecord {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .copied()
            .unwrap_or_default()
    }

    /// Copy of every record, for durable snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, XpRecord)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(user, record)| (user.clone(), *record))
            .collect()
    }

    /// Seed records loaded at startup. Users already present keep their
    /// runtime values.
    pub fn restore(&self, stored: Vec<(String, XpRecord)>) -> usize {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut restored = 0;
        for (user, record) in stored {
            records.entry(user).or_insert_with(|| {
                restored += 1;
                record
            });
        }
        restored
    }
}

/// Level for an XP total.
#[must_use]
pub fn level(xp: u64) -> Level {
    Level::for_xp(xp)
}

/// Apply the streak rule for an action on `day`.
#[must_use]
pub fn advance_streak(record: XpRecord, day: NaiveDate) -> XpRecord {
    let streak_days = match record.last_action_date {
        None => 1,
        Some(last) => match (day - last).num_days() {
            1 => record.streak_days.saturating_add(1),
            gap if gap >= 2 => 1,
            // Same day, or a clock that moved backwards.
            _ => record.streak_days.max(1),
        },
    };
    XpRecord {
        total_xp: record.total_xp,
        streak_days,
        last_action_date: Some(record.last_action_date.map_or(day, |last| last.max(day))),
    }
}
