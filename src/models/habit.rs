//! Recurring habit model.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::local_date;
use crate::models::item::Category;

/// How often a habit is expected to be done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Once a day.
    Daily,
    /// Twice a day.
    TwiceDaily,
    /// Once a week.
    Weekly,
    /// Once a month.
    Monthly,
}

impl Frequency {
    /// Workspace label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::TwiceDaily => "Twice Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }

    /// Case-insensitive parse; accepts `twice daily` and `twice_daily`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', " ").as_str() {
            "daily" => Some(Self::Daily),
            "twice daily" => Some(Self::TwiceDaily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Part of the day a habit is scheduled for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    /// Morning.
    Morning,
    /// Afternoon.
    Afternoon,
    /// Evening.
    Evening,
}

impl DayPart {
    /// Workspace label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }

    /// Case-insensitive parse.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

/// A persisted recurring habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Opaque workspace identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Expected cadence.
    pub frequency: Frequency,
    /// Life-area category.
    pub category: Category,
    /// XP granted per completion.
    pub xp_reward: u32,
    /// Whether the habit is still tracked.
    pub active: bool,
    /// Scheduled day parts; empty means any time.
    pub times: Vec<DayPart>,
    /// Most recent completion.
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl Habit {
    /// Whether the last completion falls on `today` in the reference offset.
    #[must_use]
    pub fn completed_on(&self, today: NaiveDate, offset: FixedOffset) -> bool {
        self.last_completed_at
            .is_some_and(|at| local_date(at, offset) == today)
    }

    /// Whether this habit is due in `part`. Habits without times match any.
    #[must_use]
    pub fn scheduled_for(&self, part: DayPart) -> bool {
        self.times.is_empty() || self.times.contains(&part)
    }

    /// Fuzzy name match: case-insensitive substring in either direction.
    #[must_use]
    pub fn name_matches(&self, query: &str) -> bool {
        let name = self.name.to_lowercase();
        let query = query.trim().to_lowercase();
        !query.is_empty() && (name.contains(&query) || query.contains(&name))
    }
}

/// Payload for creating a habit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabit {
    /// Display name.
    pub name: String,
    /// Expected cadence.
    pub frequency: Frequency,
    /// Life-area category.
    pub category: Category,
    /// Scheduled day parts.
    pub times: Vec<DayPart>,
    /// XP per completion; `None` uses the configured default.
    pub xp_reward: Option<u32>,
}
