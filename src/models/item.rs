//! Workspace item model: categories, types, statuses, priorities.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::util::truncate_chars;

/// Maximum title length accepted at creation time.
pub const TITLE_MAX_CHARS: usize = 50;

/// Hard cap the workspace enforces on rich-text payloads.
pub const NOTES_MAX_CHARS: usize = 2000;

/// Life-area category. Known labels map to fixed variants; anything else the
/// workspace hands back is preserved verbatim in [`Category::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Fitness, nutrition, sleep, medical.
    Health,
    /// Courses, exams, assignments.
    Study,
    /// Coding projects, side businesses.
    PersonalProjects,
    /// Learning instruments, chess, cooking, drawing.
    Skills,
    /// Content creation, art, music.
    Creative,
    /// Things to buy.
    Shopping,
    /// Random thoughts and possibilities; the default bucket.
    Ideas,
    /// Job and career.
    Work,
    /// Money matters.
    Finance,
    /// Friends, family, events.
    Social,
    /// Everything personal that fits nowhere else.
    Personal,
    /// A label outside the agreed vocabulary, as stored remotely.
    Other(String),
}

impl Category {
    /// Every category in the agreed vocabulary, in prompt order.
    pub const KNOWN: [Category; 11] = [
        Category::Health,
        Category::Study,
        Category::PersonalProjects,
        Category::Skills,
        Category::Creative,
        Category::Shopping,
        Category::Ideas,
        Category::Work,
        Category::Finance,
        Category::Social,
        Category::Personal,
    ];

    /// Workspace label for this category.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Health => "Health",
            Self::Study => "Study",
            Self::PersonalProjects => "Personal Projects",
            Self::Skills => "Skills",
            Self::Creative => "Creative",
            Self::Shopping => "Shopping",
            Self::Ideas => "Ideas",
            Self::Work => "Work",
            Self::Finance => "Finance",
            Self::Social => "Social",
            Self::Personal => "Personal",
            Self::Other(label) => label,
        }
    }

    /// Case-insensitive exact match against the agreed vocabulary.
    #[must_use]
    pub fn parse_known(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::KNOWN
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(needle))
            .cloned()
    }

    /// Normalize a classifier-provided label for item creation.
    ///
    /// Labels outside the vocabulary fall back to [`Category::Ideas`].
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse_known).unwrap_or(Self::Ideas)
    }

    /// Interpret a label read back from the workspace.
    #[must_use]
    pub fn from_store(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Ideas,
            Some(label) => {
                Self::parse_known(label).unwrap_or_else(|| Self::Other(label.to_owned()))
            }
        }
    }

    /// Whether `label` names this category (case-insensitive, whole label).
    #[must_use]
    pub fn matches_label(&self, label: &str) -> bool {
        self.label().eq_ignore_ascii_case(label.trim())
    }

    /// Emoji shown next to habits of this category.
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Health => "💪",
            Self::Study => "📚",
            Self::Work => "💼",
            Self::Ideas => "💡",
            Self::Shopping => "🛒",
            Self::Skills => "🎯",
            Self::Finance => "💰",
            Self::Social => "👥",
            Self::Personal => "🌟",
            Self::PersonalProjects | Self::Creative | Self::Other(_) => "🔁",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What kind of work unit an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    /// Something to do.
    Task,
    /// Something to achieve.
    Goal,
    /// Something to consider.
    Idea,
    /// Useful information or reference.
    Resource,
}

impl ItemType {
    /// Workspace label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Goal => "Goal",
            Self::Idea => "Idea",
            Self::Resource => "Resource",
        }
    }

    /// Case-insensitive parse.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Self::Task),
            "goal" => Some(Self::Goal),
            "idea" => Some(Self::Idea),
            "resource" => Some(Self::Resource),
            _ => None,
        }
    }
}

/// Item lifecycle status.
///
/// Status is an open-ended tag in the workspace, so unrecognized values are
/// kept in [`ItemStatus::Unknown`] and count as active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Being worked on.
    Active,
    /// Finished.
    Done,
    /// Synonym of `Done` some workspaces use.
    Completed,
    /// Deferred.
    Parked,
    /// Abandoned.
    Dropped,
    /// Archived.
    Archived,
    /// Any other label, including misspellings.
    Unknown(String),
}

impl ItemStatus {
    /// Workspace label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Done => "Done",
            Self::Completed => "Completed",
            Self::Parked => "Parked",
            Self::Dropped => "Dropped",
            Self::Archived => "Archived",
            Self::Unknown(label) => label,
        }
    }

    /// Interpret a stored label; absence means active.
    #[must_use]
    pub fn from_store(raw: Option<&str>) -> Self {
        let Some(label) = raw else {
            return Self::Active;
        };
        match label.trim().to_lowercase().as_str() {
            "active" => Self::Active,
            "done" => Self::Done,
            "completed" => Self::Completed,
            "parked" => Self::Parked,
            "dropped" => Self::Dropped,
            "archived" => Self::Archived,
            _ => Self::Unknown(label.to_owned()),
        }
    }

    /// Active means anything other than done, completed or archived.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Done | Self::Completed | Self::Archived)
    }

    /// Finished (but not archived).
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done | Self::Completed)
    }
}

/// Urgency/importance rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Deadlines, health issues, critical tasks.
    High,
    /// Projects, skill development.
    Medium,
    /// Ideas, shopping, exploration.
    Low,
}

impl Priority {
    /// Workspace label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Case-insensitive parse.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Sort rank: High first. Missing priorities sort after Low.
    #[must_use]
    pub fn rank(priority: Option<Self>) -> u8 {
        match priority {
            Some(Self::High) => 0,
            Some(Self::Medium) => 1,
            Some(Self::Low) => 2,
            None => 3,
        }
    }

    /// Traffic-light marker used in list rendering.
    #[must_use]
    pub fn marker(priority: Option<Self>) -> &'static str {
        match priority {
            Some(Self::High) => "🔴",
            Some(Self::Medium) => "🟡",
            Some(Self::Low) => "🟢",
            None => "⚪",
        }
    }
}

/// Due date: either a calendar day or an exact instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DueDate {
    /// Date without a time of day.
    Day(NaiveDate),
    /// Exact instant.
    At(DateTime<Utc>),
}

impl DueDate {
    /// Parse the formats the workspace and the classifier emit: RFC 3339,
    /// naive `YYYY-MM-DDTHH:MM[:SS]` (read in `offset`), or `YYYY-MM-DD`.
    #[must_use]
    pub fn parse(raw: &str, offset: FixedOffset) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::At(instant.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return offset
                    .from_local_datetime(&naive)
                    .single()
                    .map(|local| Self::At(local.with_timezone(&Utc)));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(Self::Day)
    }

    /// The instant this due date refers to: midnight in `offset` for
    /// date-only values.
    #[must_use]
    pub fn instant(self, offset: FixedOffset) -> DateTime<Utc> {
        match self {
            Self::At(instant) => instant,
            Self::Day(day) => offset
                .from_local_datetime(&day.and_time(chrono::NaiveTime::MIN))
                .single()
                .map_or_else(
                    || day.and_time(chrono::NaiveTime::MIN).and_utc(),
                    |local| local.with_timezone(&Utc),
                ),
        }
    }

    /// Serialized form written back to the workspace.
    #[must_use]
    pub fn to_store_string(self) -> String {
        match self {
            Self::Day(day) => day.format("%Y-%m-%d").to_string(),
            Self::At(instant) => instant.to_rfc3339(),
        }
    }
}

/// A persisted task/goal/idea/resource record, normalized from the
/// workspace's property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque workspace identifier.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Life-area category.
    pub category: Category,
    /// Work-unit kind, when set.
    pub item_type: Option<ItemType>,
    /// Lifecycle status; absent in the store means active.
    pub status: ItemStatus,
    /// Priority, when set.
    pub priority: Option<Priority>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Explicit due date.
    pub due: Option<DueDate>,
    /// Associated external file.
    pub attachment_url: Option<String>,
    /// Last modification reported by the workspace.
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Whether this item counts as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Payload for creating a new item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    /// Title, truncated to [`TITLE_MAX_CHARS`].
    pub title: String,
    /// Category from the agreed vocabulary.
    pub category: Category,
    /// Work-unit kind.
    pub item_type: ItemType,
    /// Priority.
    pub priority: Priority,
    /// Notes, truncated to [`NOTES_MAX_CHARS`].
    pub notes: String,
    /// Due date, only when the user stated one.
    pub due: Option<DueDate>,
    /// External file URL.
    pub attachment_url: Option<String>,
}

impl NewItem {
    /// Build a creation payload, enforcing the title and notes caps.
    #[must_use]
    pub fn new(
        title: &str,
        category: Category,
        item_type: ItemType,
        priority: Priority,
        notes: &str,
    ) -> Self {
        let category = match category {
            Category::Other(_) => Category::Ideas,
            known => known,
        };
        let title = truncate_chars(title.trim(), TITLE_MAX_CHARS);
        Self {
            title: if title.is_empty() {
                "Untitled".into()
            } else {
                title
            },
            category,
            item_type,
            priority,
            notes: truncate_chars(notes, NOTES_MAX_CHARS),
            due: None,
            attachment_url: None,
        }
    }

    /// Attach a due date.
    #[must_use]
    pub fn with_due(mut self, due: Option<DueDate>) -> Self {
        self.due = due;
        self
    }

    /// Attach an external file URL.
    #[must_use]
    pub fn with_attachment(mut self, url: Option<String>) -> Self {
        self.attachment_url = url;
        self
    }
}

/// Partial update applied to an existing item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// New priority.
    pub priority: Option<Priority>,
    /// New status.
    pub status: Option<ItemStatus>,
    /// New category.
    pub category: Option<Category>,
}

impl ItemUpdate {
    /// Update that only changes status.
    #[must_use]
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Update that only changes priority.
    #[must_use]
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    /// True when nothing would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.status.is_none() && self.category.is_none()
    }
}

/// Urgency band of an upcoming deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineBand {
    /// Past due by this many whole hours.
    Overdue {
        /// Hours past the deadline.
        hours: i64,
    },
    /// Due within a day.
    Hours(i64),
    /// Due in this many days.
    Days(i64),
}

/// An active item with a deadline, as shown in the deadline view.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadlineView {
    /// Item identifier.
    pub item_id: String,
    /// Item title.
    pub title: String,
    /// The deadline itself.
    pub due: DueDate,
    /// Whole days remaining, floored (negative when overdue).
    pub days_left: i64,
    /// Urgency band.
    pub band: DeadlineBand,
}

/// An item finished today, as shown in the daily summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionView {
    /// Item identifier.
    pub item_id: String,
    /// Item title.
    pub title: String,
    /// Item category.
    pub category: Category,
    /// When the workspace last saw it modified.
    pub completed_at: DateTime<Utc>,
}
