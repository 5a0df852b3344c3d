//! Typed classifier outputs.
//!
//! The language model answers in loosely-shaped JSON; these are the closed
//! shapes the resolver matches on.

use serde::{Deserialize, Serialize};

use crate::models::habit::NewHabit;
use crate::models::item::{Category, DueDate, ItemType, Priority, TITLE_MAX_CHARS};
use crate::util::truncate_chars;

/// Structured categorization of a new piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    /// Life-area category.
    pub category: Category,
    /// Work-unit kind.
    pub item_type: ItemType,
    /// Priority.
    pub priority: Priority,
    /// Short title, at most 50 characters.
    pub title: String,
    /// One-line summary.
    pub summary: String,
    /// Suggested next step.
    pub suggested_action: Option<String>,
    /// Due date, only when the user stated one.
    pub due: Option<DueDate>,
}

impl Categorization {
    /// Deterministic fallback used whenever classification fails.
    #[must_use]
    pub fn fallback(text: &str) -> Self {
        Self {
            category: Category::Ideas,
            item_type: ItemType::Idea,
            priority: Priority::Low,
            title: truncate_chars(text.trim(), TITLE_MAX_CHARS),
            summary: text.to_owned(),
            suggested_action: None,
            due: None,
        }
    }
}

/// Instruction to act on existing items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementIntent {
    /// Not a management instruction.
    None,
    /// List active items, optionally scoped to one category.
    Query {
        /// Category label, matched case-insensitively and exactly.
        category: Option<String>,
    },
    /// Archive an item.
    Delete {
        /// Free-text reference to the item.
        target: String,
    },
    /// Mark an item done.
    Complete {
        /// Free-text reference to the item.
        target: String,
    },
    /// Change an item's priority.
    UpdatePriority {
        /// Free-text reference to the item.
        target: String,
        /// New priority, when the classifier extracted one.
        new_priority: Option<Priority>,
    },
}

impl ManagementIntent {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Query { .. } => "query",
            Self::Delete { .. } => "delete",
            Self::Complete { .. } => "complete",
            Self::UpdatePriority { .. } => "update_priority",
        }
    }
}

/// Instruction concerning habits.
#[derive(Debug, Clone, PartialEq)]
pub enum HabitIntent {
    /// Not a habit instruction.
    None,
    /// Start tracking a new habit.
    Create(NewHabit),
    /// Record a completion of an existing habit.
    Complete {
        /// Free-text habit name.
        name: String,
    },
}

/// Vision analysis of a photo.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnalysis {
    /// What the picture shows.
    pub description: String,
    /// Life-area category.
    pub category: Category,
    /// Short title.
    pub suggested_title: String,
    /// Priority.
    pub priority: Priority,
    /// Suggested next step.
    pub suggested_action: Option<String>,
}

impl ImageAnalysis {
    /// Static placeholder when both vision and caption classification fail.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            description: "Image received".into(),
            category: Category::Ideas,
            suggested_title: "Image".into(),
            priority: Priority::Low,
            suggested_action: Some("Review this image".into()),
        }
    }

    /// Build an analysis from a caption-only categorization.
    #[must_use]
    pub fn from_caption(categorization: Categorization) -> Self {
        Self {
            description: categorization.summary,
            category: categorization.category,
            suggested_title: categorization.title,
            priority: categorization.priority,
            suggested_action: categorization.suggested_action,
        }
    }
}

/// Confidence label attached to a semantic match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Weakest.
    Low,
    /// Middling.
    Medium,
    /// Strongest.
    High,
}

impl MatchConfidence {
    /// Case-insensitive parse; unknown labels read as `Low`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// One candidate chosen by the semantic matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateMatch {
    /// Zero-based position in the candidate list.
    pub index: usize,
    /// How sure the matcher claims to be.
    pub confidence: MatchConfidence,
}
