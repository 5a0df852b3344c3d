//! Manual-triage (brain dump) entries.

use serde::{Deserialize, Serialize};

/// Longest title the triage database accepts.
pub const TRIAGE_TITLE_MAX_CHARS: usize = 100;

/// Input channel the content arrived through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriageKind {
    /// Typed text.
    Text,
    /// Voice note.
    Voice,
    /// Photo.
    Image,
    /// Any other file.
    Document,
}

impl TriageKind {
    /// Workspace label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Voice => "Voice",
            Self::Image => "Image",
            Self::Document => "Document",
        }
    }

    /// Column value in the local journal.
    #[must_use]
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Image => "image",
            Self::Document => "document",
        }
    }

    /// Parse a journal column value.
    #[must_use]
    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "voice" => Some(Self::Voice),
            "image" => Some(Self::Image),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Content routed to manual review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageEntry {
    /// Short title.
    pub title: String,
    /// Raw content.
    pub content: String,
    /// Input channel.
    pub kind: TriageKind,
    /// Associated file, if any.
    pub file_url: Option<String>,
    /// Why the content ended up here instead of the items database.
    pub failure_note: Option<String>,
}

impl TriageEntry {
    /// Entry for raw content, titled by its first characters.
    #[must_use]
    pub fn new(content: &str, kind: TriageKind) -> Self {
        Self {
            title: crate::util::truncate_chars(content.trim(), TRIAGE_TITLE_MAX_CHARS),
            content: content.to_owned(),
            kind,
            file_url: None,
            failure_note: None,
        }
    }

    /// Override the title.
    #[must_use]
    pub fn titled(mut self, title: &str) -> Self {
        self.title = crate::util::truncate_chars(title.trim(), TRIAGE_TITLE_MAX_CHARS);
        self
    }

    /// Attach a file reference.
    #[must_use]
    pub fn with_file(mut self, url: Option<String>) -> Self {
        self.file_url = url;
        self
    }

    /// Record why the content was not filed normally.
    #[must_use]
    pub fn with_failure(mut self, note: impl Into<String>) -> Self {
        self.failure_note = Some(note.into());
        self
    }
}

/// Where a captured entry ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageOutcome {
    /// Written to the remote triage database.
    Remote(String),
    /// Remote write failed; appended to the local journal.
    Journaled,
    /// Neither store accepted it.
    Lost,
}

impl TriageOutcome {
    /// Whether the content is stored somewhere.
    #[must_use]
    pub fn preserved(&self) -> bool {
        !matches!(self, Self::Lost)
    }
}
