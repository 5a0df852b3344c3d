//! Per-user ephemeral interaction state.
//!
//! Pending delete confirmations, focus sessions, staged focus candidates
//! and list cursors live here, keyed by user id. State transitions are
//! short synchronous critical sections; whole events for one user are
//! serialized with [`SessionStore::lock_user`].

pub mod rate_limit;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use crate::models::item::{Category, Priority};

/// An item awaiting a yes/no delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    /// Item to archive on confirmation.
    pub item_id: String,
    /// Title echoed back to the user.
    pub title: String,
}

/// A task eligible for focus mode, as offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusCandidate {
    /// Item identifier.
    pub item_id: String,
    /// Item title.
    pub title: String,
    /// Item priority.
    pub priority: Option<Priority>,
    /// Item category.
    pub category: Category,
}

/// A running focus session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSession {
    /// Item being focused on.
    pub item_id: String,
    /// Its title.
    pub title: String,
    /// Its category, for the progress log.
    pub category: Category,
    /// Raw texts received while focused, in arrival order.
    pub backlog: Vec<String>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
}

impl FocusSession {
    /// Start a session on `candidate`.
    #[must_use]
    pub fn new(candidate: FocusCandidate, started_at: DateTime<Utc>) -> Self {
        Self {
            item_id: candidate.item_id,
            title: candidate.title,
            category: candidate.category,
            backlog: Vec::new(),
            started_at,
        }
    }
}

/// Which paginated list a cursor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// The grouped active-items list.
    Active,
    /// Results of a natural-language query.
    Query,
}

impl ListKind {
    /// Button value naming this list.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Query => "query",
        }
    }

    /// Parse a button value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "query" => Some(Self::Query),
            _ => None,
        }
    }
}

/// Remaining lines of a rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCursor {
    /// Which list.
    pub kind: ListKind,
    /// Pre-rendered lines.
    pub lines: Vec<String>,
    /// First line not yet shown.
    pub offset: usize,
}

/// One page taken from a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// Lines on this page.
    pub lines: Vec<String>,
    /// Whether more lines remain.
    pub has_more: bool,
}

impl ListCursor {
    /// Cursor at the start of `lines`.
    #[must_use]
    pub fn new(kind: ListKind, lines: Vec<String>) -> Self {
        Self {
            kind,
            lines,
            offset: 0,
        }
    }

    /// Take the next `page_size` lines.
    pub fn advance(&mut self, page_size: usize) -> ListPage {
        let end = self.offset.saturating_add(page_size).min(self.lines.len());
        let lines = self.lines[self.offset.min(end)..end].to_vec();
        self.offset = end;
        ListPage {
            lines,
            has_more: self.offset < self.lines.len(),
        }
    }

    /// Whether every line has been shown.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.offset >= self.lines.len()
    }
}

#[derive(Debug, Default)]
struct UserSession {
    pending_delete: Option<PendingDelete>,
    focus: Option<FocusSession>,
    focus_candidates: Vec<FocusCandidate>,
    cursors: HashMap<ListKind, ListCursor>,
}

impl UserSession {
    fn is_empty(&self) -> bool {
        self.pending_delete.is_none()
            && self.focus.is_none()
            && self.focus_candidates.is_empty()
            && self.cursors.is_empty()
    }
}

/// In-memory per-user state store.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, UserSession>>,
    request_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize event handling for `user_id`: hold the guard for the whole
    /// event so overlapping events cannot interleave state transitions.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .request_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user_id.to_owned()).or_default())
        };
        lock.lock_owned().await
    }

    fn with<R>(&self, user_id: &str, f: impl FnOnce(&mut UserSession) -> R) -> R {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.entry(user_id.to_owned()).or_default();
        let result = f(session);
        if session.is_empty() {
            sessions.remove(user_id);
        }
        result
    }

    /// Stage a delete confirmation, replacing any earlier one.
    pub fn set_pending_delete(&self, user_id: &str, pending: PendingDelete) {
        self.with(user_id, |s| s.pending_delete = Some(pending));
    }

    /// Remove and return the pending confirmation.
    pub fn consume_pending_delete(&self, user_id: &str) -> Option<PendingDelete> {
        self.with(user_id, |s| s.pending_delete.take())
    }

    /// Whether a confirmation is pending.
    #[must_use]
    pub fn has_pending_delete(&self, user_id: &str) -> bool {
        self.with(user_id, |s| s.pending_delete.is_some())
    }

    /// Start a focus session. Returns the session it replaced, whose backlog
    /// still needs replaying.
    pub fn start_focus(&self, user_id: &str, session: FocusSession) -> Option<FocusSession> {
        self.with(user_id, |s| s.focus.replace(session))
    }

    /// Current focus session.
    #[must_use]
    pub fn get_focus(&self, user_id: &str) -> Option<FocusSession> {
        self.with(user_id, |s| s.focus.clone())
    }

    /// Append `text` to the focus backlog. `false` when no session runs.
    pub fn queue_during_focus(&self, user_id: &str, text: &str) -> bool {
        self.with(user_id, |s| match s.focus.as_mut() {
            Some(focus) => {
                focus.backlog.push(text.to_owned());
                true
            }
            None => false,
        })
    }

    /// Remove and return the focus session.
    pub fn end_focus(&self, user_id: &str) -> Option<FocusSession> {
        self.with(user_id, |s| s.focus.take())
    }

    /// Offer `candidates` for selection, replacing earlier ones.
    pub fn stage_focus_candidates(&self, user_id: &str, candidates: Vec<FocusCandidate>) {
        self.with(user_id, |s| s.focus_candidates = candidates);
    }

    /// Pick a staged candidate by index, consuming the staged list.
    pub fn take_focus_candidate(&self, user_id: &str, index: usize) -> Option<FocusCandidate> {
        self.with(user_id, |s| {
            let mut staged = std::mem::take(&mut s.focus_candidates);
            (index < staged.len()).then(|| staged.swap_remove(index))
        })
    }

    /// Drop staged candidates.
    pub fn clear_focus_candidates(&self, user_id: &str) {
        self.with(user_id, |s| s.focus_candidates.clear());
    }

    /// Install a fresh cursor and return its first page.
    pub fn open_list(&self, user_id: &str, mut cursor: ListCursor, page_size: usize) -> ListPage {
        let page = cursor.advance(page_size);
        self.with(user_id, |s| {
            if cursor.exhausted() {
                s.cursors.remove(&cursor.kind);
            } else {
                s.cursors.insert(cursor.kind, cursor);
            }
        });
        page
    }

    /// Next page of the `kind` list. `None` when no cursor is open.
    pub fn next_page(&self, user_id: &str, kind: ListKind, page_size: usize) -> Option<ListPage> {
        self.with(user_id, |s| {
            let cursor = s.cursors.get_mut(&kind)?;
            let page = cursor.advance(page_size);
            if cursor.exhausted() {
                s.cursors.remove(&kind);
            }
            Some(page)
        })
    }
}
