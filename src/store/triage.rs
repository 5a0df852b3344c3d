//! Manual-triage store with a local journal behind it.
//!
//! Content lands in the remote brain-dump database when possible and in the
//! `SQLite` journal otherwise, so nothing the user sent is dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::properties::{checkbox, date_time, external_file, rich_text, select, title};
use super::{PageBackend, Properties};
use crate::clock::Clock;
use crate::models::item::NOTES_MAX_CHARS;
use crate::models::triage::{TriageEntry, TriageOutcome};
use crate::persistence::journal_repo::JournalRepo;
use crate::util::{bounded, truncate_chars};

/// Brain-dump database adapter.
#[derive(Clone)]
pub struct TriageStore {
    backend: Arc<dyn PageBackend>,
    database_id: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    journal: Option<JournalRepo>,
}

impl TriageStore {
    /// Create an adapter over `database_id`, journaling to `journal` when
    /// the remote write fails.
    #[must_use]
    pub fn new(
        backend: Arc<dyn PageBackend>,
        database_id: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
        journal: Option<JournalRepo>,
    ) -> Self {
        Self {
            backend,
            database_id: database_id.to_owned(),
            timeout,
            clock,
            journal,
        }
    }

    /// Store `entry` for manual review.
    pub async fn capture(&self, user_id: &str, entry: &TriageEntry) -> TriageOutcome {
        let content = match &entry.failure_note {
            Some(note) => format!("⚠️ {note}\n\n{}", entry.content),
            None => entry.content.clone(),
        };
        let mut props = Properties::new();
        props.insert("Name".into(), title(&entry.title));
        props.insert(
            "Content".into(),
            rich_text(&truncate_chars(&content, NOTES_MAX_CHARS)),
        );
        props.insert("Processed".into(), checkbox(false));
        props.insert("Date".into(), date_time(self.clock.now()));
        props.insert("Type".into(), select(entry.kind.label()));
        if let Some(url) = &entry.file_url {
            props.insert("Files".into(), external_file(entry.kind.label(), url));
        }

        match bounded(
            self.timeout,
            "capture triage",
            self.backend.create_page(&self.database_id, props),
        )
        .await
        {
            Ok(id) => {
                info!(user_id, entry_id = %id, kind = entry.kind.label(), "captured for triage");
                return TriageOutcome::Remote(id);
            }
            Err(err) => warn!(%err, user_id, "triage capture failed, journaling locally"),
        }

        let Some(journal) = &self.journal else {
            error!(user_id, "no triage journal configured; content lost");
            return TriageOutcome::Lost;
        };
        match journal.append(user_id, entry, self.clock.now()).await {
            Ok(id) => {
                info!(user_id, journal_id = %id, "triage entry journaled");
                TriageOutcome::Journaled
            }
            Err(err) => {
                error!(%err, user_id, "triage journal write failed; content lost");
                TriageOutcome::Lost
            }
        }
    }
}
