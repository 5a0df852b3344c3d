//! Offline triage journal for content the remote triage database rejected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::triage::{TriageEntry, TriageKind};
use crate::{AppError, Result};

use super::db::Database;

/// A journaled triage entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    /// Row identifier.
    pub id: String,
    /// Who sent the content.
    pub user_id: String,
    /// The captured entry.
    pub entry: TriageEntry,
    /// When it was journaled.
    pub created_at: DateTime<Utc>,
}

/// Repository wrapper around `SQLite` for the triage journal.
#[derive(Clone)]
pub struct JournalRepo {
    db: Arc<Database>,
}

#[derive(sqlx::FromRow)]
struct JournalRow {
    id: String,
    user_id: String,
    kind: String,
    title: String,
    content: String,
    file_url: Option<String>,
    failure_note: Option<String>,
    created_at: String,
}

impl JournalRow {
    fn into_record(self) -> Result<JournalRecord> {
        let kind = TriageKind::from_db_str(&self.kind)
            .ok_or_else(|| AppError::Db(format!("invalid triage kind: {}", self.kind)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Db(format!("invalid created_at: {e}")))?
            .with_timezone(&Utc);
        Ok(JournalRecord {
            id: self.id,
            user_id: self.user_id,
            entry: TriageEntry {
                title: self.title,
                content: self.content,
                kind,
                file_url: self.file_url,
                failure_note: self.failure_note,
            },
            created_at,
        })
    }
}

impl JournalRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn append(
        &self,
        user_id: &str,
        entry: &TriageEntry,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO triage_journal (id, user_id, kind, title, content, file_url,
             failure_note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(entry.kind.as_db_str())
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(&entry.file_url)
        .bind(&entry.failure_note)
        .bind(at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;
        Ok(id)
    }

    /// Entries journaled for `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or a row is malformed.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<JournalRecord>> {
        let rows: Vec<JournalRow> = sqlx::query_as(
            "SELECT id, user_id, kind, title, content, file_url, failure_note, created_at
             FROM triage_journal WHERE user_id = ?1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(self.db.as_ref())
        .await?;
        rows.into_iter().map(JournalRow::into_record).collect()
    }
}
