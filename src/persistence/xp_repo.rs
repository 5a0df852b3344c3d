//! XP snapshot repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::models::xp::XpRecord;
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for per-user XP records.
#[derive(Clone)]
pub struct XpRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct XpRow {
    user_id: String,
    total_xp: i64,
    streak_days: i64,
    last_action_date: Option<String>,
}

impl XpRow {
    fn into_record(self) -> Result<(String, XpRecord)> {
        let last_action_date = self
            .last_action_date
            .as_deref()
            .map(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| AppError::Db(format!("invalid last_action_date: {e}")))?;
        let total_xp = u64::try_from(self.total_xp)
            .map_err(|e| AppError::Db(format!("invalid total_xp: {e}")))?;
        let streak_days = u32::try_from(self.streak_days)
            .map_err(|e| AppError::Db(format!("invalid streak_days: {e}")))?;
        Ok((
            self.user_id,
            XpRecord {
                total_xp,
                streak_days,
                last_action_date,
            },
        ))
    }
}

impl XpRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace the record for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn upsert(&self, user_id: &str, record: &XpRecord) -> Result<()> {
        let total_xp = i64::try_from(record.total_xp)
            .map_err(|e| AppError::Db(format!("total_xp out of range: {e}")))?;
        let last_action_date = record
            .last_action_date
            .map(|d| d.format("%Y-%m-%d").to_string());

        sqlx::query(
            "INSERT INTO xp_record (user_id, total_xp, streak_days, last_action_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                total_xp = excluded.total_xp,
                streak_days = excluded.streak_days,
                last_action_date = excluded.last_action_date,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(total_xp)
        .bind(i64::from(record.streak_days))
        .bind(&last_action_date)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// Load the record for one user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or a row is malformed.
    pub async fn get(&self, user_id: &str) -> Result<Option<XpRecord>> {
        let row: Option<XpRow> = sqlx::query_as(
            "SELECT user_id, total_xp, streak_days, last_action_date
             FROM xp_record WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(self.db.as_ref())
        .await?;
        row.map(XpRow::into_record)
            .transpose()
            .map(|found| found.map(|(_, record)| record))
    }

    /// Load every stored record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or a row is malformed.
    pub async fn load_all(&self) -> Result<Vec<(String, XpRecord)>> {
        let rows: Vec<XpRow> = sqlx::query_as(
            "SELECT user_id, total_xp, streak_days, last_action_date FROM xp_record",
        )
        .fetch_all(self.db.as_ref())
        .await?;
        rows.into_iter().map(XpRow::into_record).collect()
    }
}
