//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` and are safe to
//! re-run on every startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS xp_record (
    user_id          TEXT PRIMARY KEY NOT NULL,
    total_xp         INTEGER NOT NULL DEFAULT 0 CHECK(total_xp >= 0),
    streak_days      INTEGER NOT NULL DEFAULT 0 CHECK(streak_days >= 0),
    last_action_date TEXT,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS triage_journal (
    id           TEXT PRIMARY KEY NOT NULL,
    user_id      TEXT NOT NULL,
    kind         TEXT NOT NULL CHECK(kind IN ('text','voice','image','document')),
    title        TEXT NOT NULL,
    content      TEXT NOT NULL,
    file_url     TEXT,
    failure_note TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_triage_journal_user ON triage_journal(user_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
