//! Persistence layer modules.

pub mod db;
pub mod journal_repo;
pub mod schema;
pub mod snapshot;
pub mod xp_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
