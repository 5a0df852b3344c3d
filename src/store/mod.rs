//! Workspace adapters.
//!
//! [`PageBackend`] is the thin transport seam over the remote workspace
//! (a database of pages with free-form property bags). The typed stores on
//! top of it ([`items::ItemStore`], [`habits::HabitStore`],
//! [`progress::ProgressLog`], [`triage::TriageStore`]) own the mapping to
//! domain types and turn every transport failure into a typed outcome.

pub mod habits;
pub mod items;
pub mod memory;
pub mod notion;
pub mod progress;
pub mod properties;
pub mod triage;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::Result;

/// Property bag as sent to and returned by the workspace.
pub type Properties = Map<String, Value>;

/// One page (row) of a workspace database.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Opaque page identifier.
    pub id: String,
    /// Raw property bag.
    pub properties: Properties,
    /// Creation time reported by the workspace.
    pub created_time: Option<DateTime<Utc>>,
    /// Last modification reported by the workspace.
    pub last_edited_time: Option<DateTime<Utc>>,
    /// Whether the page has been archived.
    pub archived: bool,
}

/// Transport-level access to workspace databases.
///
/// Implementations do no domain filtering: `query_database` returns every
/// non-archived page, across all result pages.
pub trait PageBackend: Send + Sync {
    /// Create a page in `database_id`, returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` or `AppError::Timeout` on transport failure.
    fn create_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Every non-archived page of `database_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` or `AppError::Timeout` on transport failure.
    fn query_database(
        &self,
        database_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Page>>> + Send + '_>>;

    /// Merge `properties` into an existing page, returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown pages, otherwise
    /// `AppError::Store` or `AppError::Timeout`.
    fn update_page(
        &self,
        page_id: &str,
        properties: Properties,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Archive a page. Archiving an archived page succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown pages, otherwise
    /// `AppError::Store` or `AppError::Timeout`.
    fn archive_page(&self, page_id: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
