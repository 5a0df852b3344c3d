//! Progress log: one workspace entry per finished task, focus session or
//! habit.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::properties::{date_time, number, rich_text, select, title};
use super::{PageBackend, Properties};
use crate::clock::Clock;
use crate::models::item::Category;
use crate::util::bounded;

/// Progress database adapter. Failures are logged and reported as `false`.
#[derive(Clone)]
pub struct ProgressLog {
    backend: Arc<dyn PageBackend>,
    database_id: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl ProgressLog {
    /// Create an adapter over `database_id`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn PageBackend>,
        database_id: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            database_id: database_id.to_owned(),
            timeout,
            clock,
        }
    }

    /// Write one entry.
    pub async fn log(
        &self,
        activity: &str,
        category: &Category,
        duration_minutes: Option<u32>,
        notes: &str,
    ) -> bool {
        let mut props = Properties::new();
        props.insert("Activity".into(), title(activity));
        props.insert("Category".into(), select(category.label()));
        props.insert("Date".into(), date_time(self.clock.now()));
        if let Some(minutes) = duration_minutes {
            props.insert("Duration".into(), number(f64::from(minutes)));
        }
        if !notes.is_empty() {
            props.insert("Notes".into(), rich_text(notes));
        }

        match bounded(
            self.timeout,
            "log progress",
            self.backend.create_page(&self.database_id, props),
        )
        .await
        {
            Ok(id) => {
                debug!(entry_id = %id, activity, "progress logged");
                true
            }
            Err(err) => {
                warn!(%err, activity, "progress log failed");
                false
            }
        }
    }
}
