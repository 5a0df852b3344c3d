//! In-memory workspace backend.
//!
//! Serves local mode (no workspace token) and tests. Call counters and a
//! write-failure switch let tests observe and break the transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Page, PageBackend, Properties};
use crate::clock::{Clock, SystemClock};
use crate::{AppError, Result};

struct StoredPage {
    database_id: String,
    page: Page,
}

/// Snapshot of how often each operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `create_page` calls.
    pub creates: usize,
    /// `query_database` calls.
    pub queries: usize,
    /// `update_page` calls.
    pub updates: usize,
    /// `archive_page` calls.
    pub archives: usize,
}

/// Workspace kept in process memory.
pub struct MemoryBackend {
    pages: Mutex<Vec<StoredPage>>,
    clock: Arc<dyn Clock>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    creates: AtomicUsize,
    queries: AtomicUsize,
    updates: AtomicUsize,
    archives: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty workspace stamped with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty workspace stamped with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            pages: Mutex::new(Vec::new()),
            clock,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            creates: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            archives: AtomicUsize::new(0),
        }
    }

    /// Make every create/update/archive fail with `AppError::Store`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every query fail with `AppError::Store`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Insert a page directly, bypassing counters and failure injection.
    pub fn seed(&self, database_id: &str, properties: Properties) -> String {
        let id = Uuid::new_v4().to_string();
        let now = self.clock.now();
        self.lock().push(StoredPage {
            database_id: database_id.to_owned(),
            page: Page {
                id: id.clone(),
                properties,
                created_time: Some(now),
                last_edited_time: Some(now),
                archived: false,
            },
        });
        id
    }

    /// Overwrite a page's last-edited timestamp.
    pub fn set_last_edited(&self, page_id: &str, at: DateTime<Utc>) {
        if let Some(stored) = self.lock().iter_mut().find(|s| s.page.id == page_id) {
            stored.page.last_edited_time = Some(at);
        }
    }

    /// Current state of a page, archived or not.
    #[must_use]
    pub fn page(&self, page_id: &str) -> Option<Page> {
        self.lock()
            .iter()
            .find(|s| s.page.id == page_id)
            .map(|s| s.page.clone())
    }

    /// Every page of a database, archived ones included.
    #[must_use]
    pub fn pages_in(&self, database_id: &str) -> Vec<Page> {
        self.lock()
            .iter()
            .filter(|s| s.database_id == database_id)
            .map(|s| s.page.clone())
            .collect()
    }

    /// Call counters so far.
    #[must_use]
    pub fn counts(&self) -> CallCounts {
        CallCounts {
            creates: self.creates.load(Ordering::SeqCst),
            queries: self.queries.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            archives: self.archives.load(Ordering::SeqCst),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StoredPage>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AppError::Store("injected write failure".into()))
        } else {
            Ok(())
        }
    }

    fn create_sync(&self, database_id: &str, properties: Properties) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        Ok(self.seed(database_id, properties))
    }

    fn query_sync(&self, database_id: &str) -> Result<Vec<Page>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Store("injected read failure".into()));
        }
        Ok(self
            .lock()
            .iter()
            .filter(|s| s.database_id == database_id && !s.page.archived)
            .map(|s| s.page.clone())
            .collect())
    }

    fn update_sync(&self, page_id: &str, properties: Properties) -> Result<String> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let now = self.clock.now();
        let mut pages = self.lock();
        let stored = pages
            .iter_mut()
            .find(|s| s.page.id == page_id)
            .ok_or_else(|| AppError::NotFound(format!("page {page_id}")))?;
        if stored.page.archived {
            return Err(AppError::Store(format!("page {page_id} is archived")));
        }
        stored.page.properties.extend(properties);
        stored.page.last_edited_time = Some(now);
        Ok(stored.page.id.clone())
    }

    fn archive_sync(&self, page_id: &str) -> Result<()> {
        self.archives.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let now = self.clock.now();
        let mut pages = self.lock();
        let stored = pages
            .iter_mut()
            .find(|s| s.page.id == page_id)
            .ok_or_else(|| AppError::NotFound(format!("page {page_id}")))?;
        if !stored.page.archived {
            stored.page.archived = true;
            stored.page.last_edited_time = Some(now);
        }
        Ok(())
    }
}

impl PageBackend for MemoryBackend {
    fn create_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let result = self.create_sync(database_id, properties);
        Box::pin(async move { result })
    }

    fn query_database(
        &self,
        database_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Page>>> + Send + '_>> {
        let result = self.query_sync(database_id);
        Box::pin(async move { result })
    }

    fn update_page(
        &self,
        page_id: &str,
        properties: Properties,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let result = self.update_sync(page_id, properties);
        Box::pin(async move { result })
    }

    fn archive_page(&self, page_id: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let result = self.archive_sync(page_id);
        Box::pin(async move { result })
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("pages", &self.lock().len())
            .field("counts", &self.counts())
            .finish_non_exhaustive()
    }
}
