//! Item store adapter.
//!
//! Every read is a live query with client-side filtering: the workspace's
//! native status filter is not trusted, since status is an open-ended tag.
//! Failures never escape as errors; callers get `None`, `false` or an empty
//! list and decide whether to fall back.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use tracing::{info, warn};

use super::properties::{
    date, external_file, read_date, read_file_url, read_rich_text, read_select, read_title,
    rich_text, select, title,
};
use super::{Page, PageBackend, Properties};
use crate::clock::Clock;
use crate::models::item::{
    Category, CompletionView, DeadlineBand, DeadlineView, DueDate, Item, ItemStatus, ItemType,
    ItemUpdate, NewItem, Priority,
};
use crate::util::bounded;
use crate::Result;

/// Title property.
pub const PROP_NAME: &str = "Name";
/// Category select.
pub const PROP_CATEGORY: &str = "Category";
/// Type select.
pub const PROP_TYPE: &str = "Type";
/// Status select.
pub const PROP_STATUS: &str = "Status";
/// Priority select.
pub const PROP_PRIORITY: &str = "Priority";
/// Creation date.
pub const PROP_DATE_ADDED: &str = "Date Added";
/// Notes rich text.
pub const PROP_NOTES: &str = "Notes";
/// Attachment files.
pub const PROP_IMAGE: &str = "Image";

/// Conventional names for a deadline field, in lookup order.
pub const DUE_DATE_FIELDS: [&str; 4] = ["Due Date", "Deadline", "Due", "Date"];

/// Command-ish words ignored by the second and third search tiers.
const SEARCH_STOPLIST: [&str; 12] = [
    "the", "a", "an", "my", "to", "change", "update", "set", "make", "mark", "delete", "remove",
];

/// Items database adapter.
#[derive(Clone)]
pub struct ItemStore {
    backend: Arc<dyn PageBackend>,
    database_id: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl ItemStore {
    /// Create an adapter over `database_id`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn PageBackend>,
        database_id: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            backend,
            database_id: database_id.to_owned(),
            timeout,
            clock,
            offset,
        }
    }

    /// Persist a new item. `None` means the write failed.
    pub async fn create_item(&self, item: &NewItem) -> Option<String> {
        let mut props = Properties::new();
        props.insert(PROP_NAME.into(), title(&item.title));
        props.insert(PROP_CATEGORY.into(), select(item.category.label()));
        props.insert(PROP_TYPE.into(), select(item.item_type.label()));
        props.insert(PROP_STATUS.into(), select(ItemStatus::Active.label()));
        props.insert(PROP_PRIORITY.into(), select(item.priority.label()));
        props.insert(PROP_DATE_ADDED.into(), date(&self.clock.now().to_rfc3339()));
        if !item.notes.is_empty() {
            props.insert(PROP_NOTES.into(), rich_text(&item.notes));
        }
        if let Some(due) = item.due {
            props.insert(DUE_DATE_FIELDS[0].into(), date(&due.to_store_string()));
        }
        if let Some(url) = &item.attachment_url {
            props.insert(PROP_IMAGE.into(), external_file("attachment", url));
        }

        match bounded(
            self.timeout,
            "create item",
            self.backend.create_page(&self.database_id, props),
        )
        .await
        {
            Ok(id) => {
                info!(item_id = %id, category = %item.category, "item created");
                Some(id)
            }
            Err(err) => {
                warn!(%err, title = %item.title, "item create failed");
                None
            }
        }
    }

    /// Every non-archived item, in store order.
    ///
    /// # Errors
    ///
    /// Returns the transport error; public readers swallow it.
    async fn fetch_all(&self) -> Result<Vec<Item>> {
        let pages = bounded(
            self.timeout,
            "query items",
            self.backend.query_database(&self.database_id),
        )
        .await?;
        Ok(pages
            .into_iter()
            .filter(|page| !page.archived)
            .map(|page| page_to_item(page, self.offset))
            .collect())
    }

    async fn fetch_or_empty(&self, what: &str) -> Vec<Item> {
        match self.fetch_all().await {
            Ok(items) => items,
            Err(err) => {
                warn!(%err, what, "item query failed");
                Vec::new()
            }
        }
    }

    /// Active items sorted High → Medium → Low (missing priority last).
    pub async fn list_active(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .fetch_or_empty("list active")
            .await
            .into_iter()
            .filter(Item::is_active)
            .collect();
        items.sort_by_key(|item| Priority::rank(item.priority));
        items
    }

    /// Active items whose category equals `category` (case-insensitive,
    /// whole label).
    pub async fn list_by_category(&self, category: &str) -> Vec<Item> {
        self.list_active()
            .await
            .into_iter()
            .filter(|item| item.category.matches_label(category))
            .collect()
    }

    /// Three-tier fuzzy title search; see [`search_items`].
    pub async fn search(&self, query: &str) -> Vec<Item> {
        let items = self.fetch_or_empty("search").await;
        search_items(&items, query)
    }

    /// Apply a partial update. `None` means the write failed.
    pub async fn update_item(&self, id: &str, update: &ItemUpdate) -> Option<String> {
        if update.is_empty() {
            return Some(id.to_owned());
        }
        let mut props = Properties::new();
        if let Some(priority) = update.priority {
            props.insert(PROP_PRIORITY.into(), select(priority.label()));
        }
        if let Some(status) = &update.status {
            props.insert(PROP_STATUS.into(), select(status.label()));
        }
        if let Some(category) = &update.category {
            props.insert(PROP_CATEGORY.into(), select(category.label()));
        }

        match bounded(
            self.timeout,
            "update item",
            self.backend.update_page(id, props),
        )
        .await
        {
            Ok(updated) => {
                info!(item_id = %updated, "item updated");
                Some(updated)
            }
            Err(err) => {
                warn!(%err, item_id = %id, "item update failed");
                None
            }
        }
    }

    /// Archive an item. Repeated calls on the same id succeed.
    pub async fn archive_item(&self, id: &str) -> bool {
        match bounded(self.timeout, "archive item", self.backend.archive_page(id)).await {
            Ok(()) => {
                info!(item_id = %id, "item archived");
                true
            }
            Err(err) => {
                warn!(%err, item_id = %id, "item archive failed");
                false
            }
        }
    }

    /// Active items with a deadline, soonest first, at most `limit`.
    ///
    /// Items more than one day overdue are left out.
    pub async fn upcoming_deadlines(&self, limit: usize) -> Vec<DeadlineView> {
        let now = self.clock.now();
        let mut views: Vec<(DeadlineView, i64)> = self
            .list_active()
            .await
            .into_iter()
            .filter_map(|item| {
                let due = item.due?;
                let remaining = due.instant(self.offset) - now;
                let hours = remaining.num_hours();
                let days_left = remaining.num_seconds().div_euclid(86_400);
                if days_left < -1 {
                    return None;
                }
                let band = if hours < 0 {
                    DeadlineBand::Overdue { hours: -hours }
                } else if hours < 24 {
                    DeadlineBand::Hours(hours)
                } else {
                    DeadlineBand::Days(days_left)
                };
                Some((
                    DeadlineView {
                        item_id: item.id,
                        title: item.title,
                        due,
                        days_left,
                        band,
                    },
                    remaining.num_seconds(),
                ))
            })
            .collect();
        views.sort_by_key(|(view, seconds)| (view.days_left, *seconds));
        views
            .into_iter()
            .take(limit)
            .map(|(view, _)| view)
            .collect()
    }

    /// Done items last modified on the current UTC date.
    pub async fn completed_today(&self) -> Vec<CompletionView> {
        let today = self.clock.now().date_naive();
        self.fetch_or_empty("completed today")
            .await
            .into_iter()
            .filter(|item| item.status.is_done())
            .filter_map(|item| {
                let edited = item.last_edited_at?;
                (edited.date_naive() == today).then(|| CompletionView {
                    item_id: item.id,
                    title: item.title,
                    category: item.category,
                    completed_at: edited,
                })
            })
            .collect()
    }
}

/// Normalize a raw page into an [`Item`].
#[must_use]
pub fn page_to_item(page: Page, offset: FixedOffset) -> Item {
    let props = &page.properties;
    let due = DUE_DATE_FIELDS
        .iter()
        .find_map(|field| read_date(props, field))
        .and_then(|raw| DueDate::parse(&raw, offset));
    let created_at = read_date(props, PROP_DATE_ADDED)
        .and_then(|raw| DueDate::parse(&raw, offset))
        .map(|d| d.instant(offset))
        .or(page.created_time);

    Item {
        title: read_title(props, PROP_NAME).unwrap_or_else(|| "Untitled".into()),
        category: Category::from_store(read_select(props, PROP_CATEGORY).as_deref()),
        item_type: read_select(props, PROP_TYPE)
            .as_deref()
            .and_then(ItemType::parse),
        status: ItemStatus::from_store(read_select(props, PROP_STATUS).as_deref()),
        priority: read_select(props, PROP_PRIORITY)
            .as_deref()
            .and_then(Priority::parse),
        notes: read_rich_text(props, PROP_NOTES),
        created_at,
        due,
        attachment_url: read_file_url(props, PROP_IMAGE),
        last_edited_at: page.last_edited_time,
        id: page.id,
    }
}

/// Three-tier title search over `items`.
///
/// 1. The whole query as a case-insensitive substring of the title.
/// 2. The first non-stoplist token longer than two characters, as a
///    substring.
/// 3. Any such token, among active items only.
///
/// The first non-empty tier wins.
#[must_use]
pub fn search_items(items: &[Item], query: &str) -> Vec<Item> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let titled = |fragment: &str| -> Vec<Item> {
        items
            .iter()
            .filter(|item| item.title.to_lowercase().contains(fragment))
            .cloned()
            .collect()
    };

    let exact = titled(&needle);
    if !exact.is_empty() {
        return exact;
    }

    let tokens: Vec<&str> = needle
        .split_whitespace()
        .filter(|token| !SEARCH_STOPLIST.contains(token))
        .filter(|token| token.chars().count() > 2)
        .collect();
    let Some(first) = tokens.first() else {
        return Vec::new();
    };

    let keyword = titled(first);
    if !keyword.is_empty() {
        return keyword;
    }

    items
        .iter()
        .filter(|item| item.is_active())
        .filter(|item| {
            let title = item.title.to_lowercase();
            tokens.iter().any(|token| title.contains(token))
        })
        .cloned()
        .collect()
}
