//! HTTP backend for a Notion-style workspace API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::properties::parse_timestamp;
use super::{Page, PageBackend, Properties};
use crate::config::WorkspaceConfig;
use crate::{AppError, Result};

/// Largest page the query endpoint hands out.
const QUERY_PAGE_SIZE: u32 = 100;

/// Upper bound on result pages walked per query.
const MAX_QUERY_PAGES: usize = 50;

#[derive(Deserialize)]
struct RawPage {
    id: String,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    last_edited_time: Option<String>,
    #[serde(default)]
    archived: bool,
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        Self {
            id: raw.id,
            properties: raw.properties,
            created_time: parse_timestamp(raw.created_time.as_deref()),
            last_edited_time: parse_timestamp(raw.last_edited_time.as_deref()),
            archived: raw.archived,
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RawPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

/// Workspace client authenticated with an integration token.
#[derive(Clone)]
pub struct NotionBackend {
    client: Client,
    api_base: String,
    api_version: String,
    token: String,
}

impl NotionBackend {
    /// Build a client for `config`, with a transport-level `timeout`.
    #[must_use]
    pub fn new(config: &WorkspaceConfig, token: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            api_version: config.api_version.clone(),
            token: token.to_owned(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{path}", self.api_base))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
    }

    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, what, &body))
    }
}

fn status_error(status: StatusCode, what: &str, body: &str) -> AppError {
    let detail = crate::util::preview(body, 300);
    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(format!("{what}: {detail}"))
    } else {
        AppError::Store(format!("{what} failed with {status}: {detail}"))
    }
}

impl PageBackend for NotionBackend {
    fn create_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        Box::pin(async move {
            let value = self
                .send(
                    self.request(reqwest::Method::POST, "pages").json(&body),
                    "create page",
                )
                .await?;
            let created: Created = serde_json::from_value(value)
                .map_err(|err| AppError::Store(format!("unexpected create response: {err}")))?;
            Ok(created.id)
        })
    }

    fn query_database(
        &self,
        database_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Page>>> + Send + '_>> {
        let path = format!("databases/{database_id}/query");
        Box::pin(async move {
            let mut pages = Vec::new();
            let mut cursor: Option<String> = None;
            for _ in 0..MAX_QUERY_PAGES {
                let mut body = json!({ "page_size": QUERY_PAGE_SIZE });
                if let Some(start) = &cursor {
                    body["start_cursor"] = json!(start);
                }
                let value = self
                    .send(
                        self.request(reqwest::Method::POST, &path).json(&body),
                        "query database",
                    )
                    .await?;
                let batch: QueryResponse = serde_json::from_value(value)
                    .map_err(|err| AppError::Store(format!("unexpected query response: {err}")))?;
                pages.extend(
                    batch
                        .results
                        .into_iter()
                        .map(Page::from)
                        .filter(|p| !p.archived),
                );
                match (batch.has_more, batch.next_cursor) {
                    (true, Some(next)) => cursor = Some(next),
                    _ => return Ok(pages),
                }
            }
            warn!(path, pages = pages.len(), "query truncated at page limit");
            Ok(pages)
        })
    }

    fn update_page(
        &self,
        page_id: &str,
        properties: Properties,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let path = format!("pages/{page_id}");
        let body = json!({ "properties": properties });
        Box::pin(async move {
            let value = self
                .send(
                    self.request(reqwest::Method::PATCH, &path).json(&body),
                    "update page",
                )
                .await?;
            let updated: Created = serde_json::from_value(value)
                .map_err(|err| AppError::Store(format!("unexpected update response: {err}")))?;
            Ok(updated.id)
        })
    }

    fn archive_page(&self, page_id: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let path = format!("pages/{page_id}");
        Box::pin(async move {
            let response = self
                .request(reqwest::Method::PATCH, &path)
                .json(&json!({ "archived": true }))
                .send()
                .await?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            // Editing an archived page is rejected; the page is already where we want it.
            if status == StatusCode::BAD_REQUEST && body.contains("archived") {
                debug!(path, "page already archived");
                return Ok(());
            }
            Err(status_error(status, "archive page", &body))
        })
    }
}
