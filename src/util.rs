//! Small helpers shared by the adapters.

use std::future::Future;
use std::time::Duration;

use crate::{AppError, Result};

/// Run an external call under a time budget.
///
/// An elapsed budget becomes [`AppError::Timeout`] so callers can treat it
/// like any other recoverable adapter failure.
///
/// # Errors
///
/// Returns the inner error, or `AppError::Timeout` when `limit` elapses first.
pub async fn bounded<T, F>(limit: Duration, label: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{label} exceeded {}s",
            limit.as_secs()
        ))),
    }
}

/// Truncate to at most `max` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_owned(),
        None => text.to_owned(),
    }
}

/// Truncate for display, appending an ellipsis when anything was cut.
#[must_use]
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", truncate_chars(text, max))
    } else {
        text.to_owned()
    }
}
