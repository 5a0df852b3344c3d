//! Chat front-end seam.
//!
//! The transport (Slack Socket Mode in production) delivers
//! [`InboundEvent`]s and implements [`ChatFrontEnd`] for everything flowing
//! the other way.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::models::event::{FileRef, Reply};
use crate::Result;

/// Outbound operations the application needs from the chat transport.
pub trait ChatFrontEnd: Send + Sync {
    /// Post `reply` into `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if delivery fails.
    fn send(
        &self,
        channel: &str,
        reply: Reply,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Download the bytes behind `file`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the download fails.
    fn fetch_file(
        &self,
        file: &FileRef,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + '_>>;

    /// Signal that a slow operation is under way.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the indicator cannot be shown.
    fn indicate_progress(
        &self,
        channel: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
