//! Per-user fixed-window rate limiter.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::{AppError, Result};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `max_events` per user per window; the window restarts with the
/// first event after it expires.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_events: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter.
    #[must_use]
    pub fn new(max_events: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_events,
            window,
        }
    }

    /// Create a limiter from configuration.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_events,
            Duration::from_secs(config.window_seconds),
        )
    }

    /// Record one event for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::RateLimited` when the user's window is full; the
    /// rejected event is not counted.
    pub fn check(&self, user_id: &str) -> Result<()> {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(user_id.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }
        if window.count >= self.max_events {
            return Err(AppError::RateLimited(format!(
                "{} events per {}s",
                self.max_events,
                self.window.as_secs()
            )));
        }
        window.count += 1;
        Ok(())
    }
}
