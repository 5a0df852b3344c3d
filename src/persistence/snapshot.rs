//! Periodic XP snapshot task.
//!
//! Copies the in-memory ledger into `xp_record` on an interval and once
//! more on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::xp_repo::XpRepo;
use crate::gamification::XpLedger;
use crate::Result;

/// Interval between snapshots.
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(300);

/// Spawn the snapshot background task. A final flush runs after `cancel`
/// fires.
#[must_use]
pub fn spawn_snapshot_task(
    ledger: Arc<XpLedger>,
    repo: XpRepo,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; nothing to save yet.
        ticker.tick().await;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    match flush(&ledger, &repo).await {
                        Ok(count) => info!(count, "xp snapshot flushed on shutdown"),
                        Err(err) => error!(%err, "final xp snapshot failed"),
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = flush(&ledger, &repo).await {
                        error!(%err, "xp snapshot failed");
                    }
                }
            }
        }
    })
}

/// Write every ledger record to the repository.
///
/// # Errors
///
/// Returns `AppError::Db` on the first failed write.
pub async fn flush(ledger: &XpLedger, repo: &XpRepo) -> Result<usize> {
    let records = ledger.snapshot();
    for (user_id, record) in &records {
        repo.upsert(user_id, record).await?;
    }
    Ok(records.len())
}

/// Seed the ledger from the repository.
///
/// # Errors
///
/// Returns `AppError::Db` if the records cannot be read.
pub async fn restore(ledger: &XpLedger, repo: &XpRepo) -> Result<usize> {
    let stored = repo.load_all().await?;
    Ok(ledger.restore(stored))
}
