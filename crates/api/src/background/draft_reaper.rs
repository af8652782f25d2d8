//! Periodic cleanup of abandoned draft requests.
//!
//! A user who navigates away mid-creation leaves a draft behind; the owner
//! can delete it explicitly, and this job reaps whatever remains untouched
//! past the retention window. Runs on a fixed interval using
//! `tokio::time::interval`.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use dataport_db::repositories::RequestRepo;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(6 * 3600); // 6 hours

/// Run the draft reaper loop.
///
/// Deletes draft requests whose last touch is older than `retention_days`.
/// Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, retention_days: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Draft reaper started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Draft reaper stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(retention_days);
                match RequestRepo::delete_stale_drafts(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Draft reaper: purged abandoned drafts");
                        } else {
                            tracing::debug!("Draft reaper: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Draft reaper: cleanup failed");
                    }
                }
            }
        }
    }
}
