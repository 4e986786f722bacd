//! Background cleanup worker for stale login attempts.

use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cleanup configuration.
pub struct CleanupConfig {
    /// Interval between cleanup runs.
    pub interval: Duration,
    /// How long finished attempts are kept before deletion.
    pub retention: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            retention: Duration::from_secs(86_400), // 1 day
        }
    }
}

/// Run a single cleanup cycle.
pub async fn cleanup_once(pool: &SqlitePool, retention: Duration) {
    let now = Utc::now();

    match crate::db::expire_login_attempts(pool, now).await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(expired_attempts = count, "Expired stale login attempts");
            }
        }
        Err(e) => {
            tracing::error!("Failed to expire login attempts: {e}");
        }
    }

    let retention = chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::days(1));
    match crate::db::delete_login_attempts_before(pool, now - retention).await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(deleted_attempts = count, "Deleted old login attempts");
            }
        }
        Err(e) => {
            tracing::error!("Failed to delete old login attempts: {e}");
        }
    }
}

/// Run the cleanup worker.
/// This task runs cleanup immediately on start, then at the configured interval.
/// It respects the cancellation token for graceful shutdown.
pub async fn run_cleanup_worker(
    pool: SqlitePool,
    config: CleanupConfig,
    shutdown: CancellationToken,
) {
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        retention_secs = config.retention.as_secs(),
        "Starting login attempt cleanup worker"
    );

    cleanup_once(&pool, config.retention).await;

    let mut interval = tokio::time::interval(config.interval);
    interval.tick().await; // Skip the first immediate tick (we already ran cleanup)

    loop {
        tokio::select! {
            _ = interval.tick() => {
                cleanup_once(&pool, config.retention).await;
            }
            () = shutdown.cancelled() => {
                tracing::info!("Cleanup worker shutting down");
                break;
            }
        }
    }
}
