//! Periodic removal of stickers nobody came back for.

use std::time::Duration;

use crate::store::ArtifactStore;

/// Spawn a task that sweeps `store` every `interval`, removing artifacts
/// older than `max_age`.
pub fn start_retention_task(
    store: ArtifactStore,
    max_age: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tracing::info!(
        max_age_secs = max_age.as_secs(),
        interval_secs = interval.as_secs(),
        "Artifact retention enabled"
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match store.sweep_expired(max_age).await {
                Ok(report) if report.total() > 0 => tracing::info!(
                    outputs = report.outputs_removed,
                    uploads = report.uploads_removed,
                    "Swept expired artifacts"
                ),
                Ok(_) => tracing::trace!("Retention sweep found nothing to remove"),
                Err(e) => tracing::warn!(error = %e, "Retention sweep failed"),
            }
        }
    })
}
