//! Periodic reclaim of stalled processing jobs.
//!
//! A runner that dies mid-job never aborts it, so its lease would pin the
//! job in processing forever. This sweep returns any processing job whose
//! last update is older than `STALLED_JOB_TTL_SECS` to the pending pool.
//! A TTL of `0` disables the sweep.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use mediagrid_db::repositories::RunnerJobRepo;
use mediagrid_events::bus::{JobEvent, EVENT_JOB_ABORTED};
use mediagrid_events::EventBus;

/// Run the stalled-job reclaim loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    event_bus: Arc<EventBus>,
    ttl_secs: u64,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    if ttl_secs == 0 {
        tracing::info!("Stalled-job sweep disabled (STALLED_JOB_TTL_SECS=0)");
        return;
    }

    tracing::info!(ttl_secs, interval_secs, "Stalled-job sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stalled-job sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match RunnerJobRepo::release_stalled(&pool, ttl_secs).await {
                    Ok(released) if released.is_empty() => {
                        tracing::debug!("Stalled-job sweep: nothing to reclaim");
                    }
                    Ok(released) => {
                        tracing::warn!(count = released.len(), "Stalled-job sweep: jobs returned to pool");
                        for (uuid, job_type) in released {
                            event_bus.publish(
                                JobEvent::new(EVENT_JOB_ABORTED, uuid, job_type)
                                    .with_payload(serde_json::json!({ "reason": "stalled" })),
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stalled-job sweep failed");
                    }
                }
            }
        }
    }
}
