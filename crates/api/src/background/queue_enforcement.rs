//! Daily queue enforcement loop.
//!
//! Sleeps until the next fire time of `queue.cleanup_schedule`, runs one
//! [`EnforcementJob`] pass, and repeats. The schedule is re-read before every
//! sleep so edits made through the admin API apply from the next cycle.

use std::sync::Arc;
use std::time::Duration;

use bayline_core::schedule::DailySchedule;
use bayline_queue::{EnforcementJob, SettingsProvider};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Wait before retrying when the schedule itself cannot be read.
const SCHEDULE_RETRY: Duration = Duration::from_secs(60);

/// Run the enforcement loop until `cancel` is triggered.
pub async fn run(
    job: Arc<EnforcementJob>,
    settings: Arc<SettingsProvider>,
    cancel: CancellationToken,
) {
    tracing::info!("Queue enforcement job started");

    loop {
        let wait = match settings.cleanup_schedule().await {
            Ok(schedule) => until_next_fire(&schedule),
            Err(e) => {
                tracing::error!(error = %e, "Queue enforcement: failed to read schedule");
                SCHEDULE_RETRY
            }
        };
        tracing::debug!(wait_secs = wait.as_secs(), "Queue enforcement: sleeping");

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Queue enforcement job stopping");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = job.run_now().await {
                    tracing::error!(error = %e, "Queue enforcement: pass failed");
                }
            }
        }
    }
}

fn until_next_fire(schedule: &DailySchedule) -> Duration {
    let now = Utc::now();
    (schedule.next_after(now) - now)
        .to_std()
        .unwrap_or(SCHEDULE_RETRY)
}
