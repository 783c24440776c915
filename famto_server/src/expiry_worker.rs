use std::time::Duration;

use chrono::Utc;
use famto_engine::{db_types::TaskId, events::EventProducers, notifications::Notifier, DispatchApi, ExpiryReport, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the offer expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each sweep expires lapsed task offers, re-offers orphaned tasks and tells the admin about tasks nobody is left to
/// take.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    admin_id: String,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let dispatcher = DispatchApi::new(db, Notifier::new(admin_id, &producers));
        info!("🕰️ Task offer expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running task offer expiry job");
            match dispatcher.expire_stale_offers(Utc::now()).await {
                Ok(report) => log_report(&report),
                Err(e) => {
                    error!("🕰️ Error running task offer expiry job: {e}");
                },
            }
        }
    })
}

fn log_report(report: &ExpiryReport) {
    if report.expired.is_empty() {
        return;
    }
    info!(
        "🕰️ Offers lapsed on {} tasks. {} re-offered, {} left for manual assignment",
        report.expired.len(),
        report.reoffered.len(),
        report.unclaimed.len()
    );
    debug!("🕰️ Unclaimed tasks: {}", task_list(&report.unclaimed));
}

fn task_list(tasks: &[TaskId]) -> String {
    tasks.iter().map(|t| t.to_string()).collect::<Vec<String>>().join(", ")
}
