use super::load_config;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use diary_sync_core::{SyncOrchestrator, SyncWindow};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Run one sync unless another is still in progress
async fn run_once(orchestrator: &Mutex<SyncOrchestrator>, window: SyncWindow, trigger: &'static str) {
    let Ok(orchestrator) = orchestrator.try_lock() else {
        warn!(operation = trigger, "Previous sync still running, skipping this run");
        return;
    };

    info!(operation = trigger, window = %window, "Starting scheduled sync");
    match orchestrator.run(window).await {
        Ok(report) if report.is_success() => info!(
            operation = trigger,
            records = report.records.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Scheduled sync completed successfully"
        ),
        Ok(report) => warn!(
            operation = trigger,
            history = ?report.history,
            ratings = ?report.ratings,
            "Scheduled sync completed with failed batches"
        ),
        Err(e) => error!(operation = trigger, error = %e, "Scheduled sync failed"),
    }
}

fn scheduled_job(schedule: &str, orchestrator: Arc<Mutex<SyncOrchestrator>>, window: SyncWindow) -> Result<Job> {
    Job::new_async(schedule, move |_id, _scheduler| {
        let orchestrator = Arc::clone(&orchestrator);
        Box::pin(async move {
            run_once(&orchestrator, window, "scheduled_sync").await;
        })
    })
    .map_err(|e| eyre!("Invalid schedule '{}': {}", schedule, e))
}

/// Sync the last N days on a cron schedule until interrupted
pub async fn run_daemon(
    config_path: Option<&Path>,
    schedule_override: Option<String>,
    days_override: Option<u32>,
    no_startup_sync: bool,
    output: &Output,
) -> Result<()> {
    let (config, paths) = load_config(config_path)?;
    config.validate()?;

    let schedule = schedule_override.unwrap_or_else(|| config.scheduler.schedule.clone());
    let window = SyncWindow::LastDays(days_override.unwrap_or(config.scheduler.lookback_days));
    let run_on_startup = config.scheduler.run_on_startup && !no_startup_sync;

    let orchestrator = Arc::new(Mutex::new(SyncOrchestrator::from_config(&config, &paths)));

    let mut scheduler = JobScheduler::new().await?;
    scheduler
        .add(scheduled_job(&schedule, Arc::clone(&orchestrator), window)?)
        .await?;

    if run_on_startup {
        info!(operation = "scheduler_startup", "Running initial sync on startup");
        run_once(&orchestrator, window, "startup_sync").await;
    }

    scheduler.start().await?;
    info!(
        operation = "scheduler_started",
        schedule = %schedule,
        window = %window,
        "Scheduler started (UTC)"
    );
    output.info(format!("Daemon running with schedule '{}' (UTC). Press Ctrl-C to stop.", schedule));

    tokio::signal::ctrl_c().await?;
    info!(operation = "scheduler_stopping", "Shutdown signal received");
    scheduler.shutdown().await?;
    output.success("Daemon stopped");
    Ok(())
}
