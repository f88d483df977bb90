use super::progress::Spinner;
use super::load_config;
use crate::output::Output;
use crate::WindowArgs;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use diary_sync_core::{RunOptions, SyncOrchestrator};
use diary_sync_models::MovieRecord;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncFlags {
    pub no_history: bool,
    pub no_ratings: bool,
    pub dry_run: bool,
}

impl SyncFlags {
    /// Command-line switches can only narrow what the config enables
    fn apply(&self, base: RunOptions) -> RunOptions {
        RunOptions {
            sync_history: base.sync_history && !self.no_history,
            sync_ratings: base.sync_ratings && !self.no_ratings,
            dry_run: self.dry_run,
        }
    }
}

/// Human output lists every movie in the window, dry run or not
fn shows_records(output: &Output, records: &[MovieRecord]) -> bool {
    output.is_human() && !records.is_empty()
}

pub async fn run_sync(config_path: Option<&Path>, window: &WindowArgs, flags: SyncFlags, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let (config, paths) = load_config(config_path)?;
    if flags.dry_run {
        config.validate_letterboxd()?;
    } else {
        config.validate()?;
    }
    let window = window.to_window()?;

    let orchestrator = SyncOrchestrator::from_config(&config, &paths);
    let options = flags.apply(orchestrator.options());
    let orchestrator = orchestrator.with_options(options);

    let spinner = Spinner::start(format!("Syncing {} ({})", orchestrator.username(), window));
    let result = orchestrator.run(window).await;
    spinner.finish();

    let report = result.map_err(|e| eyre!("Sync operation failed: {}", e))?;

    if shows_records(output, &report.records) {
        output.records(&report.records);
    }
    output.report(&report);

    if report.is_success() {
        Ok(())
    } else {
        Err(eyre!("One or more sync batches failed"))
    }
}
