use super::load_config;
use super::progress::Spinner;
use crate::output::Output;
use crate::WindowArgs;
use chrono::Local;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use diary_sync_core::SyncOrchestrator;
use std::path::Path;

/// Fetch and show the normalized diary without contacting Trakt
pub async fn run_feed(config_path: Option<&Path>, window: &WindowArgs, output: &Output) -> Result<()> {
    let (config, paths) = load_config(config_path)?;
    config.validate_letterboxd()?;
    let window = window.to_window()?;

    let orchestrator = SyncOrchestrator::from_config(&config, &paths);
    let spinner = Spinner::start(format!("Fetching diary for {}", orchestrator.username()));
    let result = orchestrator.collect(window, Local::now().date_naive()).await;
    spinner.finish();

    let (fetched, records) = result.map_err(|e| eyre!("Failed to fetch Letterboxd feed: {}", e))?;

    if records.is_empty() {
        output.warn(format!("No movies found ({} feed entries, {})", fetched, window));
        return Ok(());
    }

    output.records(&records);
    output.success(format!(
        "Retrieved {} movies from {} feed entries ({})",
        records.len(),
        fetched,
        window
    ));
    Ok(())
}
