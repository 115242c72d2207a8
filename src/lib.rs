pub mod config;
pub mod ics;
pub mod logging;
pub mod models;
pub mod scraping;
mod utils;

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use config::AppConfig;
use ics::CalendarOptions;
use models::Contest;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `AppConfig::output_path`.
    pub output: Option<PathBuf>,
    /// Source ids to fetch; empty means all of them.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    pub events: usize,
}

/// Fetches the selected sources in registry order and concatenates the results.
pub fn collect(config: &AppConfig, sources: &[String]) -> anyhow::Result<Vec<Contest>> {
    let client = scraping::base::build_client(config)?;
    scraping::run_selected(config, &client, sources)
}

/// Fetches every selected source, then writes the combined calendar.
pub fn run(options: &RunOptions, config: &AppConfig) -> anyhow::Result<RunReport> {
    let contests = collect(config, &options.sources)?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| config.output_path.clone());

    ics::write_calendar(&output, &contests, &CalendarOptions::from(config))
        .with_context(|| format!("failed to write calendar to {}", output.display()))?;
    info!(path = %output.display(), events = contests.len(), "calendar written");

    Ok(RunReport {
        output,
        events: contests.len(),
    })
}
