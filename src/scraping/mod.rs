pub mod atcoder_html;
pub mod base;
pub mod omc_html;

use anyhow::Context;
use reqwest::blocking::Client;
use tracing::info;

use crate::config::AppConfig;
use crate::models::Contest;

pub trait ContestSource {
    fn source_id(&self) -> &'static str;
    fn source_name(&self) -> &'static str;
    fn source_url(&self) -> &str;
    fn fetch(&self, client: &Client) -> anyhow::Result<Vec<Contest>>;
}

#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Registered sources, in output order.
pub fn active_sources(config: &AppConfig) -> Vec<Box<dyn ContestSource>> {
    vec![
        Box::new(atcoder_html::AtCoder::new(&config.atcoder_url)),
        Box::new(omc_html::OnlineMathContest::new(&config.omc_url)),
    ]
}

pub fn list_sources(config: &AppConfig) -> Vec<SourceInfo> {
    active_sources(config)
        .into_iter()
        .map(|source| SourceInfo {
            id: source.source_id().to_string(),
            name: source.source_name().to_string(),
            url: source.source_url().to_string(),
        })
        .collect()
}

/// Fetches the selected sources one after another and concatenates their
/// contests in registry order. An empty selection means every source. The
/// first failing source aborts the run.
pub fn run_selected(
    config: &AppConfig,
    client: &Client,
    only: &[String],
) -> anyhow::Result<Vec<Contest>> {
    fetch_sources(&active_sources(config), client, only)
}

fn fetch_sources(
    sources: &[Box<dyn ContestSource>],
    client: &Client,
    only: &[String],
) -> anyhow::Result<Vec<Contest>> {
    for id in only {
        if !sources.iter().any(|source| source.source_id() == id) {
            anyhow::bail!("unknown source id: {id}");
        }
    }

    let mut contests = Vec::new();
    for source in sources {
        if !only.is_empty() && !only.iter().any(|id| id == source.source_id()) {
            continue;
        }
        let mut fetched = source
            .fetch(client)
            .with_context(|| format!("{} failed", source.source_id()))?;
        info!(
            source = source.source_id(),
            count = fetched.len(),
            "fetched contests"
        );
        contests.append(&mut fetched);
    }
    Ok(contests)
}
