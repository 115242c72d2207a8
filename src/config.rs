use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils;

pub const DEFAULT_OUTPUT: &str = "contest.ics";
pub const DEFAULT_ATCODER_URL: &str = "https://atcoder.jp/contests/?lang=ja";
pub const DEFAULT_OMC_URL: &str = "https://onlinemathcontest.com/contests/";
pub const DEFAULT_PROD_ID: &str = "-//AtCoder+OMC ICS//EN";
pub const DEFAULT_UID_DOMAIN: &str = "combined-contest.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path:?} not found")]
    Missing { path: PathBuf },
    #[error("unable to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// How event timestamps are turned into the `...Z` form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// Convert to UTC first.
    #[default]
    Utc,
    /// Print the source's wall clock as-is with a `Z` suffix (legacy output).
    SourceLocal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_path: PathBuf,
    pub atcoder_url: String,
    pub omc_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub prod_id: String,
    pub uid_domain: String,
    pub clock_mode: ClockMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            atcoder_url: DEFAULT_ATCODER_URL.to_string(),
            omc_url: DEFAULT_OMC_URL.to_string(),
            user_agent: concat!("contest-ics/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 20,
            prod_id: DEFAULT_PROD_ID.to_string(),
            uid_domain: DEFAULT_UID_DOMAIN.to_string(),
            clock_mode: ClockMode::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path` when given (it must exist), otherwise the per-user config
    /// file, falling back to defaults when that one is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Missing {
                        path: path.to_path_buf(),
                    });
                }
                read_config(path)
            }
            None => {
                let path = utils::config_path();
                if path.exists() {
                    read_config(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
