use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{self, DEFAULT_MAX_ENTRIES};
use crate::chart::BILLBOARD_HOT_100_URL;
use crate::error::{Error, Result};
use crate::fetch::DEFAULT_TIMEOUT;
use crate::sources::DEFAULT_ORDER;

/// Runtime settings, read from the environment (a `.env` file is loaded by
/// the binary first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// `None` disables the lyrics cache.
    pub cache_dir: Option<PathBuf>,
    pub cache_max_entries: usize,
    pub timeout: Duration,
    pub proxy: Option<String>,
    /// Source ids in priority order.
    pub sources: Vec<String>,
    pub chart_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_dir: Some(cache::default_cache_dir()),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            sources: DEFAULT_ORDER.iter().map(|s| s.to_string()).collect(),
            chart_url: BILLBOARD_HOT_100_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();

        if let Some(dir) = get("LYRICS_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("LYRICS_CACHE_DIR") {
            cfg.cache_dir = Some(PathBuf::from(dir));
        }
        if get("LYRICS_NO_CACHE").is_some() {
            cfg.cache_dir = None;
        }
        if let Some(max) = get("LYRICS_CACHE_MAX") {
            cfg.cache_max_entries = parse_number("LYRICS_CACHE_MAX", &max)?;
        }
        if let Some(secs) = get("LYRICS_TIMEOUT_SECS") {
            cfg.timeout = Duration::from_secs(parse_number("LYRICS_TIMEOUT_SECS", &secs)?);
        }
        cfg.proxy = get("LYRICS_PROXY");
        if let Some(sources) = get("LYRICS_SOURCES") {
            cfg.sources = parse_sources(&sources)?;
        }
        if let Some(url) = get("LYRICS_CHART_URL") {
            cfg.chart_url = url;
        }

        Ok(cfg)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'")))
}

fn parse_sources(value: &str) -> Result<Vec<String>> {
    let sources: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if let Some(unknown) = sources.iter().find(|s| !DEFAULT_ORDER.contains(&s.as_str())) {
        return Err(Error::Config(format!(
            "unknown lyrics source '{unknown}', expected one of {}",
            DEFAULT_ORDER.join(", ")
        )));
    }
    if sources.is_empty() {
        return Err(Error::Config("LYRICS_SOURCES names no sources".into()));
    }
    Ok(sources)
}
