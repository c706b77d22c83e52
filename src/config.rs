//! Engine configuration.
//!
//! Every field has a working default. [`EngineConfig::from_env`] overlays
//! environment variables; [`EngineConfig::from_lookup`] does the same from
//! any key lookup so configuration can be tested without touching the
//! process environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::Season;
use crate::error::{Result, StatsEngineError};

/// Identifying headers the stats provider expects from a browser
const DEFAULT_UPSTREAM_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Connection", "keep-alive"),
    ("Origin", "https://www.nba.com"),
    ("Referer", "https://www.nba.com/"),
    ("sec-ch-ua", "\"Not A(Brand\";v=\"99\", \"Google Chrome\";v=\"121\", \"Chromium\";v=\"121\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-site"),
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// HTTP listen port (server binary only)
    pub port: u16,

    /// Stats provider base URL, without trailing slash
    pub base_url: String,

    /// Per-request upstream timeout in seconds
    pub upstream_timeout_secs: u64,

    /// Extra attempts for transient upstream failures
    pub max_retries: u32,

    /// Base delay between retries in milliseconds (multiplied by attempt)
    pub retry_backoff_ms: u64,

    /// Headers sent with every upstream request
    pub upstream_headers: Vec<(String, String)>,

    pub cache_enabled: bool,

    pub cache_ttl_secs: u64,

    /// Maximum cached query signatures
    pub cache_capacity: usize,

    /// At most one in-flight upstream fetch per query signature
    pub single_flight: bool,

    /// Serve simulated fixture data instead of the live provider
    pub use_fixture: bool,

    /// Season used when a request omits one
    pub default_season: String,

    /// Optional JSON player directory replacing the built-in one
    pub players_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: 8090,
            base_url: "https://stats.nba.com/stats".to_string(),
            upstream_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            upstream_headers: DEFAULT_UPSTREAM_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cache_enabled: true,
            cache_ttl_secs: 3600,
            cache_capacity: 1000,
            single_flight: true,
            use_fixture: false,
            default_season: "2023-24".to_string(),
            players_file: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns per variable name
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        set_parsed(&lookup, "PORT", &mut config.port)?;
        set_parsed(&lookup, "UPSTREAM_TIMEOUT_SECS", &mut config.upstream_timeout_secs)?;
        set_parsed(&lookup, "UPSTREAM_MAX_RETRIES", &mut config.max_retries)?;
        set_parsed(&lookup, "UPSTREAM_RETRY_BACKOFF_MS", &mut config.retry_backoff_ms)?;
        set_parsed(&lookup, "CACHE_TTL_SECS", &mut config.cache_ttl_secs)?;
        set_parsed(&lookup, "CACHE_CAPACITY", &mut config.cache_capacity)?;

        set_flag(&lookup, "CACHE_ENABLED", &mut config.cache_enabled)?;
        set_flag(&lookup, "SINGLE_FLIGHT", &mut config.single_flight)?;
        set_flag(&lookup, "USE_FIXTURE", &mut config.use_fixture)?;

        if let Some(url) = non_empty(&lookup, "NBA_STATS_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(season) = non_empty(&lookup, "DEFAULT_SEASON") {
            config.default_season = season;
        }
        if let Some(path) = non_empty(&lookup, "PLAYERS_FILE") {
            config.players_file = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Season::parse(&self.default_season)
            .map_err(|e| StatsEngineError::Config(format!("DEFAULT_SEASON: {}", e)))?;

        if self.cache_capacity == 0 {
            return Err(StatsEngineError::Config("CACHE_CAPACITY must be at least 1".into()));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(StatsEngineError::Config("UPSTREAM_TIMEOUT_SECS must be at least 1".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(StatsEngineError::Config(format!(
                "NBA_STATS_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn default_season(&self) -> Result<Season> {
        Season::parse(&self.default_season)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn set_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = non_empty(lookup, key) {
        *target = raw
            .parse()
            .map_err(|_| StatsEngineError::Config(format!("{} has invalid value '{}'", key, raw)))?;
    }
    Ok(())
}

fn set_flag<F>(lookup: &F, key: &str, target: &mut bool) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = non_empty(lookup, key) {
        *target = match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(StatsEngineError::Config(format!(
                    "{} must be a boolean, got '{}'",
                    key, raw
                )))
            }
        };
    }
    Ok(())
}
