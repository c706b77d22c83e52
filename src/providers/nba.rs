use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::core::QuerySignature;
use crate::error::{Result, StatsEngineError};
use crate::providers::result_set::{ResultSet, StatsPayload};
use crate::providers::StatsSource;

const SOURCE_NAME: &str = "nba-stats";

/// Live stats.nba.com provider
pub struct NbaStatsProvider {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

/// One failed attempt and whether retrying may help
struct AttemptFailure {
    transient: bool,
    error: StatsEngineError,
}

impl AttemptFailure {
    fn fatal(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            error: StatsEngineError::upstream(SOURCE_NAME, message),
        }
    }

    fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            error: StatsEngineError::upstream(SOURCE_NAME, message),
        }
    }
}

impl NbaStatsProvider {
    /// Create new provider from engine config
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let headers = build_headers(&config.upstream_headers)?;

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Game log endpoint URL for a query
    fn game_log_url(&self, query: &QuerySignature) -> String {
        format!(
            "{}/playergamelog?PlayerID={}&Season={}&SeasonType={}&LastNGames={}",
            self.base_url,
            query.player_id,
            urlencoding::encode(query.season.as_str()),
            urlencoding::encode(query.season_type.as_str()),
            query.last_n_games
        )
    }

    fn player_info_url(&self, player_id: u32) -> String {
        format!(
            "{}/commonplayerinfo?PlayerID={}&LeagueID=00",
            self.base_url, player_id
        )
    }

    /// GET with bounded retries on transient failures
    async fn get_body(&self, url: &str) -> Result<String> {
        let mut attempt: u32 = 0;

        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(failure) if failure.transient && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff * attempt;
                    tracing::warn!(
                        "⚠️ {} attempt {}/{} failed: {} (retrying in {:?})",
                        SOURCE_NAME,
                        attempt,
                        self.max_retries + 1,
                        failure.error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn get_once(&self, url: &str) -> std::result::Result<String, AttemptFailure> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            let message = format!("Request failed: {}", e);
            if e.is_timeout() || e.is_connect() {
                AttemptFailure::transient(message)
            } else {
                AttemptFailure::fatal(message)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("HTTP {}", status);
            return Err(if is_transient_status(status) {
                AttemptFailure::transient(message)
            } else {
                AttemptFailure::fatal(message)
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptFailure::fatal(format!("Failed reading body: {}", e)))?;

        if body.trim().is_empty() {
            return Err(AttemptFailure::fatal("empty response body"));
        }

        Ok(body)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn build_headers(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| StatsEngineError::Config(format!("invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| StatsEngineError::Config(format!("invalid value for header '{}': {}", name, e)))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

#[async_trait]
impl StatsSource for NbaStatsProvider {
    async fn fetch_game_log(&self, query: &QuerySignature) -> Result<ResultSet> {
        let body = self.get_body(&self.game_log_url(query)).await?;

        let mut result_set = StatsPayload::parse(&body, SOURCE_NAME)?
            .into_result_set("PlayerGameLog")
            .ok_or_else(|| StatsEngineError::upstream(SOURCE_NAME, "response has no result sets"))?;

        if query.last_n_games > 0 {
            result_set.row_set.truncate(query.last_n_games as usize);
        }

        tracing::info!("📥 {} → {} rows for {}", SOURCE_NAME, result_set.len(), query);
        Ok(result_set)
    }

    async fn player_info(&self, player_id: u32) -> Result<Option<String>> {
        let body = self.get_body(&self.player_info_url(player_id)).await?;

        let Some(info) = StatsPayload::parse(&body, SOURCE_NAME)?.into_result_set("CommonPlayerInfo")
        else {
            return Ok(None);
        };

        let name = info
            .records()?
            .into_iter()
            .next()
            .and_then(|record| record.get("DISPLAY_FIRST_LAST").cloned())
            .and_then(|value| value.as_str().map(str::to_string));

        Ok(name)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
