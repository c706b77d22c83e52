//! Thin axum adapter over [`StatsEngine`].

use axum::{
    extract::{rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::{Season, SeasonType};
use crate::engine::{GameLogQuery, StatsEngine};
use crate::error::StatsEngineError;

/// Games returned by the recent-games endpoint when none are requested
const DEFAULT_RECENT_GAMES: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<StatsEngine>,
    pub default_season: Season,
}

/// Raw query parameters; validated by hand so every failure is a JSON 400
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    name: Option<String>,
    season: Option<String>,
    season_type: Option<String>,
    last_n_games: Option<String>,
    use_cache: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct CleanupResponse {
    removed: u64,
}

/// Build the application router
pub fn router(engine: Arc<StatsEngine>, default_season: Season) -> Router {
    let state = AppState {
        engine,
        default_season,
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/player-stats", get(player_stats_handler))
        .route("/api/py/player-stats", get(player_stats_handler))
        .route("/api/player/recent", get(recent_games_handler))
        .route("/v1/stats", get(stats_handler))
        .route("/v1/cache/cleanup", post(cleanup_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn required_name(params: &StatsParams) -> Result<String, StatsEngineError> {
    params
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StatsEngineError::Validation("missing required query parameter 'name'".into()))
}

fn season_or_default(params: &StatsParams, default_season: &Season) -> Result<Season, StatsEngineError> {
    match params.season.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(season) => Season::parse(season),
        None => Ok(default_season.clone()),
    }
}

fn last_n_games(params: &StatsParams, default: u32) -> Result<u32, StatsEngineError> {
    match params.last_n_games.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            StatsEngineError::Validation(format!(
                "last_n_games must be a non-negative integer, got '{}'",
                raw
            ))
        }),
        None => Ok(default),
    }
}

fn use_cache(params: &StatsParams) -> Result<bool, StatsEngineError> {
    match params.use_cache.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(true),
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(StatsEngineError::Validation(format!(
                "use_cache must be true or false, got '{}'",
                raw
            ))),
        },
    }
}

/// Validate raw parameters into a game log query
pub fn parse_query(params: &StatsParams, default_season: &Season) -> Result<GameLogQuery, StatsEngineError> {
    let season_type = match params.season_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<SeasonType>()?,
        None => SeasonType::default(),
    };

    Ok(GameLogQuery::new(required_name(params)?, season_or_default(params, default_season)?)
        .season_type(season_type)
        .last_n_games(last_n_games(params, 0)?)
        .use_cache(use_cache(params)?))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        source: state.engine.source_name().to_string(),
    })
}

async fn player_stats_handler(
    State(state): State<AppState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| StatsEngineError::Validation(e.body_text()))?;
    let query = parse_query(&params, &state.default_season)?;
    tracing::debug!("Player stats request: {:?}", query);

    let log = state.engine.game_log(query).await?;

    let data_source = if log.is_simulated() { "fixture" } else { "live" };
    let cache_status = if log.from_cache() { "HIT" } else { "MISS" };

    Ok((
        [("x-data-source", data_source), ("x-cache", cache_status)],
        Json(log.games),
    )
        .into_response())
}

async fn recent_games_handler(
    State(state): State<AppState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| StatsEngineError::Validation(e.body_text()))?;
    let name = required_name(&params)?;
    let season = season_or_default(&params, &state.default_season)?;
    let limit = match last_n_games(&params, DEFAULT_RECENT_GAMES)? {
        0 => DEFAULT_RECENT_GAMES,
        n => n,
    };

    let recent = state.engine.recent_games(&name, season, limit).await?;
    let data_source = if recent.simulated { "fixture" } else { "live" };

    Ok(([("x-data-source", data_source)], Json(recent)).into_response())
}

async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<crate::cache::CacheStats>, AppError> {
    Ok(Json(state.engine.cache_stats()?))
}

async fn cleanup_handler(State(state): State<AppState>) -> Result<Json<CleanupResponse>, AppError> {
    let removed = state.engine.cleanup_cache()?;
    tracing::info!("🧹 Removed {} expired cache entries", removed);
    Ok(Json(CleanupResponse { removed }))
}

// Error handling
pub struct AppError(StatsEngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::error!("❌ Error: {} - {}", status, message);
        } else {
            tracing::debug!("Rejected: {} - {}", status, message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<StatsEngineError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
