use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{GameLogRow, PlayerIdentity, Season, SeasonType};

/// Where a response's rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Fresh upstream fetch
    Live,
    /// Replayed from the in-memory cache
    Cache,
    /// Simulated fixture data (never live)
    Fixture,
}

/// Game log response with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLogResponse {
    /// Resolved player
    pub player: PlayerIdentity,

    pub season: Season,

    pub season_type: SeasonType,

    /// 0 = whole season
    pub last_n_games: u32,

    /// Normalized rows, most recent first
    pub games: Vec<GameLogRow>,

    pub origin: DataOrigin,

    /// Name of the stats source that produced the rows
    pub source: String,

    /// Pipeline latency in milliseconds
    pub latency_ms: f64,

    /// When the rows were fetched from the source
    pub fetched_at: DateTime<Utc>,
}

impl GameLogResponse {
    pub fn from_cache(&self) -> bool {
        self.origin == DataOrigin::Cache
    }

    pub fn is_simulated(&self) -> bool {
        self.source == crate::providers::FIXTURE_SOURCE
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        format!(
            "{} {} {} - {} games ({:?} via {})",
            self.player, self.season, self.season_type,
            self.games.len(),
            self.origin,
            self.source
        )
    }
}
