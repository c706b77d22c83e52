pub mod fixture;
pub mod nba;
pub mod result_set;

use async_trait::async_trait;
use crate::core::QuerySignature;
use crate::error::Result;

pub use fixture::FixtureProvider;
pub use nba::NbaStatsProvider;
pub use result_set::{ResultSet, StatsPayload};

/// Source name reported by the simulated fixture provider
pub const FIXTURE_SOURCE: &str = "fixture";

/// Trait for stats data sources (live provider, fixtures, test stubs)
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch the raw game log table for a player/season query.
    ///
    /// `last_n_games = 0` means the whole season; otherwise the N most
    /// recent games, most recent first.
    async fn fetch_game_log(&self, query: &QuerySignature) -> Result<ResultSet>;

    /// Provider-side display name for a player, if the source has one
    async fn player_info(&self, _player_id: u32) -> Result<Option<String>> {
        Ok(None)
    }

    /// Get source name
    fn name(&self) -> &str;
}
