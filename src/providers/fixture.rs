use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::core::{QuerySignature, SeasonType};
use crate::error::Result;
use crate::providers::result_set::ResultSet;
use crate::providers::{StatsSource, FIXTURE_SOURCE};

/// Upstream game log columns, in upstream order
pub const GAME_LOG_HEADERS: &[&str] = &[
    "SEASON_ID", "Player_ID", "Game_ID", "GAME_DATE", "MATCHUP", "WL", "MIN",
    "FGM", "FGA", "FG_PCT", "FG3M", "FG3A", "FG3_PCT", "FTM", "FTA", "FT_PCT",
    "OREB", "DREB", "REB", "AST", "STL", "BLK", "TOV", "PF", "PTS", "PLUS_MINUS",
    "VIDEO_AVAILABLE",
];

const OPPONENTS: &[&str] = &[
    "BOS", "NYK", "MIL", "MIA", "CLE", "ORL", "IND", "CHI", "ATL", "TOR",
    "DEN", "LAL", "GSW", "PHX", "DAL", "MIN", "OKC", "SAC",
];

/// Simulated game logs for running without the live provider.
///
/// Output is deterministic per query and is always reported under the
/// `fixture` source name.
pub struct FixtureProvider {
    games_per_season: u32,
}

/// Small deterministic generator (64-bit LCG)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn range(&mut self, low: u64, high: u64) -> u64 {
        low + self.next() % (high - low + 1)
    }
}

impl FixtureProvider {
    pub fn new(games_per_season: u32) -> Self {
        Self { games_per_season }
    }

    fn last_game_date(query: &QuerySignature) -> NaiveDate {
        let end_year = query.season.start_year() + 1;
        let (month, day) = match query.season_type {
            SeasonType::PreSeason => (10, 20),
            SeasonType::AllStar => (2, 18),
            SeasonType::PlayIn => (4, 19),
            SeasonType::Playoffs => (5, 30),
            SeasonType::RegularSeason => (4, 14),
        };
        let year = if query.season_type == SeasonType::PreSeason {
            end_year - 1
        } else {
            end_year
        };

        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    fn game_count(&self, query: &QuerySignature) -> u32 {
        let season_games = match query.season_type {
            SeasonType::AllStar => 1,
            SeasonType::PlayIn => 2,
            _ => self.games_per_season,
        };

        if query.last_n_games > 0 {
            season_games.min(query.last_n_games)
        } else {
            season_games
        }
    }

    /// Build the simulated table, most recent game first
    pub fn generate(&self, query: &QuerySignature) -> ResultSet {
        let mut rng = Lcg(u64::from(query.player_id) ^ (query.season.start_year() as u64) << 32);
        let last_date = Self::last_game_date(query);

        let rows = (0..self.game_count(query))
            .map(|i| {
                let date = last_date - Duration::days(2 * i64::from(i));
                let opponent = OPPONENTS[(query.player_id as usize + i as usize) % OPPONENTS.len()];
                let matchup = if i % 2 == 0 {
                    format!("PHI vs. {}", opponent)
                } else {
                    format!("PHI @ {}", opponent)
                };

                let fga = rng.range(10, 25);
                let fgm = rng.range(fga / 3, fga * 3 / 5);
                let fg3a = rng.range(1, 8);
                let fg3m = rng.range(0, fg3a.min(fgm));
                let fta = rng.range(2, 14);
                let ftm = rng.range(fta / 2, fta);
                let oreb = rng.range(0, 4);
                let dreb = rng.range(2, 10);
                let pts = 2 * (fgm - fg3m) + 3 * fg3m + ftm;
                let plus_minus = rng.range(0, 30) as i64 - 15;

                row(vec![
                    json!(format!("2{}", query.season.start_year())),
                    json!(query.player_id),
                    json!(format!("00{:08}", 22300000 + i)),
                    json!(date.format("%b %d, %Y").to_string().to_uppercase()),
                    json!(matchup),
                    json!(if plus_minus >= 0 { "W" } else { "L" }),
                    json!(rng.range(24, 40)),
                    json!(fgm),
                    json!(fga),
                    pct(fgm, fga),
                    json!(fg3m),
                    json!(fg3a),
                    pct(fg3m, fg3a),
                    json!(ftm),
                    json!(fta),
                    pct(ftm, fta),
                    json!(oreb),
                    json!(dreb),
                    json!(oreb + dreb),
                    json!(rng.range(0, 10)),
                    json!(rng.range(0, 3)),
                    json!(rng.range(0, 4)),
                    json!(rng.range(0, 5)),
                    json!(rng.range(0, 5)),
                    json!(pts),
                    json!(plus_minus),
                    json!(1),
                ])
            })
            .collect();

        ResultSet::new("PlayerGameLog", GAME_LOG_HEADERS, rows)
    }
}

fn row(values: Vec<Value>) -> Vec<Value> {
    debug_assert_eq!(values.len(), GAME_LOG_HEADERS.len());
    values
}

/// Upstream style fraction with three decimals
fn pct(made: u64, attempted: u64) -> Value {
    if attempted == 0 {
        return json!(0.0);
    }
    let fraction = made as f64 / attempted as f64;
    json!((fraction * 1000.0).round() / 1000.0)
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self::new(20)
    }
}

#[async_trait]
impl StatsSource for FixtureProvider {
    async fn fetch_game_log(&self, query: &QuerySignature) -> Result<ResultSet> {
        tracing::debug!("🧪 Serving fixture game log for {}", query);
        Ok(self.generate(query))
    }

    fn name(&self) -> &str {
        FIXTURE_SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Season;

    fn query(last_n_games: u32) -> QuerySignature {
        QuerySignature::new(
            203954,
            Season::parse("2023-24").unwrap(),
            SeasonType::RegularSeason,
            last_n_games,
        )
    }

    #[test]
    fn test_deterministic() {
        let provider = FixtureProvider::default();
        assert_eq!(provider.generate(&query(0)), provider.generate(&query(0)));
    }

    #[test]
    fn test_shape_and_order() {
        let provider = FixtureProvider::default();
        let set = provider.generate(&query(0));

        assert_eq!(set.len(), 20);
        let records = set.records().unwrap();
        assert_eq!(records[0]["GAME_DATE"], json!("APR 14, 2024"));
        assert_eq!(records[1]["GAME_DATE"], json!("APR 12, 2024"));
    }

    #[test]
    fn test_last_n_games_limits_rows() {
        let provider = FixtureProvider::default();
        assert_eq!(provider.generate(&query(5)).len(), 5);
        assert_eq!(provider.generate(&query(500)).len(), 20);
    }

    #[tokio::test]
    async fn test_source_name() {
        let provider = FixtureProvider::default();
        assert_eq!(provider.name(), FIXTURE_SOURCE);
        assert!(provider.player_info(203954).await.unwrap().is_none());
    }
}
