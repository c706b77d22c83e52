use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use crate::cache::{MemoryCache, StatsCache};
use crate::config::EngineConfig;
use crate::core::{DataOrigin, GameLogResponse, GameLogRow, PlayerIdentity, QuerySignature, Season, SeasonType};
use crate::error::{Result, StatsEngineError};
use crate::normalize::normalize;
use crate::providers::{FixtureProvider, NbaStatsProvider, StatsSource, FIXTURE_SOURCE};
use crate::resolver::PlayerDirectory;

/// One upstream fetch shared by every concurrent caller of a signature
type Flight = Arc<OnceCell<Result<GameLogResponse>>>;

/// Player game log pipeline: resolve → cache → fetch → normalize → cache
pub struct StatsEngine {
    directory: Arc<PlayerDirectory>,
    source: Arc<dyn StatsSource>,
    cache: Arc<dyn StatsCache>,
    options: EngineOptions,
    in_flight: Mutex<HashMap<QuerySignature, Flight>>,
    /// Provider display names by player id
    display_names: Mutex<HashMap<u32, String>>,
}

/// Game log query parameters
#[derive(Debug, Clone)]
pub struct GameLogQuery {
    pub player_name: String,
    pub season: Season,
    pub season_type: SeasonType,
    /// 0 = whole season
    pub last_n_games: u32,
    pub use_cache: bool,
}

impl GameLogQuery {
    pub fn new(player_name: impl Into<String>, season: Season) -> Self {
        Self {
            player_name: player_name.into(),
            season,
            season_type: SeasonType::default(),
            last_n_games: 0,
            use_cache: true,
        }
    }

    pub fn season_type(mut self, season_type: SeasonType) -> Self {
        self.season_type = season_type;
        self
    }

    pub fn last_n_games(mut self, last_n_games: u32) -> Self {
        self.last_n_games = last_n_games;
        self
    }

    /// `false` bypasses the cache for both lookup and store
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// Pipeline options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub single_flight: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
            single_flight: true,
        }
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            cache_enabled: config.cache_enabled,
            cache_ttl: config.cache_ttl(),
            single_flight: config.single_flight,
        }
    }
}

/// Recent games with the provider's display name for the player
#[derive(Debug, Clone, Serialize)]
pub struct RecentGames {
    pub player_name: String,
    pub player_id: u32,
    pub games: Vec<GameLogRow>,
    #[serde(skip)]
    pub simulated: bool,
}

impl StatsEngine {
    pub fn new(
        directory: PlayerDirectory,
        source: Arc<dyn StatsSource>,
        cache: Arc<dyn StatsCache>,
        options: EngineOptions,
    ) -> Self {
        Self {
            directory: Arc::new(directory),
            source,
            cache,
            options,
            in_flight: Mutex::new(HashMap::new()),
            display_names: Mutex::new(HashMap::new()),
        }
    }

    /// Build the engine described by `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let directory = match &config.players_file {
            Some(path) => PlayerDirectory::from_json_file(path)?,
            None => PlayerDirectory::known_players(),
        };

        let source: Arc<dyn StatsSource> = if config.use_fixture {
            tracing::warn!("⚠️ Fixture mode: serving SIMULATED game logs, not live data");
            Arc::new(FixtureProvider::default())
        } else {
            Arc::new(NbaStatsProvider::new(config)?)
        };

        let cache = Arc::new(MemoryCache::new(config.cache_capacity));

        tracing::info!(
            "✅ Stats engine ready: {} players, source={}, cache ttl={}s capacity={}",
            directory.len(),
            source.name(),
            config.cache_ttl_secs,
            config.cache_capacity
        );

        Ok(Self::new(directory, source, cache, EngineOptions::from(config)))
    }

    pub fn resolve_player(&self, name: &str) -> Result<PlayerIdentity> {
        self.directory.resolve(name)
    }

    /// Game log for a player/season, served from cache when fresh
    pub async fn game_log(&self, query: GameLogQuery) -> Result<GameLogResponse> {
        let start = Instant::now();

        let player = self.directory.resolve(&query.player_name)?;
        let key = QuerySignature::new(
            player.id,
            query.season.clone(),
            query.season_type,
            query.last_n_games,
        );
        let use_cache = self.options.cache_enabled && query.use_cache;

        if use_cache {
            if let Some(hit) = self.replay(&player, &key, start)? {
                return Ok(hit);
            }
        }

        if !(use_cache && self.options.single_flight) {
            return self.fetch_fresh(player, key, use_cache, start).await;
        }

        // Concurrent misses for one signature await the same fetch and
        // receive its outcome, failures included.
        let flight = self.flight(&key)?;
        let led = AtomicBool::new(false);
        let outcome = {
            let led = &led;
            let player = player.clone();
            let key = key.clone();
            flight
                .get_or_init(|| async move {
                    led.store(true, Ordering::SeqCst);
                    match self.replay(&player, &key, start) {
                        Ok(Some(hit)) => Ok(hit),
                        Ok(None) => self.fetch_fresh(player, key, true, start).await,
                        Err(e) => Err(e),
                    }
                })
                .await
        };

        let led = led.load(Ordering::SeqCst);
        if led {
            self.land(&key, &flight);
        }

        match outcome {
            Ok(response) if led => Ok(response.clone()),
            Ok(response) => {
                tracing::debug!("Joined in-flight fetch for {}", key);
                let mut shared = response.clone();
                shared.origin = DataOrigin::Cache;
                shared.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                Ok(shared)
            }
            Err(e) => Err(e.replicate()),
        }
    }

    /// Most recent games with the provider's display name for the player
    pub async fn recent_games(&self, player_name: &str, season: Season, last_n_games: u32) -> Result<RecentGames> {
        let log = self
            .game_log(GameLogQuery::new(player_name, season).last_n_games(last_n_games))
            .await?;

        let player_name = self.display_name(&log).await;

        Ok(RecentGames {
            player_name,
            player_id: log.player.id,
            simulated: log.is_simulated(),
            games: log.games,
        })
    }

    /// Provider display name, asked for at most once per player
    async fn display_name(&self, log: &GameLogResponse) -> String {
        let id = log.player.id;
        if let Some(name) = self.known_display_name(id) {
            return name;
        }

        // Cached game logs never wait on the provider
        if log.from_cache() {
            return log.player.name.clone();
        }

        match self.source.player_info(id).await {
            Ok(found) => {
                let name = found.unwrap_or_else(|| log.player.name.clone());
                if let Ok(mut names) = self.display_names.lock() {
                    names.insert(id, name.clone());
                }
                name
            }
            Err(e) => {
                tracing::warn!("Player info for {} unavailable: {}", log.player, e);
                log.player.name.clone()
            }
        }
    }

    fn known_display_name(&self, player_id: u32) -> Option<String> {
        self.display_names
            .lock()
            .ok()
            .and_then(|names| names.get(&player_id).cloned())
    }

    fn replay(&self, player: &PlayerIdentity, key: &QuerySignature, start: Instant) -> Result<Option<GameLogResponse>> {
        let Some(entry) = self.cache.get(key)? else {
            tracing::debug!("Cache miss for {}", key);
            return Ok(None);
        };

        tracing::debug!("Cache hit for {}", key);
        Ok(Some(GameLogResponse {
            player: player.clone(),
            season: key.season.clone(),
            season_type: key.season_type,
            last_n_games: key.last_n_games,
            games: entry.games.as_ref().clone(),
            origin: DataOrigin::Cache,
            source: self.source.name().to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            fetched_at: entry.cached_at,
        }))
    }

    async fn fetch_fresh(
        &self,
        player: PlayerIdentity,
        key: QuerySignature,
        use_cache: bool,
        start: Instant,
    ) -> Result<GameLogResponse> {
        let raw = self.source.fetch_game_log(&key).await?;
        let mut games = normalize(&raw)?;

        if key.last_n_games > 0 {
            games.truncate(key.last_n_games as usize);
        }

        if games.is_empty() {
            return Err(StatsEngineError::NoData(format!(
                "{} in {} {}",
                player.name, key.season, key.season_type
            )));
        }

        // Save to cache
        if use_cache {
            if let Err(e) = self.cache.put(key.clone(), games.clone(), self.options.cache_ttl) {
                tracing::warn!("Failed to save to cache: {}", e);
            }
        }

        let origin = if self.source.name() == FIXTURE_SOURCE {
            DataOrigin::Fixture
        } else {
            DataOrigin::Live
        };

        let response = GameLogResponse {
            player,
            season: key.season,
            season_type: key.season_type,
            last_n_games: key.last_n_games,
            games,
            origin,
            source: self.source.name().to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            fetched_at: Utc::now(),
        };

        tracing::info!("✅ {} ({:.1}ms)", response.display(), response.latency_ms);
        Ok(response)
    }

    fn flight(&self, key: &QuerySignature) -> Result<Flight> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| StatsEngineError::Cache("in-flight lock poisoned".to_string()))?;

        Ok(in_flight.entry(key.clone()).or_default().clone())
    }

    fn land(&self, key: &QuerySignature, flight: &Flight) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            if in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, flight)) {
                in_flight.remove(key);
            }
        }
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> Result<crate::cache::CacheStats> {
        self.cache.stats()
    }

    /// Drop expired cache entries
    pub fn cleanup_cache(&self) -> Result<u64> {
        self.cache.cleanup()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ResultSet;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source returning a fixed table and counting calls
    struct CountingSource {
        rows: usize,
        calls: AtomicUsize,
        info_calls: AtomicUsize,
        delay: Duration,
        fail: bool,
        display_name: Option<&'static str>,
    }

    impl CountingSource {
        fn new(rows: usize) -> Self {
            Self {
                rows,
                calls: AtomicUsize::new(0),
                info_calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
                display_name: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn info_calls(&self) -> usize {
            self.info_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsSource for CountingSource {
        async fn fetch_game_log(&self, _query: &QuerySignature) -> Result<ResultSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(StatsEngineError::upstream("stub", "HTTP 503 Service Unavailable"));
            }

            let rows = (0..self.rows)
                .map(|i| {
                    vec![
                        json!(format!("APR {:02}, 2024", 14 - i)),
                        json!("PHI vs. BOS"),
                        json!("W"),
                        json!(35),
                        json!(30 + i),
                        json!(10),
                        json!(5),
                        json!(1),
                        json!(2),
                        json!(0.5),
                    ]
                })
                .collect();

            Ok(ResultSet::new(
                "PlayerGameLog",
                &["GAME_DATE", "MATCHUP", "WL", "MIN", "PTS", "REB", "AST", "STL", "BLK", "FG_PCT"],
                rows,
            ))
        }

        async fn player_info(&self, _player_id: u32) -> Result<Option<String>> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.display_name.map(str::to_string))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn engine(source: Arc<CountingSource>, options: EngineOptions) -> StatsEngine {
        StatsEngine::new(
            PlayerDirectory::known_players(),
            source,
            Arc::new(MemoryCache::new(16)),
            options,
        )
    }

    fn query(name: &str) -> GameLogQuery {
        GameLogQuery::new(name, Season::parse("2023-24").unwrap())
    }

    #[tokio::test]
    async fn test_second_request_hits_cache() {
        let source = Arc::new(CountingSource::new(2));
        let engine = engine(source.clone(), EngineOptions::default());

        let fresh = engine.game_log(query("Joel Embiid")).await.unwrap();
        assert_eq!(fresh.origin, DataOrigin::Live);
        assert_eq!(fresh.games.len(), 2);

        // Different spelling, same player, same signature
        let cached = engine.game_log(query("  joel   EMBIID ")).await.unwrap();
        assert!(cached.from_cache());
        assert_eq!(cached.games, fresh.games);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_signature_components_separate_entries() {
        let source = Arc::new(CountingSource::new(2));
        let engine = engine(source.clone(), EngineOptions::default());

        engine.game_log(query("Joel Embiid")).await.unwrap();
        engine
            .game_log(query("Joel Embiid").season_type(SeasonType::Playoffs))
            .await
            .unwrap();
        engine.game_log(query("Joel Embiid").last_n_games(1)).await.unwrap();

        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_fetches() {
        let source = Arc::new(CountingSource::new(2));
        let options = EngineOptions {
            cache_enabled: false,
            ..EngineOptions::default()
        };
        let engine = engine(source.clone(), options);

        engine.game_log(query("Joel Embiid")).await.unwrap();
        engine.game_log(query("Joel Embiid")).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_player_skips_fetch() {
        let source = Arc::new(CountingSource::new(2));
        let engine = engine(source.clone(), EngineOptions::default());

        let err = engine.game_log(query("Nonexistent Player XYZ")).await.unwrap_err();
        assert!(matches!(err, StatsEngineError::PlayerNotFound(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_upstream_is_no_data_and_not_cached() {
        let source = Arc::new(CountingSource::new(0));
        let engine = engine(source.clone(), EngineOptions::default());

        for _ in 0..2 {
            let err = engine.game_log(query("Joel Embiid")).await.unwrap_err();
            assert!(matches!(err, StatsEngineError::NoData(_)));
        }
        assert_eq!(source.calls(), 2);
        assert_eq!(engine.cache_stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_last_n_games_truncates() {
        let source = Arc::new(CountingSource::new(5));
        let engine = engine(source, EngineOptions::default());

        let response = engine.game_log(query("Joel Embiid").last_n_games(3)).await.unwrap();
        assert_eq!(response.games.len(), 3);
        assert_eq!(response.games[0].game_date, "2024-04-14");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let source = Arc::new(CountingSource::new(1));
        let options = EngineOptions {
            cache_ttl: Duration::from_secs(30),
            ..EngineOptions::default()
        };
        let engine = engine(source.clone(), options);

        engine.game_log(query("Joel Embiid")).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let refreshed = engine.game_log(query("Joel Embiid")).await.unwrap();

        assert_eq!(refreshed.origin, DataOrigin::Live);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_shares_one_fetch() {
        let source = Arc::new(CountingSource {
            delay: Duration::from_millis(50),
            ..CountingSource::new(2)
        });
        let engine = engine(source.clone(), EngineOptions::default());

        let (a, b, c) = tokio::join!(
            engine.game_log(query("Joel Embiid")),
            engine.game_log(query("Joel Embiid")),
            engine.game_log(query("joel embiid")),
        );

        let origins = [a.unwrap().origin, b.unwrap().origin, c.unwrap().origin];
        assert_eq!(source.calls(), 1);
        assert_eq!(origins.iter().filter(|o| **o == DataOrigin::Cache).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_shares_failures() {
        let source = Arc::new(CountingSource {
            delay: Duration::from_secs(30),
            fail: true,
            ..CountingSource::new(2)
        });
        let engine = engine(source.clone(), EngineOptions::default());
        let started = tokio::time::Instant::now();

        let results = tokio::join!(
            engine.game_log(query("Joel Embiid")),
            engine.game_log(query("Joel Embiid")),
            engine.game_log(query("joel embiid")),
            engine.game_log(query("Embiid")),
            engine.game_log(query("JOEL EMBIID")),
        );

        assert_eq!(source.calls(), 1);
        assert!(started.elapsed() < Duration::from_secs(31));
        for result in [results.0, results.1, results.2, results.3, results.4] {
            let err = result.unwrap_err();
            assert!(matches!(err, StatsEngineError::Upstream { .. }), "{err}");
            assert!(err.to_string().contains("HTTP 503"));
        }

        // Failures are not remembered once the flight lands
        assert!(engine.game_log(query("Joel Embiid")).await.is_err());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_bypassing_cache_per_query() {
        let source = Arc::new(CountingSource::new(2));
        let engine = engine(source.clone(), EngineOptions::default());

        engine.game_log(query("Joel Embiid")).await.unwrap();
        let fresh = engine
            .game_log(query("Joel Embiid").use_cache(false))
            .await
            .unwrap();

        assert_eq!(fresh.origin, DataOrigin::Live);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_recent_games_asks_for_display_name_once() {
        let source = Arc::new(CountingSource {
            display_name: Some("Joel Embiid (PHI)"),
            ..CountingSource::new(4)
        });
        let engine = engine(source.clone(), EngineOptions::default());

        for _ in 0..2 {
            let recent = engine
                .recent_games("embiid", Season::parse("2023-24").unwrap(), 2)
                .await
                .unwrap();
            assert_eq!(recent.player_name, "Joel Embiid (PHI)");
        }

        assert_eq!(source.calls(), 1);
        assert_eq!(source.info_calls(), 1);
    }

    #[tokio::test]
    async fn test_recent_games_falls_back_to_directory_name() {
        let source = Arc::new(CountingSource::new(4));
        let engine = engine(source, EngineOptions::default());

        let recent = engine
            .recent_games("lebron", Season::parse("2023-24").unwrap(), 2)
            .await
            .unwrap();

        assert_eq!(recent.player_name, "LeBron James");
        assert_eq!(recent.player_id, 2544);
        assert_eq!(recent.games.len(), 2);
        assert!(!recent.simulated);
    }

    #[tokio::test]
    async fn test_fixture_mode_from_config() {
        let config = EngineConfig {
            use_fixture: true,
            ..EngineConfig::default()
        };
        let engine = StatsEngine::from_config(&config).unwrap();
        assert_eq!(engine.source_name(), FIXTURE_SOURCE);

        let response = engine.game_log(query("Nikola Jokic")).await.unwrap();
        assert_eq!(response.origin, DataOrigin::Fixture);
        assert!(response.is_simulated());
        assert!(!response.games.is_empty());
    }
}
