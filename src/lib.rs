//! # Hoopstats Engine
//!
//! Basketball player game logs, re-exposed as stable JSON:
//! - Free-text player name resolution against a player directory
//! - Live stats provider client with bounded retries (or simulated fixtures)
//! - Projection of upstream tables onto a fixed game log schema
//! - In-memory TTL cache keyed by the full query signature
//! - Optional axum HTTP adapter (`server` feature)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hoopstats_engine::{EngineConfig, GameLogQuery, Season, StatsEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = StatsEngine::from_config(&EngineConfig::default())?;
//!
//!     let log = engine
//!         .game_log(GameLogQuery::new("Joel Embiid", Season::parse("2023-24")?))
//!         .await?;
//!
//!     println!("{} games for {}", log.games.len(), log.player.name);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod providers;
pub mod resolver;

#[cfg(feature = "server")]
pub mod api;

// Re-export primary types
pub use cache::{MemoryCache, StatsCache};
pub use config::EngineConfig;
pub use crate::core::{DataOrigin, GameLogResponse, GameLogRow, PlayerIdentity, QuerySignature, Season, SeasonType};
pub use engine::{EngineOptions, GameLogQuery, RecentGames, StatsEngine};
pub use error::{Result, StatsEngineError};
pub use resolver::PlayerDirectory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
