use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoopstats_engine::{api, EngineConfig, StatsEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoopstats_server=debug,hoopstats_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env()?;

    tracing::info!("🚀 Starting Hoopstats Server v{}", hoopstats_engine::VERSION);
    tracing::info!("🏀 Upstream: {}", if config.use_fixture { "fixture" } else { config.base_url.as_str() });
    tracing::info!("🔌 Port: {}", config.port);

    let engine = Arc::new(StatsEngine::from_config(&config)?);
    let app = api::router(engine, config.default_season()?);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("📡 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
