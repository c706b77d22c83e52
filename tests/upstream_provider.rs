#![cfg(feature = "server")]

//! `NbaStatsProvider` against a local HTTP stand-in for the stats provider.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hoopstats_engine::providers::{NbaStatsProvider, StatsSource};
use hoopstats_engine::{EngineConfig, QuerySignature, Season, SeasonType};

const GAME_LOG_BODY: &str = r#"{
    "resource": "playergamelog",
    "parameters": {"PlayerID": 203954},
    "resultSets": [{
        "name": "PlayerGameLog",
        "headers": ["GAME_DATE", "MATCHUP", "WL", "MIN", "PTS", "REB", "AST", "STL", "BLK"],
        "rowSet": [
            ["APR 14, 2024", "PHI vs. BKN", "W", 34, 32, 13, 7, 1, 2],
            ["APR 12, 2024", "PHI vs. ORL", "W", 33, 25, 11, 6, 0, 1],
            ["APR 09, 2024", "PHI @ DET", "W", 30, 29, 9, 4, 1, 3]
        ]
    }]
}"#;

const PLAYER_INFO_BODY: &str = r#"{
    "resource": "commonplayerinfo",
    "resultSets": [
        {
            "name": "CommonPlayerInfo",
            "headers": ["PERSON_ID", "FIRST_NAME", "LAST_NAME", "DISPLAY_FIRST_LAST", "TEAM_ABBREVIATION"],
            "rowSet": [[203954, "Joel", "Embiid", "Joel Embiid", "PHI"]]
        },
        {
            "name": "PlayerHeadlineStats",
            "headers": ["PLAYER_ID", "PLAYER_NAME", "PTS"],
            "rowSet": [[203954, "Joel Embiid", 34.7]]
        }
    ]
}"#;

#[derive(Clone)]
struct Upstream {
    requests: Arc<AtomicUsize>,
    /// Number of leading requests answered with `failure_status`
    failures: usize,
    failure_status: StatusCode,
}

async fn game_log(State(upstream): State<Upstream>, headers: HeaderMap) -> Response {
    let seen = upstream.requests.fetch_add(1, Ordering::SeqCst);

    if headers.get("referer").and_then(|v| v.to_str().ok()) != Some("https://www.nba.com/") {
        return StatusCode::FORBIDDEN.into_response();
    }
    if seen < upstream.failures {
        return upstream.failure_status.into_response();
    }

    ([("content-type", "application/json")], GAME_LOG_BODY).into_response()
}

async fn player_info(headers: HeaderMap) -> Response {
    if headers.get("referer").is_none() {
        return StatusCode::FORBIDDEN.into_response();
    }
    ([("content-type", "application/json")], PLAYER_INFO_BODY).into_response()
}

async fn spawn_upstream(failures: usize, failure_status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let requests = Arc::new(AtomicUsize::new(0));
    let state = Upstream {
        requests: requests.clone(),
        failures,
        failure_status,
    };

    let app = Router::new()
        .route("/stats/playergamelog", get(game_log))
        .route("/stats/commonplayerinfo", get(player_info))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/stats", addr), requests)
}

fn provider(base_url: String) -> NbaStatsProvider {
    let config = EngineConfig {
        base_url,
        max_retries: 2,
        retry_backoff_ms: 1,
        ..EngineConfig::default()
    };
    NbaStatsProvider::new(&config).unwrap()
}

fn query(last_n_games: u32) -> QuerySignature {
    QuerySignature::new(
        203954,
        Season::parse("2023-24").unwrap(),
        SeasonType::RegularSeason,
        last_n_games,
    )
}

#[tokio::test]
async fn test_fetch_sends_identifying_headers() {
    let (base_url, requests) = spawn_upstream(0, StatusCode::OK).await;

    let result = provider(base_url).fetch_game_log(&query(0)).await.unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.name, "PlayerGameLog");
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_last_n_games_caps_rows() {
    let (base_url, _) = spawn_upstream(0, StatusCode::OK).await;

    let result = provider(base_url).fetch_game_log(&query(2)).await.unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let (base_url, requests) = spawn_upstream(2, StatusCode::SERVICE_UNAVAILABLE).await;

    let result = provider(base_url).fetch_game_log(&query(0)).await.unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (base_url, requests) = spawn_upstream(10, StatusCode::SERVICE_UNAVAILABLE).await;

    let err = provider(base_url).fetch_game_log(&query(0)).await.unwrap_err();
    assert!(err.to_string().contains("503"), "{err}");
    assert_eq!(requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (base_url, requests) = spawn_upstream(10, StatusCode::BAD_REQUEST).await;

    let err = provider(base_url).fetch_game_log(&query(0)).await.unwrap_err();
    assert!(err.to_string().contains("400"), "{err}");
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_path_is_error() {
    let (base_url, _) = spawn_upstream(0, StatusCode::OK).await;
    // Valid server, unknown path
    let err = provider(base_url.replace("/stats", "/missing"))
        .fetch_game_log(&query(0))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404"), "{err}");
}

#[tokio::test]
async fn test_player_info_reads_display_name() {
    let (base_url, requests) = spawn_upstream(0, StatusCode::OK).await;

    let name = provider(base_url).player_info(203954).await.unwrap();
    assert_eq!(name.as_deref(), Some("Joel Embiid"));
    // Game log route untouched
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}
