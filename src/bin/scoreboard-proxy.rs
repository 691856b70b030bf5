//! Same-origin scoreboard endpoint: `GET /api/scoreboard?week=&year=` answers with
//! normalized games from Tank01 (when keyed) or ESPN.

use anyhow::anyhow;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, serve};
use chrono::Utc;
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, error, info, warn};
use nflwins_api::MAX_WEEK;
use nflwins_api::client::{GameFeed, HttpClient};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_BIND: &str = "0.0.0.0:5174";
const CACHE_CONTROL: &str = "public, s-maxage=60";

struct ProxyState {
    feed: GameFeed,
}

#[derive(Debug, Deserialize)]
struct ScoreboardParams {
    week: Option<String>,
    year: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logger(std::env::var("RUST_LOG").ok())?;

    let bind = std::env::var("NFLWINS_PROXY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| anyhow!("error binding to {bind}: {e}"))?;

    let feed = GameFeed::upstream_from_env(HttpClient::new());
    info!("upstream sources: {}", feed.source_names().join(" -> "));
    info!("listening on http://{bind}");

    serve(listener, app(feed)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

fn app(feed: GameFeed) -> Router {
    let cors = CorsLayer::new().allow_methods([Method::GET]).allow_origin(Any);

    Router::new()
        .route("/api/scoreboard", get(scoreboard))
        .route("/health", get(health))
        .with_state(Arc::new(ProxyState { feed }))
        .layer(cors)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn scoreboard(State(state): State<Arc<ProxyState>>, Query(params): Query<ScoreboardParams>) -> Response {
    let (week, year) = match parse_params(&params) {
        Ok(parsed) => parsed,
        Err(message) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response(),
    };

    match state.feed.try_fetch_week(year, week).await {
        Ok(games) => {
            info!("{year} week {week}: {} games", games.len());
            let mut response = Json(games).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
            response
        }
        Err(e) => {
            warn!("{year} week {week}: every upstream failed: {e}");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

fn parse_params(params: &ScoreboardParams) -> Result<(u8, i32), String> {
    let (Some(week), Some(year)) = (params.week.as_deref(), params.year.as_deref()) else {
        return Err("week and year are required".to_string());
    };
    let week: u8 = week
        .trim()
        .parse()
        .ok()
        .filter(|w| (1..=MAX_WEEK).contains(w))
        .ok_or_else(|| format!("week must be a number from 1 to {MAX_WEEK}"))?;
    let year: i32 = year.trim().parse().map_err(|_| "year must be a number".to_string())?;
    Ok((week, year))
}

fn setup_logger(level: Option<String>) -> Result<(), fern::InitError> {
    let level = level
        .and_then(|l| LevelFilter::from_str(l.trim()).ok())
        .unwrap_or(LevelFilter::Info);
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                Utc::now().to_rfc3339(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use nflwins_api::client::{ApiError, ApiResult, FeedSource};
    use nflwins_api::{GameRecord, TeamCode};

    struct Answers(Vec<GameRecord>);

    #[async_trait]
    impl FeedSource for Answers {
        fn name(&self) -> &str {
            "answers"
        }

        async fn fetch_week(&self, _season: i32, _week: u8) -> ApiResult<Vec<GameRecord>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    #[async_trait]
    impl FeedSource for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch_week(&self, _season: i32, _week: u8) -> ApiResult<Vec<GameRecord>> {
            Err(ApiError::Other("upstream returned 503".into()))
        }
    }

    fn state(sources: Vec<Box<dyn FeedSource>>) -> State<Arc<ProxyState>> {
        State(Arc::new(ProxyState {
            feed: GameFeed::new(sources),
        }))
    }

    fn params(week: Option<&str>, year: Option<&str>) -> Query<ScoreboardParams> {
        Query(ScoreboardParams {
            week: week.map(str::to_owned),
            year: year.map(str::to_owned),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_serves_normalized_games_with_cache_header() {
        let game = GameRecord {
            id: Some("401".into()),
            home: TeamCode::new("KC"),
            away: TeamCode::new("DEN"),
            home_score: 27,
            away_score: 24,
            status: "final".into(),
            winner: Some(TeamCode::new("KC")),
            quarter: None,
            clock: None,
        };
        let response = scoreboard(
            state(vec![Box::new(Broken), Box::new(Answers(vec![game]))]),
            params(Some("3"), Some("2025")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], CACHE_CONTROL);
        let body = body_json(response).await;
        assert_eq!(body[0]["home"], "KC");
        assert_eq!(body[0]["homeScore"], 27);
        assert_eq!(body[0]["winner"], "KC");
    }

    #[tokio::test]
    async fn test_empty_answer_is_ok() {
        let response = scoreboard(state(vec![Box::new(Answers(Vec::new()))]), params(Some("1"), Some("2025"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_total_failure_is_bad_gateway() {
        let response = scoreboard(state(vec![Box::new(Broken)]), params(Some("1"), Some("2025"))).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_bad_params_are_rejected() {
        for (week, year) in [
            (None, Some("2025")),
            (Some("3"), None),
            (Some("three"), Some("2025")),
            (Some("0"), Some("2025")),
            (Some("3"), Some("last")),
        ] {
            let response = scoreboard(state(vec![Box::new(Broken)]), params(week, year)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "week={week:?} year={year:?}");
        }
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await.0, json!({ "ok": true }));
    }
}
