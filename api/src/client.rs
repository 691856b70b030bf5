use crate::espn::{EspnCompetitor, EspnEvent, EspnStatus, ScoreboardResponse};
use crate::tank01::{Tank01Game, Tank01Response};
use crate::{GameRecord, GameStatus, teams};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const ESPN_SITE_V2: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";
const ESPN_V2: &str = "https://site.api.espn.com/apis/v2/sports/football/nfl";
const ESPN_WEB_SITE_V2: &str = "https://site.web.api.espn.com/apis/site/v2/sports/football/nfl";
const TANK01_HOST: &str = "tank01-nfl-live-in-game-real-time-statistics-nfl.p.rapidapi.com";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Thin reqwest wrapper shared by every HTTP feed source.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("nflwins/0.1 (league standings tracker)")
                .build()
                .unwrap_or_default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET and decode JSON. Timeouts, non-2xx and bad bodies all come back as `Err`.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> ApiResult<T> {
        let mut request = self.client.get(url).timeout(self.timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Feed sources
// ---------------------------------------------------------------------------

/// One upstream that can list a week's games.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_week(&self, season: i32, week: u8) -> ApiResult<Vec<GameRecord>>;
}

/// Provider A: Tank01 on RapidAPI. Only used when a key is configured.
#[derive(Debug, Clone)]
pub struct Tank01Source {
    http: HttpClient,
    key: String,
    base_url: String,
}

impl Tank01Source {
    pub fn new(http: HttpClient, key: impl Into<String>) -> Self {
        Self {
            http,
            key: key.into(),
            base_url: format!("https://{TANK01_HOST}"),
        }
    }

    /// `RAPIDAPI_KEY`, or `NFLWINS_RAPIDAPI_KEY`, when set and non-blank.
    pub fn from_env(http: HttpClient) -> Option<Self> {
        ["NFLWINS_RAPIDAPI_KEY", "RAPIDAPI_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
            .map(|key| Self::new(http, key.trim()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl FeedSource for Tank01Source {
    fn name(&self) -> &str {
        "tank01"
    }

    async fn fetch_week(&self, season: i32, week: u8) -> ApiResult<Vec<GameRecord>> {
        let url = format!(
            "{}/getNFLGamesForWeek?season={season}&week={week}&seasonType=reg",
            self.base_url
        );
        let headers = [
            ("X-RapidAPI-Key", self.key.as_str()),
            ("X-RapidAPI-Host", TANK01_HOST),
            ("Accept", "application/json"),
        ];
        let raw: Tank01Response = self.http.get(&url, &headers).await?;
        let games = raw
            .into_games()
            .ok_or_else(|| ApiError::NotFound(format!("no game list in response from {url}")))?;
        Ok(games.iter().filter_map(map_tank01_game).collect())
    }
}

/// Provider B: ESPN's public scoreboard, tried across several URL variants.
#[derive(Debug, Clone)]
pub struct EspnSource {
    http: HttpClient,
    base_urls: Vec<String>,
}

impl EspnSource {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_urls: [ESPN_SITE_V2, ESPN_V2, ESPN_WEB_SITE_V2]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_base_urls(mut self, base_urls: Vec<String>) -> Self {
        self.base_urls = base_urls;
        self
    }
}

#[async_trait]
impl FeedSource for EspnSource {
    fn name(&self) -> &str {
        "espn"
    }

    /// First variant that answers with an `events` array wins, even an empty one.
    async fn fetch_week(&self, season: i32, week: u8) -> ApiResult<Vec<GameRecord>> {
        let mut last_error: Option<ApiError> = None;
        for base in &self.base_urls {
            let url = format!("{base}/scoreboard?week={week}&seasontype=2&year={season}");
            match self.http.get::<ScoreboardResponse>(&url, &[]).await {
                Ok(ScoreboardResponse { events: Some(events) }) => {
                    return Ok(events.iter().filter_map(map_event).collect());
                }
                Ok(_) => {
                    debug!("no events array at {url}");
                    last_error = Some(ApiError::NotFound(format!("no events array at {url}")));
                }
                Err(e) => {
                    debug!("espn variant failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ApiError::Other("no ESPN endpoints configured".into())))
    }
}

/// Our own scoreboard proxy, which already serves normalized records.
#[derive(Debug, Clone)]
pub struct ProxySource {
    http: HttpClient,
    base_url: String,
}

impl ProxySource {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn from_env(http: HttpClient) -> Option<Self> {
        std::env::var("NFLWINS_PROXY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self::new(http, url.trim()))
    }
}

#[async_trait]
impl FeedSource for ProxySource {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn fetch_week(&self, season: i32, week: u8) -> ApiResult<Vec<GameRecord>> {
        let url = format!("{}/api/scoreboard?week={week}&year={season}", self.base_url);
        let records: Vec<GameRecord> = self.http.get(&url, &[]).await?;
        Ok(records.iter().filter_map(renormalize).collect())
    }
}

/// Ordered fallback chain over feed sources.
pub struct GameFeed {
    sources: Vec<Box<dyn FeedSource>>,
}

impl GameFeed {
    pub fn new(sources: Vec<Box<dyn FeedSource>>) -> Self {
        Self { sources }
    }

    /// Tank01 (when keyed), then ESPN. Used by the proxy itself.
    pub fn upstream_from_env(http: HttpClient) -> Self {
        let mut sources: Vec<Box<dyn FeedSource>> = Vec::new();
        if let Some(tank01) = Tank01Source::from_env(http.clone()) {
            sources.push(Box::new(tank01));
        }
        sources.push(Box::new(EspnSource::new(http)));
        Self::new(sources)
    }

    /// Tank01 (when keyed), the proxy (when configured), then ESPN.
    pub fn from_env(http: HttpClient) -> Self {
        let mut sources: Vec<Box<dyn FeedSource>> = Vec::new();
        if let Some(tank01) = Tank01Source::from_env(http.clone()) {
            sources.push(Box::new(tank01));
        }
        if let Some(proxy) = ProxySource::from_env(http.clone()) {
            sources.push(Box::new(proxy));
        }
        sources.push(Box::new(EspnSource::new(http)));
        Self::new(sources)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// First non-empty answer wins. `Ok(vec![])` means some source answered
    /// with no games; `Err` means every source failed.
    pub async fn try_fetch_week(&self, season: i32, week: u8) -> ApiResult<Vec<GameRecord>> {
        let mut last_error: Option<ApiError> = None;
        let mut answered = false;
        for source in &self.sources {
            match source.fetch_week(season, week).await {
                Ok(games) if !games.is_empty() => {
                    debug!("{} served {} games for {season} week {week}", source.name(), games.len());
                    return Ok(games);
                }
                Ok(_) => {
                    debug!("{} had no games for {season} week {week}", source.name());
                    answered = true;
                }
                Err(e) => {
                    warn!("{} failed for {season} week {week}: {e}", source.name());
                    last_error = Some(e);
                }
            }
        }
        if answered {
            return Ok(Vec::new());
        }
        Err(last_error.unwrap_or_else(|| ApiError::Other("no feed sources configured".into())))
    }

    /// Never fails; total failure is an empty week (read as "unknown").
    pub async fn fetch_week(&self, season: i32, week: u8) -> Vec<GameRecord> {
        self.try_fetch_week(season, week).await.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Mapping: provider wire types → GameRecord
// ---------------------------------------------------------------------------

/// Provider-neutral view of one game before team resolution.
#[derive(Debug, Default)]
pub struct RawGame<'a> {
    pub home: Option<&'a str>,
    pub away: Option<&'a str>,
    pub home_score: u16,
    pub away_score: u16,
    pub status: String,
    pub quarter: Option<String>,
    pub clock: Option<String>,
    pub id: Option<String>,
}

/// Resolve both teams, settle the status and derive the winner.
/// Games without two resolvable teams are dropped.
pub fn normalize(raw: RawGame<'_>) -> Option<GameRecord> {
    let home = teams::resolve(raw.home?)?;
    let away = teams::resolve(raw.away?)?;
    let status = match raw.status.trim() {
        "" => "unknown".to_owned(),
        s => s.to_lowercase(),
    };

    let finished = GameStatus::from_status(&status) == GameStatus::Final;
    let winner = if finished && raw.home_score != raw.away_score {
        Some(if raw.home_score > raw.away_score { home.clone() } else { away.clone() })
    } else {
        None
    };

    Some(GameRecord {
        id: raw.id,
        home,
        away,
        home_score: raw.home_score,
        away_score: raw.away_score,
        status,
        winner,
        quarter: raw.quarter,
        clock: raw.clock,
    })
}

fn renormalize(record: &GameRecord) -> Option<GameRecord> {
    normalize(RawGame {
        home: Some(record.home.as_str()),
        away: Some(record.away.as_str()),
        home_score: record.home_score,
        away_score: record.away_score,
        status: record.status.clone(),
        quarter: record.quarter.clone(),
        clock: record.clock.clone(),
        id: record.id.clone(),
    })
}

fn map_tank01_game(game: &Tank01Game) -> Option<GameRecord> {
    normalize(RawGame {
        home: game.home(),
        away: game.away(),
        home_score: game.home_score(),
        away_score: game.away_score(),
        status: game.status(),
        quarter: game.quarter(),
        clock: game.clock(),
        id: game.id(),
    })
}

fn map_event(event: &EspnEvent) -> Option<GameRecord> {
    let competition = event.competition()?;
    let home = competition.side("home");
    let away = competition.side("away");
    let status = competition.status.as_ref().or(event.status.as_ref());

    normalize(RawGame {
        home: competitor_abbrev(home),
        away: competitor_abbrev(away),
        home_score: competitor_score(home),
        away_score: competitor_score(away),
        status: espn_status(status),
        quarter: status.and_then(|s| s.period).filter(|p| *p > 0).map(|p| p.to_string()),
        clock: status.and_then(|s| s.display_clock.clone()),
        id: event.id.clone(),
    })
}

fn competitor_abbrev(c: Option<&EspnCompetitor>) -> Option<&str> {
    c?.team.as_ref()?.abbreviation.as_deref()
}

fn competitor_score(c: Option<&EspnCompetitor>) -> u16 {
    crate::value_to_score(c.and_then(|c| c.score.as_ref()))
}

fn espn_status(status: Option<&EspnStatus>) -> String {
    let Some(status_type) = status.and_then(|s| s.status_type.as_ref()) else {
        return "unknown".into();
    };
    if status_type.completed == Some(true) {
        return "final".into();
    }
    if let Some(state) = status_type.state.as_deref() {
        return match state {
            "post" => "final".to_owned(),
            other => other.to_lowercase(),
        };
    }
    match status_type.name.as_deref() {
        Some("STATUS_FINAL" | "STATUS_FINAL_OT") => "final",
        Some("STATUS_IN_PROGRESS" | "STATUS_HALFTIME" | "STATUS_END_PERIOD") => "in",
        Some("STATUS_SCHEDULED") => "pre",
        Some("STATUS_POSTPONED" | "STATUS_CANCELED" | "STATUS_SUSPENDED") => "postponed",
        _ => "unknown",
    }
    .to_owned()
}
