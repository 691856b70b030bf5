pub mod cache;
pub mod client;
pub mod clock;
pub mod context;
pub mod espn;
pub mod league;
pub mod live;
pub mod schedule;
pub mod scoreboard;
pub mod season;
pub mod standings;
pub mod tank01;
pub mod teams;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Most teams one player may own. Extra claims are dropped.
pub const MAX_TEAMS_PER_PLAYER: usize = 4;

/// Highest week number the feeds are ever asked about (regular season plus playoffs).
pub const MAX_WEEK: u8 = 22;

// ---------------------------------------------------------------------------
// Domain types, independent of provider wire formats
// ---------------------------------------------------------------------------

/// Canonical short code for one NFL team ("KC", "WSH", "LAR", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamCode(String);

impl TeamCode {
    /// Wrap an already-uppercased code. Use [`teams::resolve`] for user or feed input.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for TeamCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TeamCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Coarse game state derived from the free-form status strings the feeds send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    Postponed,
    #[default]
    Unknown,
}

impl GameStatus {
    /// Classify a lowercased status ("post", "final/ot", "live - in progress", "pre", ...).
    pub fn from_status(status: &str) -> Self {
        let s = status.trim().to_lowercase();
        if s == "post" || s.starts_with("final") || s.starts_with("completed") {
            GameStatus::Final
        } else if s == "in"
            || s.starts_with("live")
            || s.contains("progress")
            || s.starts_with("half")
            || s.starts_with("end of")
        {
            GameStatus::InProgress
        } else if s == "pre" || s.starts_with("scheduled") {
            GameStatus::Scheduled
        } else if s.starts_with("postponed")
            || s.starts_with("suspended")
            || s.starts_with("canceled")
            || s.starts_with("cancelled")
        {
            GameStatus::Postponed
        } else {
            GameStatus::Unknown
        }
    }
}

/// One normalized game, whichever provider it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub home: TeamCode,
    pub away: TeamCode,
    #[serde(default)]
    pub home_score: u16,
    #[serde(default)]
    pub away_score: u16,
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(default)]
    pub winner: Option<TeamCode>,
    #[serde(default, deserialize_with = "loose_string")]
    pub quarter: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub clock: Option<String>,
}

impl GameRecord {
    pub fn game_status(&self) -> GameStatus {
        GameStatus::from_status(&self.status)
    }

    pub fn involves(&self, team: &TeamCode) -> bool {
        &self.home == team || &self.away == team
    }

    /// Winner as counted by the standings: the recorded winner, else the side
    /// with more points. Equal scores credit nobody.
    pub fn decided_winner(&self) -> Option<&TeamCode> {
        self.winner.as_ref().or_else(|| higher_score(self))
    }

    /// Unfinished and either running or of unknown state.
    pub fn is_live(&self) -> bool {
        self.winner.is_none()
            && matches!(self.game_status(), GameStatus::InProgress | GameStatus::Unknown)
    }

    /// Scores ordered from `team`'s point of view: (own, opponent).
    pub fn score_for(&self, team: &TeamCode) -> (u16, u16) {
        if &self.home == team {
            (self.home_score, self.away_score)
        } else {
            (self.away_score, self.home_score)
        }
    }
}

fn higher_score(game: &GameRecord) -> Option<&TeamCode> {
    use std::cmp::Ordering;
    match game.home_score.cmp(&game.away_score) {
        Ordering::Greater => Some(&game.home),
        Ordering::Less => Some(&game.away),
        Ordering::Equal => None,
    }
}

fn unknown_status() -> String {
    "unknown".to_owned()
}

/// Accepts strings, numbers or null for fields that providers type inconsistently.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_to_string(&v)))
}

pub(crate) fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers or numeric strings; anything else counts as zero.
pub(crate) fn value_to_score(value: Option<&serde_json::Value>) -> u16 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|v| v.min(u64::from(u16::MAX)) as u16)
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// All games of one (season, week) pair, in feed order.
pub type WeekResult = Vec<GameRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "teams::deserialize_roster")]
    pub teams: Vec<TeamCode>,
}

impl Player {
    /// Build a player from loose team text ("chiefs, bills 49ers").
    pub fn from_text(id: &str, name: &str, teams: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            teams: teams::parse_list(teams),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub players: Vec<Player>,
    pub start_year: i32,
}

impl League {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Player currently claiming `team`, other than `except`.
    pub fn owner_of(&self, team: &TeamCode, except: Option<&str>) -> Option<&Player> {
        self.players
            .iter()
            .filter(|p| Some(p.id.as_str()) != except)
            .find(|p| p.teams.contains(team))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamWins {
    pub code: TeamCode,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsEntry {
    pub player_id: String,
    pub name: String,
    pub wins: u32,
    /// Cumulative wins after each week; `series[i]` is the total through week i + 1.
    pub series: Vec<u32>,
    pub teams: Vec<TeamWins>,
}

/// Most recent games of the current week, replaced wholesale on each refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSnapshot {
    pub captured_at: DateTime<Utc>,
    pub week: u8,
    pub games: Vec<GameRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(status: &str, home_score: u16, away_score: u16) -> GameRecord {
        GameRecord {
            id: None,
            home: TeamCode::new("KC"),
            away: TeamCode::new("DEN"),
            home_score,
            away_score,
            status: status.into(),
            winner: None,
            quarter: None,
            clock: None,
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(GameStatus::from_status("post"), GameStatus::Final);
        assert_eq!(GameStatus::from_status("Final/OT"), GameStatus::Final);
        assert_eq!(GameStatus::from_status("completed"), GameStatus::Final);
        assert_eq!(GameStatus::from_status("in"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_status("Live - In Progress"), GameStatus::InProgress);
        assert_eq!(GameStatus::from_status("pre"), GameStatus::Scheduled);
        assert_eq!(GameStatus::from_status("Postponed"), GameStatus::Postponed);
        assert_eq!(GameStatus::from_status("Suspended"), GameStatus::Postponed);
        assert_eq!(GameStatus::from_status("unknown"), GameStatus::Unknown);
    }

    #[test]
    fn decided_winner_falls_back_to_higher_score() {
        assert_eq!(game("final", 20, 17).decided_winner(), Some(&TeamCode::new("KC")));
        assert_eq!(game("unknown", 3, 10).decided_winner(), Some(&TeamCode::new("DEN")));
        assert_eq!(game("in", 14, 3).decided_winner(), Some(&TeamCode::new("KC")));
        assert_eq!(game("final", 17, 17).decided_winner(), None);
        assert_eq!(game("pre", 0, 0).decided_winner(), None);

        let recorded = GameRecord { winner: Some(TeamCode::new("DEN")), ..game("final", 20, 17) };
        assert_eq!(recorded.decided_winner(), Some(&TeamCode::new("DEN")));
    }

    #[test]
    fn suspended_game_is_not_live() {
        assert!(!game("suspended", 10, 3).is_live());
        assert!(game("in", 10, 3).is_live());
    }

    #[test]
    fn game_record_accepts_numeric_quarter_and_id() {
        let json = r#"{"home":"KC","away":"DEN","homeScore":7,"awayScore":3,
            "status":"in","winner":null,"quarter":2,"clock":"4:12","id":401}"#;
        let g: GameRecord = serde_json::from_str(json).unwrap();
        assert_eq!(g.quarter.as_deref(), Some("2"));
        assert_eq!(g.id.as_deref(), Some("401"));
        assert!(g.is_live());
        assert_eq!(g.score_for(&TeamCode::new("DEN")), (3, 7));
    }
}
