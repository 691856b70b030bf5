//! Wire types for the Tank01 NFL live statistics API (RapidAPI).
//! Endpoint: https://tank01-nfl-live-in-game-real-time-statistics-nfl.p.rapidapi.com/getNFLGamesForWeek
//!
//! Field names drift between plans and API versions, so games are kept as
//! loose JSON objects and read through accessors that try each known key.
use serde::Deserialize;
use serde_json::{Map, Value};

/// The body is either a bare array or an object wrapping it under `body`/`games`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Tank01Response {
    Games(Vec<Tank01Game>),
    Wrapped {
        #[serde(default)]
        body: Option<Value>,
        #[serde(default)]
        games: Option<Value>,
    },
}

impl Tank01Response {
    /// `None` when the payload carries no game array at all.
    pub fn into_games(self) -> Option<Vec<Tank01Game>> {
        match self {
            Tank01Response::Games(games) => Some(games),
            Tank01Response::Wrapped { body, games } => {
                let list = [body, games]
                    .into_iter()
                    .flatten()
                    .find(|v| !v.is_null())?;
                serde_json::from_value(list).ok()
            }
        }
    }
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(transparent)]
pub struct Tank01Game(pub Map<String, Value>);

impl Tank01Game {
    pub fn home(&self) -> Option<&str> {
        self.first_str(&["homeTeam", "home", "homeTeamAbbr"])
    }

    pub fn away(&self) -> Option<&str> {
        self.first_str(&["awayTeam", "away", "awayTeamAbbr"])
    }

    pub fn home_score(&self) -> u16 {
        crate::value_to_score(self.first_value(&["homeScoreTotal", "homeScore"]))
    }

    pub fn away_score(&self) -> u16 {
        crate::value_to_score(self.first_value(&["awayScoreTotal", "awayScore"]))
    }

    pub fn status(&self) -> String {
        self.first_str(&["gameStatus", "status"])
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn quarter(&self) -> Option<String> {
        self.first_value(&["quarter", "qtr"])
            .and_then(crate::value_to_string)
    }

    pub fn clock(&self) -> Option<String> {
        self.first_value(&["gameClock", "clock"])
            .and_then(crate::value_to_string)
    }

    pub fn id(&self) -> Option<String> {
        self.first_value(&["gameID", "gameId", "id"])
            .and_then(crate::value_to_string)
    }

    fn first_value(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| !v.is_null())
    }

    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .filter_map(Value::as_str)
            .find(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_and_wrapped_bodies_both_yield_games() {
        let bare: Tank01Response = serde_json::from_str(r#"[{"home":"KC"}]"#).unwrap();
        assert_eq!(bare.into_games().unwrap().len(), 1);

        let body: Tank01Response =
            serde_json::from_str(r#"{"statusCode":200,"body":[{"home":"KC"},{"home":"BUF"}]}"#).unwrap();
        assert_eq!(body.into_games().unwrap().len(), 2);

        let games: Tank01Response = serde_json::from_str(r#"{"games":[{"home":"KC"}]}"#).unwrap();
        assert_eq!(games.into_games().unwrap().len(), 1);
    }

    #[test]
    fn wrapped_body_without_games_is_none() {
        let empty: Tank01Response = serde_json::from_str(r#"{"error":"quota"}"#).unwrap();
        assert!(empty.into_games().is_none());
    }

    #[test]
    fn accessors_try_alternate_keys() {
        let game: Tank01Game = serde_json::from_str(
            r#"{"homeTeamAbbr":"KC","away":"DEN","homeScoreTotal":null,"homeScore":"24",
                "awayScore":17,"status":"Final","qtr":4,"gameID":"20250907_DEN@KC"}"#,
        )
        .unwrap();
        assert_eq!(game.home(), Some("KC"));
        assert_eq!(game.away(), Some("DEN"));
        assert_eq!(game.home_score(), 24);
        assert_eq!(game.away_score(), 17);
        assert_eq!(game.status(), "final");
        assert_eq!(game.quarter().as_deref(), Some("4"));
        assert_eq!(game.clock(), None);
        assert_eq!(game.id().as_deref(), Some("20250907_DEN@KC"));
    }

    #[test]
    fn missing_or_garbage_scores_default_to_zero() {
        let game: Tank01Game =
            serde_json::from_str(r#"{"home":"KC","away":"DEN","homeScore":"TBD"}"#).unwrap();
        assert_eq!(game.home_score(), 0);
        assert_eq!(game.away_score(), 0);
    }
}
