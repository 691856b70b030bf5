use crate::clock::Clock;
use crate::league::{self, LeagueError, LeagueStore};
use crate::scoreboard::Scoreboard;
use crate::{League, StandingsEntry, TeamCode, season, standings};
use chrono::{DateTime, Utc};
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

/// Everything the league views share: roster, scores and the clock.
pub struct LeagueContext {
    league: RwLock<League>,
    store: Option<LeagueStore>,
    scores: Scoreboard,
    clock: Arc<dyn Clock>,
}

impl LeagueContext {
    /// In-memory league; edits are not persisted.
    pub fn new(league: League, scores: Scoreboard, clock: Arc<dyn Clock>) -> Self {
        Self {
            league: RwLock::new(league),
            store: None,
            scores,
            clock,
        }
    }

    /// League read from `store` (or the default), with edits written back to it.
    pub fn load(store: LeagueStore, scores: Scoreboard, clock: Arc<dyn Clock>) -> Self {
        let league = store.load_or_default(clock.now());
        Self {
            store: Some(store),
            ..Self::new(league, scores, clock)
        }
    }

    pub fn league(&self) -> League {
        self.league.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn season(&self) -> i32 {
        self.league.read().unwrap_or_else(PoisonError::into_inner).start_year
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    pub async fn detect_current_week(&self) -> u8 {
        season::detect_current_week(&self.scores, self.season(), self.now()).await
    }

    pub async fn compute_standings(&self, up_to_week: u8) -> Vec<StandingsEntry> {
        let league = self.league();
        standings::compute_standings(&self.scores, &league, up_to_week).await
    }

    /// Detect the week, then tally through it.
    pub async fn refresh(&self) -> (u8, Vec<StandingsEntry>) {
        let week = self.detect_current_week().await;
        info!("refreshing standings through week {week}");
        (week, self.compute_standings(week).await)
    }

    pub fn rename_player(&self, id: &str, name: &str) -> Result<(), LeagueError> {
        self.edit(|league| league::rename_player(league, id, name))
    }

    pub fn set_player_teams(&self, id: &str, text: &str) -> Result<Vec<TeamCode>, LeagueError> {
        self.edit(|league| league::set_player_teams(league, id, text))
    }

    /// Apply `change` to a copy, persist it, then publish it.
    fn edit<T>(&self, change: impl FnOnce(&mut League) -> Result<T, LeagueError>) -> Result<T, LeagueError> {
        let mut guard = self.league.write().unwrap_or_else(PoisonError::into_inner);
        let mut draft = guard.clone();
        let out = change(&mut draft)?;
        if let Some(store) = &self.store {
            store.save(&draft)?;
        }
        *guard = draft;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ScoreCache;
    use crate::client::GameFeed;
    use crate::clock::ManualClock;
    use crate::league::default_league;
    use chrono::TimeZone;

    fn context(store: Option<LeagueStore>) -> LeagueContext {
        let clock: Arc<dyn Clock> =
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 19, 12, 0, 0).unwrap()));
        let scores = Scoreboard::new(GameFeed::new(Vec::new()), ScoreCache::in_memory(clock.clone()));
        match store {
            Some(store) => LeagueContext::load(store, scores, clock),
            None => LeagueContext::new(default_league(clock.now()), scores, clock),
        }
    }

    #[test]
    fn failed_edit_leaves_league_untouched() {
        let ctx = context(None);
        let before = ctx.league();
        assert!(ctx.set_player_teams("p1", "chiefs").is_err());
        assert_eq!(ctx.league(), before);
    }

    #[test]
    fn edits_are_persisted_to_store() {
        let dir = std::env::temp_dir().join(format!("nflwins-context-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let store = LeagueStore::new(dir.join("league.json"));

        let ctx = context(Some(store.clone()));
        assert_eq!(ctx.season(), 2025);
        ctx.rename_player("p3", "Neil").unwrap();
        assert_eq!(store.load().unwrap().player("p3").unwrap().name, "Neil");

        let reloaded = context(Some(store));
        assert_eq!(reloaded.league().player("p3").unwrap().name, "Neil");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn refresh_without_data_uses_calendar_week() {
        let ctx = context(None);
        let (week, standings) = ctx.refresh().await;
        assert_eq!(week, 7);
        assert_eq!(standings.len(), 8);
        assert!(standings.iter().all(|s| s.wins == 0 && s.series == vec![0; 7]));
    }
}
