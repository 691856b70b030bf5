use crate::WeekResult;
use crate::cache::ScoreCache;
use crate::client::GameFeed;
use crate::schedule::{FETCH_CONCURRENCY, map_concurrent};
use log::debug;
use std::convert::Infallible;

/// Cached, fan-out capable access to week results.
pub struct Scoreboard {
    feed: GameFeed,
    cache: ScoreCache,
}

impl Scoreboard {
    pub fn new(feed: GameFeed, cache: ScoreCache) -> Self {
        Self { feed, cache }
    }

    pub fn feed(&self) -> &GameFeed {
        &self.feed
    }

    /// Cache first, then the feed. Empty means "unknown", not "no games".
    pub async fn week(&self, season: i32, week: u8) -> WeekResult {
        if let Some(games) = self.cache.get(season, week) {
            debug!("cache hit for {season} week {week}");
            return games;
        }
        let games = self.feed.fetch_week(season, week).await;
        self.cache.put(season, week, &games);
        games
    }

    /// Straight from the feed, skipping the cache. For live scores.
    pub async fn week_uncached(&self, season: i32, week: u8) -> WeekResult {
        self.feed.fetch_week(season, week).await
    }

    /// Weeks `first..=last`, fetched concurrently, in week order.
    pub async fn weeks(&self, season: i32, first: u8, last: u8) -> Vec<WeekResult> {
        let weeks: Vec<u8> = (first..=last).collect();
        map_concurrent(&weeks, FETCH_CONCURRENCY, |week, _| {
            let week = *week;
            async move { Ok::<_, Infallible>(self.week(season, week).await) }
        })
        .await
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect()
    }
}
