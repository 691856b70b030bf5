//! Short-lived snapshot of the current week's games, for live score overlays.

use crate::context::LeagueContext;
use crate::season::approximate_week;
use crate::{GameRecord, LiveSnapshot, TeamCode};
use chrono::Duration;
use log::{debug, info};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;

pub const LIVE_TTL: Duration = Duration::seconds(60);
pub const LIVE_REFRESH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

pub struct LiveTracker {
    ctx: Arc<LeagueContext>,
    ttl: Duration,
    snapshot: RwLock<Option<LiveSnapshot>>,
}

impl LiveTracker {
    pub fn new(ctx: Arc<LeagueContext>) -> Self {
        Self {
            ctx,
            ttl: LIVE_TTL,
            snapshot: RwLock::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Refetch the calendar week (no probing, no cache) and replace the snapshot.
    pub async fn refresh(&self) {
        let season = self.ctx.season();
        let week = approximate_week(season, self.ctx.now());
        let games = self.ctx.scores().week_uncached(season, week).await;
        debug!("live snapshot for week {week}: {} games", games.len());
        let snapshot = LiveSnapshot {
            captured_at: self.ctx.now(),
            week,
            games,
        };
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// The snapshot, unless it has outlived the TTL.
    pub fn snapshot(&self) -> Option<LiveSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        let snapshot = guard.as_ref()?;
        if self.ctx.now() - snapshot.captured_at > self.ttl {
            return None;
        }
        Some(snapshot.clone())
    }

    /// Unfinished game involving `team` in a fresh snapshot.
    pub fn find_live_game(&self, team: &TeamCode) -> Option<GameRecord> {
        self.snapshot()?
            .games
            .into_iter()
            .find(|game| game.involves(team) && game.is_live())
    }

    /// Refresh now, then every `every`, until the returned task is cancelled or dropped.
    pub fn spawn(self: &Arc<Self>, every: std::time::Duration) -> LiveRefreshTask {
        let tracker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                tracker.refresh().await;
            }
        });
        info!("live scores refresh every {}s", every.as_secs());
        LiveRefreshTask { handle }
    }
}

/// Handle to the background refresh loop. Aborts the loop when dropped.
pub struct LiveRefreshTask {
    handle: JoinHandle<()>,
}

impl LiveRefreshTask {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LiveRefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ScoreCache;
    use crate::client::{ApiResult, FeedSource, GameFeed};
    use crate::clock::{Clock, ManualClock};
    use crate::league::default_league;
    use crate::scoreboard::Scoreboard;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves the same live game every call and counts the calls.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        weeks: Arc<std::sync::Mutex<Vec<u8>>>,
    }

    #[async_trait]
    impl FeedSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_week(&self, _season: i32, week: u8) -> ApiResult<Vec<GameRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.weeks.lock().unwrap().push(week);
            Ok(vec![
                GameRecord {
                    id: Some("1".into()),
                    home: TeamCode::new("KC"),
                    away: TeamCode::new("DEN"),
                    home_score: 14,
                    away_score: 10,
                    status: "in".into(),
                    winner: None,
                    quarter: Some("3".into()),
                    clock: Some("7:21".into()),
                },
                GameRecord {
                    id: Some("2".into()),
                    home: TeamCode::new("BUF"),
                    away: TeamCode::new("MIA"),
                    home_score: 31,
                    away_score: 20,
                    status: "final".into(),
                    winner: Some(TeamCode::new("BUF")),
                    quarter: None,
                    clock: None,
                },
            ])
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        calls: Arc<AtomicUsize>,
        weeks: Arc<std::sync::Mutex<Vec<u8>>>,
        tracker: Arc<LiveTracker>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 19, 18, 0, 0).unwrap()));
        let calls = Arc::new(AtomicUsize::new(0));
        let weeks = Arc::new(std::sync::Mutex::new(Vec::new()));
        let source = CountingSource {
            calls: calls.clone(),
            weeks: weeks.clone(),
        };
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let scores = Scoreboard::new(
            GameFeed::new(vec![Box::new(source)]),
            ScoreCache::in_memory(dyn_clock.clone()),
        );
        let ctx = Arc::new(LeagueContext::new(default_league(clock.now()), scores, dyn_clock));
        Fixture {
            clock,
            calls,
            weeks,
            tracker: Arc::new(LiveTracker::new(ctx)),
        }
    }

    #[tokio::test]
    async fn finds_only_unfinished_games() {
        let f = fixture();
        assert!(f.tracker.find_live_game(&TeamCode::new("KC")).is_none(), "no snapshot yet");

        f.tracker.refresh().await;
        assert_eq!(*f.weeks.lock().unwrap(), vec![7]);
        let game = f.tracker.find_live_game(&TeamCode::new("DEN")).unwrap();
        assert_eq!(game.score_for(&TeamCode::new("DEN")), (10, 14));
        assert!(f.tracker.find_live_game(&TeamCode::new("BUF")).is_none());
        assert!(f.tracker.find_live_game(&TeamCode::new("SEA")).is_none());
    }

    #[tokio::test]
    async fn snapshot_expires_after_ttl() {
        let f = fixture();
        f.tracker.refresh().await;
        f.clock.advance(Duration::seconds(60));
        assert!(f.tracker.find_live_game(&TeamCode::new("KC")).is_some());
        f.clock.advance(Duration::seconds(1));
        assert!(f.tracker.find_live_game(&TeamCode::new("KC")).is_none());
        assert!(f.tracker.snapshot().is_none());
    }

    #[tokio::test]
    async fn refresh_bypasses_cache() {
        let f = fixture();
        f.tracker.refresh().await;
        f.tracker.refresh().await;
        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_ticks_until_cancelled() {
        let f = fixture();
        let task = f.tracker.spawn(std::time::Duration::from_secs(60));

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(f.calls.load(Ordering::SeqCst), 1, "first refresh is immediate");

        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        assert_eq!(f.calls.load(Ordering::SeqCst), 2);

        task.cancel();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(task.is_finished());
        tokio::time::sleep(std::time::Duration::from_secs(180)).await;
        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
    }
}
