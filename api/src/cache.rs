//! Week results cached per (season, week), in memory and optionally on disk.
//!
//! Disk entries are JSON `{"t": <unix millis>, "v": [GameRecord, ...]}`. A
//! missing, unreadable, malformed, empty or expired entry is a miss.

use crate::WeekResult;
use crate::clock::Clock;
use chrono::Duration;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_TTL: Duration = Duration::minutes(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    t: i64,
    v: WeekResult,
}

pub struct ScoreCache {
    dir: Option<PathBuf>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    memory: Mutex<HashMap<(i32, u8), CacheEntry>>,
}

impl ScoreCache {
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: None,
            ttl: DEFAULT_TTL,
            clock,
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn on_disk(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::in_memory(clock)
        }
    }

    /// Disk-backed under [`default_dir`] when one can be found.
    pub fn from_env(clock: Arc<dyn Clock>) -> Self {
        match default_dir() {
            Some(dir) => Self::on_disk(dir, clock),
            None => Self::in_memory(clock),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn get(&self, season: i32, week: u8) -> Option<WeekResult> {
        {
            let mut memory = self.lock_memory();
            if let Some(entry) = memory.get(&(season, week)) {
                if self.is_fresh(entry) {
                    return Some(entry.v.clone());
                }
                memory.remove(&(season, week));
            }
        }

        // The memory lock is released while the disk is read.
        let entry = self.read_disk(season, week)?;
        if !self.is_fresh(&entry) {
            debug!("cache entry for {season} week {week} expired");
            return None;
        }
        let games = entry.v.clone();
        self.lock_memory().insert((season, week), entry);
        Some(games)
    }

    /// Empty results are never stored.
    pub fn put(&self, season: i32, week: u8, games: &WeekResult) {
        if games.is_empty() {
            return;
        }
        let entry = CacheEntry {
            t: self.clock.now().timestamp_millis(),
            v: games.clone(),
        };
        if let Some(path) = self.path(season, week) {
            if let Err(e) = write_entry(&path, &entry) {
                warn!("could not write cache file {}: {e}", path.display());
            }
        }
        self.lock_memory().insert((season, week), entry);
    }

    fn lock_memory(&self) -> MutexGuard<'_, HashMap<(i32, u8), CacheEntry>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let age = self.clock.now().timestamp_millis() - entry.t;
        !entry.v.is_empty() && age <= self.ttl.num_milliseconds()
    }

    fn path(&self, season: i32, week: u8) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("scoreboard-{season}-{week}.json")))
    }

    fn read_disk(&self, season: i32, week: u8) -> Option<CacheEntry> {
        let path = self.path(season, week)?;
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("ignoring corrupt cache file {}: {e}", path.display());
                None
            }
        }
    }
}

fn write_entry(path: &Path, entry: &CacheEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_string(entry)?;
    std::fs::write(path, payload)
}

/// `NFLWINS_CACHE_DIR`, else `$XDG_CACHE_HOME/nflwins`, else `$HOME/.cache/nflwins`.
pub fn default_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("NFLWINS_CACHE_DIR")
        && !dir.trim().is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    if let Ok(cache_dir) = std::env::var("XDG_CACHE_HOME")
        && !cache_dir.trim().is_empty()
    {
        return Some(PathBuf::from(cache_dir).join("nflwins"));
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return Some(PathBuf::from(home).join(".cache").join("nflwins"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::{GameRecord, TeamCode};
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 5, 18, 0, 0).unwrap()))
    }

    fn week() -> WeekResult {
        vec![GameRecord {
            id: Some("401".into()),
            home: TeamCode::new("KC"),
            away: TeamCode::new("DEN"),
            home_score: 20,
            away_score: 17,
            status: "final".into(),
            winner: Some(TeamCode::new("KC")),
            quarter: None,
            clock: None,
        }]
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nflwins-cache-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn put_then_get_returns_same_value() {
        let cache = ScoreCache::in_memory(clock());
        cache.put(2025, 3, &week());
        assert_eq!(cache.get(2025, 3), Some(week()));
        assert_eq!(cache.get(2025, 4), None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let clock = clock();
        let cache = ScoreCache::in_memory(clock.clone());
        cache.put(2025, 3, &week());
        clock.advance(Duration::minutes(10));
        assert!(cache.get(2025, 3).is_some(), "exactly at the TTL is still fresh");
        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(2025, 3), None);
    }

    #[test]
    fn empty_results_are_never_cached() {
        let cache = ScoreCache::in_memory(clock());
        cache.put(2025, 3, &Vec::new());
        assert_eq!(cache.get(2025, 3), None);
    }

    #[test]
    fn disk_entries_survive_a_new_cache() {
        let dir = scratch_dir("reload");
        let clock = clock();
        ScoreCache::on_disk(&dir, clock.clone()).put(2025, 7, &week());

        let reopened = ScoreCache::on_disk(&dir, clock.clone());
        assert_eq!(reopened.get(2025, 7), Some(week()));

        clock.advance(Duration::minutes(11));
        let stale = ScoreCache::on_disk(&dir, clock);
        assert_eq!(stale.get(2025, 7), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn disk_read_does_not_hold_the_memory_lock() {
        let dir = scratch_dir("unlocked");
        let clock = clock();
        ScoreCache::on_disk(&dir, clock.clone()).put(2025, 8, &week());

        let cache = Arc::new(ScoreCache::on_disk(&dir, clock));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get(2025, 8))
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), Some(week()));
        }
        assert!(cache.memory.try_lock().is_ok(), "lock released after a disk hit");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_files_are_misses() {
        let dir = scratch_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("scoreboard-2025-2.json"), "{\"t\": \"yesterday\"").unwrap();
        std::fs::write(dir.join("scoreboard-2025-3.json"), "{\"t\": 1, \"v\": []}").unwrap();

        let cache = ScoreCache::on_disk(&dir, clock());
        assert_eq!(cache.get(2025, 2), None);
        assert_eq!(cache.get(2025, 3), None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
