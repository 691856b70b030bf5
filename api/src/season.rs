//! Season calendar heuristics and current-week detection.

use crate::MAX_WEEK;
use crate::scoreboard::Scoreboard;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use log::debug;

/// Weeks probed on each side of the calendar estimate before a full scan.
const PROBE_RADIUS: u8 = 3;

/// A season is named for the year it kicks off; January–August belong to the previous one.
pub fn season_year(now: DateTime<Utc>) -> i32 {
    if now.month() >= 9 { now.year() } else { now.year() - 1 }
}

/// Midnight UTC on the first Thursday of September, the usual week-1 kickoff.
pub fn kickoff(season: i32) -> DateTime<Utc> {
    let first_thursday = NaiveDate::from_weekday_of_month_opt(season, 9, Weekday::Thu, 1)
        .unwrap_or(NaiveDate::MIN);
    first_thursday.and_time(NaiveTime::MIN).and_utc()
}

/// Calendar-only estimate of the current week, clamped to 1..=22.
pub fn approximate_week(season: i32, now: DateTime<Utc>) -> u8 {
    let elapsed = (now - kickoff(season)).max(Duration::zero());
    let week = elapsed.num_weeks() + 1;
    week.clamp(1, i64::from(MAX_WEEK)) as u8
}

/// Estimate first, then alternating outward up to the probe radius.
pub fn probe_order(approx: u8) -> Vec<u8> {
    let mut weeks = Vec::new();
    for d in 0..=PROBE_RADIUS {
        let below = approx.saturating_sub(d).max(1);
        let above = approx.saturating_add(d).min(MAX_WEEK);
        for week in [below, above] {
            if !weeks.contains(&week) {
                weeks.push(week);
            }
        }
    }
    weeks
}

/// Best guess at the current week: probe near the calendar estimate, then
/// scan the whole season for the latest week with games, then give up and
/// trust the calendar.
pub async fn detect_current_week(scores: &Scoreboard, season: i32, now: DateTime<Utc>) -> u8 {
    let approx = approximate_week(season, now);
    for week in probe_order(approx) {
        if !scores.week(season, week).await.is_empty() {
            debug!("current week {week} confirmed by probe (estimate {approx})");
            return week;
        }
    }

    debug!("probes around week {approx} found nothing, scanning the season");
    let all = scores.weeks(season, 1, MAX_WEEK).await;
    all.iter()
        .rposition(|games| !games.is_empty())
        .map(|idx| idx as u8 + 1)
        .unwrap_or(approx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn season_year_rolls_over_in_september() {
        let aug = Utc.with_ymd_and_hms(2026, 8, 31, 23, 0, 0).unwrap();
        let sep = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        let jan = Utc.with_ymd_and_hms(2027, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(season_year(aug), 2025);
        assert_eq!(season_year(sep), 2026);
        assert_eq!(season_year(jan), 2026);
    }

    #[test]
    fn kickoff_is_first_thursday_of_september() {
        assert_eq!(kickoff(2025), Utc.with_ymd_and_hms(2025, 9, 4, 0, 0, 0).unwrap());
        assert_eq!(kickoff(2026), Utc.with_ymd_and_hms(2026, 9, 3, 0, 0, 0).unwrap());
        assert_eq!(kickoff(2022), Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn approximate_week_counts_whole_weeks_since_kickoff() {
        let before = Utc.with_ymd_and_hms(2025, 8, 20, 0, 0, 0).unwrap();
        let opener = Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap();
        let week2 = Utc.with_ymd_and_hms(2025, 9, 11, 0, 0, 0).unwrap();
        let october = Utc.with_ymd_and_hms(2025, 10, 19, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(approximate_week(2025, before), 1);
        assert_eq!(approximate_week(2025, opener), 1);
        assert_eq!(approximate_week(2025, week2), 2);
        assert_eq!(approximate_week(2025, october), 7);
        assert_eq!(approximate_week(2025, summer), MAX_WEEK);
    }

    #[test]
    fn probe_order_expands_outward_and_stays_in_range() {
        assert_eq!(probe_order(10), vec![10, 9, 11, 8, 12, 7, 13]);
        assert_eq!(probe_order(1), vec![1, 2, 3, 4]);
        assert_eq!(probe_order(22), vec![22, 21, 20, 19]);
    }
}
