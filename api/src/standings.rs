use crate::scoreboard::Scoreboard;
use crate::{League, Player, StandingsEntry, TeamCode, TeamWins, WeekResult};
use std::collections::HashMap;

/// Fetch weeks `1..=up_to_week` and fold them into standings.
pub async fn compute_standings(scores: &Scoreboard, league: &League, up_to_week: u8) -> Vec<StandingsEntry> {
    if up_to_week == 0 {
        return tally(&league.players, &[]);
    }
    let weeks = scores.weeks(league.start_year, 1, up_to_week).await;
    tally(&league.players, &weeks)
}

/// Fold week results, in week order, into standings sorted by wins (ties keep
/// roster order).
///
/// A team claimed by two players counts for whichever appears later in the roster.
pub fn tally(players: &[Player], weeks: &[WeekResult]) -> Vec<StandingsEntry> {
    let owner: HashMap<&TeamCode, usize> = players
        .iter()
        .enumerate()
        .flat_map(|(idx, p)| p.teams.iter().map(move |t| (t, idx)))
        .collect();

    let mut wins_by_player = vec![0u32; players.len()];
    let mut series: Vec<Vec<u32>> = vec![Vec::with_capacity(weeks.len()); players.len()];
    let mut wins_by_team: HashMap<&TeamCode, u32> = HashMap::new();

    for games in weeks {
        for game in games {
            let Some(winner) = game.decided_winner() else {
                continue;
            };
            *wins_by_team.entry(winner).or_default() += 1;
            if let Some(&idx) = owner.get(winner) {
                wins_by_player[idx] += 1;
            }
        }
        for (idx, running) in wins_by_player.iter().enumerate() {
            series[idx].push(*running);
        }
    }

    let mut standings: Vec<StandingsEntry> = players
        .iter()
        .zip(series)
        .zip(wins_by_player)
        .map(|((player, series), wins)| StandingsEntry {
            player_id: player.id.clone(),
            name: player.name.clone(),
            wins,
            series,
            teams: player
                .teams
                .iter()
                .map(|code| TeamWins {
                    code: code.clone(),
                    wins: wins_by_team.get(code).copied().unwrap_or(0),
                })
                .collect(),
        })
        .collect();

    standings.sort_by(|a, b| b.wins.cmp(&a.wins));
    standings
}
