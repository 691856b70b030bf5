//! League roster: defaults, persistence and edits.

use crate::season::season_year;
use crate::{League, Player, TeamCode, teams};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LeagueError {
    UnknownPlayer(String),
    TeamClaimed { team: TeamCode, owner: String },
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for LeagueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeagueError::UnknownPlayer(id) => write!(f, "No player with id '{id}'"),
            LeagueError::TeamClaimed { team, owner } => write!(f, "{team} already belongs to {owner}"),
            LeagueError::Io(e) => write!(f, "League file error: {e}"),
            LeagueError::Serde(e) => write!(f, "League file is not valid: {e}"),
        }
    }
}

impl std::error::Error for LeagueError {}

impl From<std::io::Error> for LeagueError {
    fn from(e: std::io::Error) -> Self {
        LeagueError::Io(e)
    }
}

impl From<serde_json::Error> for LeagueError {
    fn from(e: serde_json::Error) -> Self {
        LeagueError::Serde(e)
    }
}

/// The eight-player league the tracker was built for.
pub fn default_league(now: DateTime<Utc>) -> League {
    let roster = [
        ("p1", "Ashwin", "commanders, packers, texans, saints"),
        ("p2", "sartih", "buc, broncos, patriots, jets"),
        ("p3", "neil", "falcons, beras, cowboys, dolphins"),
        ("p4", "adrian", "steelesr, cheifs, cardinasl, colts"),
        ("p5", "faisal", "bills, eagles, titans, giants"),
        ("p6", "pranav", "49ers bengals, chargers, browns"),
        ("p7", "neloy", "vikings, rams, lions, panthers"),
        ("p8", "irfan", "seahawks, ravens, jaguars, raiders"),
    ];
    League {
        players: roster
            .iter()
            .map(|(id, name, teams)| Player::from_text(id, name, teams))
            .collect(),
        start_year: season_year(now),
    }
}

/// Rename a player. A blank name keeps the old one.
pub fn rename_player(league: &mut League, id: &str, name: &str) -> Result<(), LeagueError> {
    let player = league
        .players
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| LeagueError::UnknownPlayer(id.to_owned()))?;
    let name = name.trim();
    if !name.is_empty() {
        player.name = name.to_owned();
    }
    Ok(())
}

/// Replace a player's teams from loose text. Teams owned by someone else are refused.
pub fn set_player_teams(league: &mut League, id: &str, text: &str) -> Result<Vec<TeamCode>, LeagueError> {
    if league.player(id).is_none() {
        return Err(LeagueError::UnknownPlayer(id.to_owned()));
    }
    let wanted = teams::parse_list(text);
    for team in &wanted {
        if let Some(owner) = league.owner_of(team, Some(id)) {
            return Err(LeagueError::TeamClaimed {
                team: team.clone(),
                owner: owner.name.clone(),
            });
        }
    }
    if let Some(player) = league.players.iter_mut().find(|p| p.id == id) {
        player.teams = wanted.clone();
    }
    Ok(wanted)
}

/// Teams claimed by more than one player, with every claimant's id in roster order.
pub fn duplicate_claims(league: &League) -> Vec<(TeamCode, Vec<String>)> {
    let mut claims: HashMap<&TeamCode, Vec<String>> = HashMap::new();
    for player in &league.players {
        for team in &player.teams {
            claims.entry(team).or_default().push(player.id.clone());
        }
    }
    let mut dupes: Vec<(TeamCode, Vec<String>)> = claims
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(team, ids)| (team.clone(), ids))
        .collect();
    dupes.sort();
    dupes
}

/// Where the league lives on disk.
#[derive(Debug, Clone)]
pub struct LeagueStore {
    path: PathBuf,
}

impl LeagueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Option<Self> {
        default_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<League, LeagueError> {
        let content = std::fs::read_to_string(&self.path)?;
        let league: League = serde_json::from_str(&content)?;
        for (team, ids) in duplicate_claims(&league) {
            warn!("{team} is claimed by {}; the last one counts", ids.join(", "));
        }
        Ok(league)
    }

    /// Saved league, or the default one when nothing usable is on disk.
    pub fn load_or_default(&self, now: DateTime<Utc>) -> League {
        match self.load() {
            Ok(league) => league,
            Err(LeagueError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no league at {}, starting from the default", self.path.display());
                default_league(now)
            }
            Err(e) => {
                warn!("ignoring league at {}: {e}", self.path.display());
                default_league(now)
            }
        }
    }

    pub fn save(&self, league: &League) -> Result<(), LeagueError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(league)?;
        std::fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// `NFLWINS_LEAGUE_JSON`, else `$XDG_CONFIG_HOME/nflwins/league.json`, else
/// `$HOME/.config/nflwins/league.json`.
pub fn default_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("NFLWINS_LEAGUE_JSON")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return Some(PathBuf::from(config_dir).join("nflwins").join("league.json"));
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return Some(PathBuf::from(home).join(".config").join("nflwins").join("league.json"));
    }
    None
}
