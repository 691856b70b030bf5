//! ESPN scoreboard wire types, only the fields the game mapping reads.
//! These map to `GameRecord` via the mapping functions in client.rs.
use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Scoreboard  (site v2 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScoreboardResponse {
    /// `None` when the body is JSON but not a scoreboard (error pages, redirects).
    pub events: Option<Vec<EspnEvent>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnEvent {
    pub id: Option<String>,
    pub status: Option<EspnStatus>,
    pub competitions: Option<Vec<EspnCompetition>>,
}

impl EspnEvent {
    pub fn competition(&self) -> Option<&EspnCompetition> {
        self.competitions.as_deref().and_then(|c| c.first())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnStatus {
    #[serde(rename = "type")]
    pub status_type: Option<EspnStatusType>,
    pub period: Option<u8>,
    #[serde(rename = "displayClock")]
    pub display_clock: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnStatusType {
    pub name: Option<String>,  // "STATUS_SCHEDULED", "STATUS_IN_PROGRESS", "STATUS_FINAL"
    pub state: Option<String>, // "pre" | "in" | "post"
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnCompetition {
    pub competitors: Option<Vec<EspnCompetitor>>,
    pub status: Option<EspnStatus>,
}

impl EspnCompetition {
    pub fn side(&self, home_away: &str) -> Option<&EspnCompetitor> {
        self.competitors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|c| c.home_away.as_deref() == Some(home_away))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EspnCompetitor {
    #[serde(rename = "homeAway")]
    pub home_away: Option<String>, // "home" | "away"
    pub team: Option<EspnTeam>,
    pub score: Option<Value>, // usually a string, sometimes a bare number
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnTeam {
    pub abbreviation: Option<String>,
}
