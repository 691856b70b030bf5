use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use nflwins_api::StandingsEntry;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    RefreshStandings,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    StandingsLoaded { week: u8, standings: Vec<StandingsEntry> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    /// Redraw so live overlays pick up the latest snapshot.
    LiveTick,
}
