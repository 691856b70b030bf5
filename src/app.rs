use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use chrono::Local;
use nflwins_api::live::LiveTracker;
use nflwins_api::{StandingsEntry, TeamCode};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Trends,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub season: i32,
    live: Arc<LiveTracker>,
}

impl App {
    pub fn new(season: i32, live: Arc<LiveTracker>) -> Self {
        let settings = AppSettings::load();

        let app = Self {
            state: AppState::new(),
            settings,
            season,
            live,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_standings_loaded(&mut self, week: u8, standings: Vec<StandingsEntry>) {
        self.state.last_error = None;
        self.state.standings.replace(week, standings);
        self.state.standings.updated_at = Some(Local::now().format("%H:%M").to_string());
    }

    /// Previous standings stay on screen.
    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Standings navigation
    // -----------------------------------------------------------------------

    pub fn standings_down(&mut self) {
        self.state.standings.select_next();
    }

    pub fn standings_up(&mut self) {
        self.state.standings.select_prev();
    }

    pub fn standings_toggle(&mut self) {
        self.state.standings.toggle_selected();
    }

    /// What a team row shows, and whether it is a live score: the team's own
    /// score first when it is playing, else its win count.
    pub fn team_summary(&self, team: &TeamCode, wins: u32) -> (String, bool) {
        let Some(game) = self.live.find_live_game(team) else {
            return (format!("{wins} wins"), false);
        };
        let (own, opp) = game.score_for(team);
        let status = match (game.quarter.as_deref(), game.clock.as_deref()) {
            (Some(quarter), Some(clock)) => format!("Q{quarter} {clock}"),
            (Some(quarter), None) => format!("Q{quarter}"),
            (None, _) => "live".to_owned(),
        };
        (format!("{own} - {opp} ({status})"), true)
    }
}
