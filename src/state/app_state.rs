use crate::app::MenuItem;
use nflwins_api::StandingsEntry;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct StandingsState {
    /// Week the standings were tallied through.
    pub week: Option<u8>,
    pub entries: Vec<StandingsEntry>,
    pub selected: usize,
    /// Player ids whose team rows are shown.
    pub expanded: HashSet<String>,
    pub updated_at: Option<String>,
}

impl StandingsState {
    pub fn select_next(&mut self) {
        let max = self.entries.len().saturating_sub(1);
        if self.selected < max {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn toggle_selected(&mut self) {
        let Some(entry) = self.entries.get(self.selected) else {
            return;
        };
        if !self.expanded.remove(&entry.player_id) {
            self.expanded.insert(entry.player_id.clone());
        }
    }

    pub fn is_expanded(&self, player_id: &str) -> bool {
        self.expanded.contains(player_id)
    }

    /// Swap in new standings, keeping the cursor on the same player.
    pub fn replace(&mut self, week: u8, entries: Vec<StandingsEntry>) {
        let selected_id = self.entries.get(self.selected).map(|e| e.player_id.clone());
        self.week = Some(week);
        self.entries = entries;
        self.selected = selected_id
            .and_then(|id| self.entries.iter().position(|e| e.player_id == id))
            .unwrap_or(0);
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub standings: StandingsState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, wins: u32) -> StandingsEntry {
        StandingsEntry {
            player_id: id.into(),
            name: id.to_uppercase(),
            wins,
            series: vec![wins],
            teams: Vec::new(),
        }
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut state = StandingsState::default();
        state.select_next();
        assert_eq!(state.selected, 0);

        state.replace(3, vec![entry("a", 2), entry("b", 1)]);
        state.select_next();
        state.select_next();
        assert_eq!(state.selected, 1);
        state.select_prev();
        state.select_prev();
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_replace_follows_selected_player() {
        let mut state = StandingsState::default();
        state.replace(3, vec![entry("a", 2), entry("b", 1)]);
        state.select_next();
        state.replace(4, vec![entry("b", 3), entry("a", 2)]);
        assert_eq!(state.week, Some(4));
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_toggle_expands_and_collapses() {
        let mut state = StandingsState::default();
        state.replace(1, vec![entry("a", 0)]);
        state.toggle_selected();
        assert!(state.is_expanded("a"));
        state.toggle_selected();
        assert!(!state.is_expanded("a"));
    }
}
