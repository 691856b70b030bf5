use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::symbols::Marker;
use tui::text::{Line, Span};
use tui::widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use nflwins_api::StandingsEntry;

static TABS: &[&str; 2] = &["Standings", "Trends"];

/// One color per player line on the trends chart, cycled.
const SERIES_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightRed,
    Color::LightBlue,
    Color::White,
    Color::LightGreen,
];

const HELP_TEXT: &str = "q  quit\n\
1  standings\n\
2  trends\n\
j/k  move\n\
Enter  show teams\n\
r  refresh now\n\
f  full screen\n\
\"  logs\n\
?  this help (Esc to close)";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Trends => draw_trends(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Standings => 0,
        MenuItem::Trends => 1,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn standings_title(app: &App) -> String {
    let standings = &app.state.standings;
    match (standings.week, standings.updated_at.as_deref()) {
        (Some(week), Some(at)) => format!(" {} Standings · Week {week} · {at} ", app.season),
        (Some(week), None) => format!(" {} Standings · Week {week} ", app.season),
        _ => format!(" {} Standings ", app.season),
    }
}

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(standings_title(app));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let standings = &app.state.standings;
    let [list_area, status_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    if standings.entries.is_empty() {
        let msg = if app.state.last_error.is_some() {
            "Update failed. Press r to retry."
        } else {
            "Loading standings..."
        };
        f.render_widget(
            Paragraph::new(msg)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            list_area,
        );
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;
    for (idx, entry) in standings.entries.iter().enumerate() {
        let is_selected = idx == standings.selected;
        if is_selected {
            selected_line = lines.len();
        }
        lines.push(player_line(idx + 1, entry, is_selected, standings.is_expanded(&entry.player_id)));
        if standings.is_expanded(&entry.player_id) {
            for team in &entry.teams {
                let (summary, live) = app.team_summary(&team.code, team.wins);
                let style = if live {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Gray)
                };
                lines.push(Line::from(vec![
                    Span::raw("        "),
                    Span::styled(format!("{:<4}", team.code), Style::default().fg(Color::White)),
                    Span::styled(summary, style),
                ]));
            }
        }
    }

    let visible = list_area.height as usize;
    let scroll = selected_line.saturating_sub(visible.saturating_sub(1)) as u16;
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), list_area);

    if app.state.last_error.is_some() {
        f.render_widget(
            Paragraph::new("Update failed. Showing last standings.")
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center),
            status_area,
        );
    }
}

fn player_line(rank: usize, entry: &StandingsEntry, is_selected: bool, is_expanded: bool) -> Line<'static> {
    let marker = if is_expanded { "▾" } else { "▸" };
    let style = if is_selected {
        Style::default().fg(Color::Black).bg(Color::White)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(Span::styled(
        format!(" {marker} {rank:>2}. {:<18} {:>3}", entry.name, entry.wins),
        style,
    ))
}

fn draw_trends(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Cumulative wins by week ");
    let entries = &app.state.standings.entries;
    let weeks = entries.iter().map(|e| e.series.len()).max().unwrap_or(0);
    if weeks == 0 {
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new("No weeks tallied yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let points: Vec<Vec<(f64, f64)>> = entries
        .iter()
        .map(|e| {
            e.series
                .iter()
                .enumerate()
                .map(|(i, wins)| ((i + 1) as f64, f64::from(*wins)))
                .collect()
        })
        .collect();
    let datasets: Vec<Dataset> = entries
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (entry, data))| {
            Dataset::default()
                .name(entry.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let max_wins = entries.iter().map(|e| e.wins).max().unwrap_or(0).max(1);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Week")
                .style(Style::default().fg(Color::Gray))
                .bounds([1.0, weeks.max(2) as f64])
                .labels(["1".to_owned(), weeks.to_string()]),
        )
        .y_axis(
            Axis::default()
                .title("Wins")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, f64::from(max_wins)])
                .labels(["0".to_owned(), max_wins.to_string()]),
        );
    f.render_widget(chart, area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
