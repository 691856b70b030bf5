mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::refresher::PeriodicRefresher;
use anyhow::{Context, bail};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use nflwins_api::cache::ScoreCache;
use nflwins_api::client::{GameFeed, HttpClient};
use nflwins_api::clock::{Clock, SystemClock};
use nflwins_api::context::LeagueContext;
use nflwins_api::league::{self, LeagueStore, default_league};
use nflwins_api::live::{LIVE_REFRESH_INTERVAL, LiveTracker};
use nflwins_api::scoreboard::Scoreboard;
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Duration;
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args()? {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scores = Scoreboard::new(
        GameFeed::from_env(HttpClient::new()),
        ScoreCache::from_env(clock.clone()),
    );
    let ctx = Arc::new(match LeagueStore::from_env() {
        Some(store) => LeagueContext::load(store, scores, clock.clone()),
        None => LeagueContext::new(default_league(clock.now()), scores, clock.clone()),
    });
    log::info!("feed sources: {}", ctx.scores().feed().source_names().join(" -> "));

    let live = Arc::new(LiveTracker::new(ctx.clone()));
    let live_task = live.spawn(LIVE_REFRESH_INTERVAL);

    let app = Arc::new(Mutex::new(App::new(ctx.season(), live)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(ctx.clone(), network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Standings refresh every 5 minutes
    let periodic_updater = PeriodicRefresher::new(network_req_tx.clone());
    let periodic_task = tokio::spawn(periodic_updater.run());

    // Redraw so live overlays follow the snapshot
    let live_tx = ui_event_tx.clone();
    let redraw_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            if live_tx.send(UiEvent::LiveTick).await.is_err() {
                break;
            }
        }
    });

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();
    periodic_task.abort();
    redraw_task.abort();
    live_task.cancel();

    Ok(())
}

/// Returns `Ok(true)` when the arguments were handled and the TUI should not start.
fn handle_cli_args() -> anyhow::Result<bool> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(arg) = args.first() else {
        return Ok(false);
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            Ok(true)
        }
        "-V" | "--version" => {
            println!("nflwins {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }
        "--league" => {
            let store = league_store()?;
            let league = store.load_or_default(SystemClock.now());
            println!("{} ({} season)", store.path().display(), league.start_year);
            for player in &league.players {
                let teams: Vec<&str> = player.teams.iter().map(|t| t.as_str()).collect();
                println!("  {:<4} {:<16} {}", player.id, player.name, teams.join(", "));
            }
            Ok(true)
        }
        "--rename" => {
            let [_, id, name @ ..] = args.as_slice() else {
                bail!("usage: nflwins --rename <player-id> <name>");
            };
            let store = league_store()?;
            let mut league = store.load_or_default(SystemClock.now());
            league::rename_player(&mut league, id, &name.join(" "))?;
            store.save(&league)?;
            println!("{id} is now {}", league.player(id).map_or("?", |p| p.name.as_str()));
            Ok(true)
        }
        "--teams" => {
            let [_, id, teams @ ..] = args.as_slice() else {
                bail!("usage: nflwins --teams <player-id> <team, team, ...>");
            };
            let store = league_store()?;
            let mut league = store.load_or_default(SystemClock.now());
            let teams = league::set_player_teams(&mut league, id, &teams.join(" "))?;
            store.save(&league)?;
            let codes: Vec<&str> = teams.iter().map(|t| t.as_str()).collect();
            println!("{id} now owns {}", codes.join(", "));
            Ok(true)
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn league_store() -> anyhow::Result<LeagueStore> {
    LeagueStore::from_env().context("no place to keep the league: set NFLWINS_LEAGUE_JSON or HOME")
}

fn usage_text() -> &'static str {
    "nflwins - NFL wins league tracker

Usage:
  nflwins
  nflwins --league
  nflwins --rename <player-id> <name>
  nflwins --teams <player-id> <team, team, ...>
  nflwins --help
  nflwins --version

Environment:
  RAPIDAPI_KEY          Tank01 key, tried before ESPN (also NFLWINS_RAPIDAPI_KEY)
  NFLWINS_PROXY_URL     Base URL of a scoreboard-proxy, tried before ESPN
  NFLWINS_LEAGUE_JSON   League file (default ~/.config/nflwins/league.json)
  NFLWINS_CACHE_DIR     Score cache directory (default ~/.cache/nflwins)
  NFLWINS_LOG           Log level for the log pane (error, warn, info, debug)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw = handle_network_response(response, &app, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = network_requests.send(NetworkRequest::RefreshStandings).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize | UiEvent::LiveTick => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::StandingsLoaded { week, standings } => {
            let mut guard = app.lock().await;
            guard.on_standings_loaded(week, standings);
        }
        NetworkResponse::Error { message } => {
            error!("Update failed: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        let event = match tokio::task::spawn_blocking(crossterm_event::read).await {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                error!("terminal input error: {e}");
                continue;
            }
            Err(_) => break,
        };
        let ui_event = match event {
            Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
            Event::Resize(_, _) => Some(UiEvent::Resize),
            _ => None,
        };

        if let Some(ui_event) = ui_event
            && ui_events.send(ui_event).await.is_err()
        {
            break;
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
