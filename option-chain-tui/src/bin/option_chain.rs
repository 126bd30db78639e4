/// Option Chain Dashboard
///
/// Polls the analytics backend for the selected symbol every 30 seconds and
/// shows key metrics (spot, PCR, max pain, skew, OI totals), the OI skew and
/// volume/OI charts, and the searchable option chain table.
use std::{
    error::Error,
    fs::OpenOptions,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use option_chain_tui::{
    render_dashboard, ClientConfig, DashboardConfig, DashboardController, HttpChainClient,
    SystemClock,
};
use ratatui::{backend::CrosstermBackend, widgets::TableState, Terminal};
use rustls::crypto::ring::default_provider;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TABLE_PAGE: usize = 10;

/// Get backend URL from OPTION_CHAIN_API_URL env var (default: http://127.0.0.1:5000)
fn get_api_url() -> String {
    std::env::var("OPTION_CHAIN_API_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string())
}

/// Get symbol tabs from SYMBOLS env var (default: NIFTY,BANKNIFTY)
fn get_symbols() -> Vec<String> {
    std::env::var("SYMBOLS")
        .unwrap_or_else(|_| "NIFTY,BANKNIFTY".to_string())
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Get log file path from OPTION_CHAIN_LOG env var (default: option-chain.log)
fn get_log_path() -> String {
    std::env::var("OPTION_CHAIN_LOG").unwrap_or_else(|_| "option-chain.log".to_string())
}

/// The terminal belongs to the UI, so logs go to a file
fn init_logging() -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(get_log_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
}

fn scroll(table_state: &mut TableState, rows: usize, delta: isize) {
    if rows == 0 {
        table_state.select(None);
        return;
    }
    let current = table_state.selected().map(|i| i as isize).unwrap_or(-1);
    let next = (current + delta).clamp(0, rows as isize - 1);
    table_state.select(Some(next as usize));
}

fn switch_by(controller: &mut DashboardController, table_state: &mut TableState, offset: isize) {
    if let Some(symbol) = controller.state().cycle_symbol(offset).map(str::to_string) {
        controller.switch_symbol(symbol);
        table_state.select(None);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = default_provider().install_default();
    init_logging()?;

    let source = HttpChainClient::new(ClientConfig::new(get_api_url()))?;
    let config = DashboardConfig::default().with_symbols(get_symbols());
    let mut controller =
        DashboardController::new(config, Arc::new(source), Arc::new(SystemClock));

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    controller.start();

    let poll_rate = Duration::from_millis(250);
    let mut table_state = TableState::default();
    let mut mode = InputMode::Normal;
    let mut view = controller.view();
    terminal.draw(|f| render_dashboard(f, &view, &mut table_state, false))?;
    let mut dirty = false;

    loop {
        dirty |= controller.drain();
        if dirty {
            view = controller.view();
            if table_state.selected().is_some_and(|i| i >= view.footer.visible_rows) {
                table_state.select(None);
            }
            terminal.draw(|f| {
                render_dashboard(f, &view, &mut table_state, mode == InputMode::Search)
            })?;
            dirty = false;
        }

        if !event::poll(poll_rate)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                dirty = true;
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }

                match mode {
                    InputMode::Search => match key.code {
                        KeyCode::Esc | KeyCode::Enter => mode = InputMode::Normal,
                        KeyCode::Backspace => {
                            let mut term = controller.state().search_term.clone();
                            term.pop();
                            controller.filter_strikes(term);
                            table_state.select(None);
                        }
                        KeyCode::Char(c) => {
                            let mut term = controller.state().search_term.clone();
                            term.push(c);
                            controller.filter_strikes(term);
                            table_state.select(None);
                        }
                        _ => {}
                    },
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Tab | KeyCode::Right => {
                            switch_by(&mut controller, &mut table_state, 1)
                        }
                        KeyCode::BackTab | KeyCode::Left => {
                            switch_by(&mut controller, &mut table_state, -1)
                        }
                        KeyCode::Char(c @ '1'..='9') => {
                            let index = c as usize - '1' as usize;
                            if let Some(symbol) = controller.state().symbols.get(index).cloned() {
                                controller.switch_symbol(symbol);
                                table_state.select(None);
                            }
                        }
                        KeyCode::Char('r') => {
                            controller.load_data();
                        }
                        KeyCode::Char('a') => {
                            controller.toggle_auto_refresh();
                        }
                        KeyCode::Char('/') => mode = InputMode::Search,
                        KeyCode::Down => scroll(&mut table_state, view.footer.visible_rows, 1),
                        KeyCode::Up => scroll(&mut table_state, view.footer.visible_rows, -1),
                        KeyCode::PageDown => scroll(
                            &mut table_state,
                            view.footer.visible_rows,
                            TABLE_PAGE as isize,
                        ),
                        KeyCode::PageUp => scroll(
                            &mut table_state,
                            view.footer.visible_rows,
                            -(TABLE_PAGE as isize),
                        ),
                        KeyCode::Home => table_state.select(None),
                        _ => {}
                    },
                }
            }
            Event::Resize(_, _) => dirty = true,
            _ => {}
        }
    }

    controller.stop();
    info!("Option chain dashboard exiting");

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
