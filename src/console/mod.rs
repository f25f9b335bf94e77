//! Terminal dashboard
//!
//! A single task redraws the whole screen once per second from a fresh
//! snapshot. In headless mode the same task logs a summary line instead.

mod render;

pub use render::{Dashboard, DashboardView, buffer_text, clip, format_stats_inline, format_uptime, render_frame};

use std::io;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::constants::console::{HEADLESS_LOG_INTERVAL, REFRESH_INTERVAL};
use crate::error::RelayError;
use crate::runtime::{Shutdown, ShutdownListener};

/// Setup terminal for the dashboard
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    // Clear first so no frame is left behind in the scrollback
    terminal.clear()?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn restore_after_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
}

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static;

/// Panic hook that restores the terminal before reporting
///
/// Chains to the hook that was installed before it. Dropping the guard puts
/// that hook back, so panics after the console exits are reported normally.
struct TerminalPanicHook {
    previous: Arc<PanicHook>,
}

impl TerminalPanicHook {
    fn install() -> Self {
        Self::install_with(restore_after_panic)
    }

    fn install_with(restore: impl Fn() + Sync + Send + 'static) -> Self {
        let previous: Arc<PanicHook> = Arc::from(std::panic::take_hook());
        let chained = Arc::clone(&previous);
        std::panic::set_hook(Box::new(move |panic_info| {
            restore();
            chained(panic_info);
        }));
        Self { previous }
    }
}

impl Drop for TerminalPanicHook {
    fn drop(&mut self) {
        // set_hook panics when called from a panicking thread
        if std::thread::panicking() {
            return;
        }
        let previous = Arc::clone(&self.previous);
        std::panic::set_hook(Box::new(move |panic_info| previous(panic_info)));
    }
}

/// Run the dashboard until shutdown
///
/// Takes over the terminal. `q`, `Esc` and `Ctrl+C` trigger shutdown for the
/// whole process, since raw mode swallows the interrupt signal.
///
/// # Errors
/// [`RelayError::Terminal`] if the terminal cannot be set up or drawn to
pub async fn run_console(dashboard: Dashboard, shutdown: Arc<Shutdown>) -> Result<(), RelayError> {
    let mut terminal = setup_terminal()?;
    let panic_hook = TerminalPanicHook::install();

    let result = render_loop(&mut terminal, &dashboard, &shutdown).await;

    restore_terminal(&mut terminal)?;
    drop(panic_hook);
    result
}

async fn render_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    dashboard: &Dashboard,
    shutdown: &Shutdown,
) -> Result<(), RelayError> {
    let mut listener = shutdown.subscribe();
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = listener.wait() => break,
            _ = interval.tick() => {
                terminal.draw(|f| dashboard.draw(f, Instant::now()))?;

                if quit_requested()? {
                    info!("Quit requested from the console");
                    shutdown.trigger();
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Drain pending key events without blocking
fn quit_requested() -> io::Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(true);
                }
                _ => {}
            }
        }
    }
    Ok(false)
}

/// Log a stats summary periodically instead of drawing
pub async fn run_headless(dashboard: Dashboard, mut shutdown: ShutdownListener) {
    info!(
        "Console disabled; forwarding {} (status page {})",
        dashboard.session().forwarding(),
        dashboard.session().console_url()
    );

    let mut interval = tokio::time::interval(HEADLESS_LOG_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick fires immediately; nothing to report yet
    interval.tick().await;

    loop {
        tokio::select! {
            () = shutdown.wait() => break,
            _ = interval.tick() => {
                info!("Stats: {}", dashboard.summary(Instant::now()));
            }
        }
    }
}

/// Spawn the dashboard task, falling back to headless if the terminal fails
#[must_use]
pub fn spawn_dashboard(
    dashboard: Dashboard,
    shutdown: &Arc<Shutdown>,
    console_enabled: bool,
) -> JoinHandle<()> {
    let shutdown = Arc::clone(shutdown);
    tokio::spawn(async move {
        if console_enabled {
            match run_console(dashboard.clone(), Arc::clone(&shutdown)).await {
                Ok(()) => return,
                Err(e) => error!("Console failed, continuing headless: {}", e),
            }
        }
        run_headless(dashboard, shutdown.subscribe()).await;
    })
}
