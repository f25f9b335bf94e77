//! Dashboard layout
//!
//! [`DashboardView`] is a ratatui widget built from the session, a metrics
//! snapshot and `now`. The terminal draws it through `Terminal::draw`;
//! [`render_frame`] renders the same widget into an off-screen buffer of
//! [`FRAME_WIDTH`] x [`FRAME_HEIGHT`] cells and returns its rows as text.

use std::iter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::constants::console::{FRAME_HEIGHT, FRAME_WIDTH, LABEL_WIDTH, PATH_WIDTH, STATS_COLUMN_WIDTH};
use crate::metrics::{ConnectionStats, MetricsCollector, MetricsSnapshot, RequestEvent};
use crate::session::TunnelSession;

/// Column headers of the stats row
const STATS_COLUMNS: [&str; 7] = ["ttl", "opn", "rpm", "rt1", "rt5", "p50", "p90"];

const QUIT_HINT: &str = "(Ctrl+C to quit)";

/// What the console and the headless logger draw from
#[derive(Debug, Clone)]
pub struct Dashboard {
    session: Arc<TunnelSession>,
    metrics: MetricsCollector,
}

impl Dashboard {
    #[must_use]
    pub fn new(session: Arc<TunnelSession>, metrics: MetricsCollector) -> Self {
        Self { session, metrics }
    }

    #[must_use]
    pub fn session(&self) -> &TunnelSession {
        &self.session
    }

    /// Draw the current state into a terminal frame
    pub fn draw(&self, f: &mut Frame, now: Instant) {
        let snapshot = self.metrics.snapshot(now);
        f.render_widget(DashboardView::new(&self.session, &snapshot, now), f.area());
    }

    /// Render the current state as of `now` to text
    #[must_use]
    pub fn render(&self, now: Instant) -> String {
        render_frame(&self.session, &self.metrics.snapshot(now), now)
    }

    /// One-line summary for headless mode
    #[must_use]
    pub fn summary(&self, now: Instant) -> String {
        let stats = self.metrics.snapshot(now).stats;
        format!(
            "uptime={} {}",
            format_uptime(self.session.uptime(now)),
            format_stats_inline(&stats)
        )
    }
}

/// The whole dashboard as a single widget
pub struct DashboardView<'a> {
    session: &'a TunnelSession,
    snapshot: &'a MetricsSnapshot,
    now: Instant,
}

impl<'a> DashboardView<'a> {
    #[must_use]
    pub fn new(session: &'a TunnelSession, snapshot: &'a MetricsSnapshot, now: Instant) -> Self {
        Self {
            session,
            snapshot,
            now,
        }
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(1),
                Constraint::Length(5), // Session
                Constraint::Length(1),
                Constraint::Length(2), // Connections
                Constraint::Length(1),
                Constraint::Min(0), // Requests
            ])
            .split(area);

        render_title(chunks[0], buf);
        render_session(chunks[2], buf, self.session, self.now);
        render_stats(chunks[4], buf, &self.snapshot.stats);
        render_requests(chunks[6], buf, &self.snapshot.recent);
    }
}

fn label_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn render_title(area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Fill(1), Constraint::Length(QUIT_HINT.len() as u16)])
        .split(area);

    Paragraph::new(Line::from(vec![Span::styled(
        "tunnel-relay",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .render(chunks[0], buf);

    Paragraph::new(Line::from(vec![Span::styled(QUIT_HINT, label_style())]))
        .alignment(Alignment::Right)
        .render(chunks[1], buf);
}

fn render_session(area: Rect, buf: &mut Buffer, session: &TunnelSession, now: Instant) {
    let (status, status_color) = if session.is_local_only() {
        ("online (local only)", Color::Yellow)
    } else {
        ("online", Color::Green)
    };

    let rows = [
        field_row(
            "Session Status",
            Span::styled(status, Style::default().fg(status_color)),
        ),
        field_row("Uptime", Span::raw(format_uptime(session.uptime(now)))),
        field_row("Public URL", Span::raw(session.public_url())),
        field_row("Forwarding", Span::raw(session.forwarding())),
        field_row("Web Interface", Span::raw(session.console_url())),
    ];

    Widget::render(
        Table::new(rows, [Constraint::Length(LABEL_WIDTH), Constraint::Fill(1)]).column_spacing(0),
        area,
        buf,
    );
}

fn field_row(label: &'static str, value: Span<'static>) -> Row<'static> {
    Row::new([
        Cell::from(Span::styled(label, label_style())),
        Cell::from(value),
    ])
}

fn render_stats(area: Rect, buf: &mut Buffer, stats: &ConnectionStats) {
    let header = Row::new(
        iter::once(Cell::from("Connections")).chain(STATS_COLUMNS.iter().map(|name| Cell::from(*name))),
    )
    .style(label_style());
    let values = Row::new(iter::once(Cell::from("")).chain(stats_values(stats).into_iter().map(Cell::from)))
        .style(Style::default().add_modifier(Modifier::BOLD));

    let widths = iter::once(Constraint::Length(LABEL_WIDTH)).chain(iter::repeat_n(
        Constraint::Length(STATS_COLUMN_WIDTH),
        STATS_COLUMNS.len(),
    ));

    Widget::render(
        Table::new([header, values], widths).column_spacing(0),
        area,
        buf,
    );
}

fn render_requests(area: Rect, buf: &mut Buffer, recent: &[RequestEvent]) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(label_style())
        .title(Span::styled(
            "HTTP Requests",
            Style::default().add_modifier(Modifier::BOLD),
        ));

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(PATH_WIDTH + 1),
        Constraint::Fill(1),
    ];

    Widget::render(
        Table::new(recent.iter().map(request_row), widths)
            .column_spacing(0)
            .block(block),
        area,
        buf,
    );
}

/// `time method path status text`, with a marker for locally served hits
fn request_row(event: &RequestEvent) -> Row<'static> {
    let status_color = match event.status_code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Yellow,
        _ => Color::Red,
    };

    let mut status = vec![Span::styled(
        format!("{} {}", event.status_code, event.status_text),
        Style::default().fg(status_color),
    )];
    if !event.forwarded {
        status.push(Span::styled(" (local)", label_style()));
    }

    Row::new([
        Cell::from(event.timestamp.format("%H:%M:%S").to_string()),
        Cell::from(clip(&event.method, 7)),
        Cell::from(clip(&event.path, usize::from(PATH_WIDTH))),
        Cell::from(Line::from(status)),
    ])
}

/// Render the dashboard off-screen and return it as text, one row per line
#[must_use]
pub fn render_frame(session: &TunnelSession, snapshot: &MetricsSnapshot, now: Instant) -> String {
    let area = Rect::new(0, 0, FRAME_WIDTH, FRAME_HEIGHT);
    let mut buf = Buffer::empty(area);
    DashboardView::new(session, snapshot, now).render(area, &mut buf);
    buffer_text(&buf)
}

/// Cell symbols of a buffer, row by row
#[must_use]
pub fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut text = String::with_capacity(usize::from(area.width + 1) * usize::from(area.height));
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            text.push_str(buf[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

fn stats_values(stats: &ConnectionStats) -> [String; 7] {
    [
        stats.total.to_string(),
        stats.active.to_string(),
        stats.requests_1m.to_string(),
        format!("{:.2}", stats.rt1),
        format!("{:.2}", stats.rt5),
        format!("{:.2}", stats.p50),
        format!("{:.2}", stats.p90),
    ]
}

/// `ttl=.. opn=..` form used by the headless log line
#[must_use]
pub fn format_stats_inline(stats: &ConnectionStats) -> String {
    STATS_COLUMNS
        .iter()
        .zip(stats_values(stats))
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1h 02m 03s`, `4m 05s` or `9s`
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Cut `text` to at most `width` characters
///
/// Cut text ends in `~` so a truncated path is recognizable.
#[must_use]
pub fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    if width > 0 {
        out.push('~');
    }
    out
}
