//! The watch loop: one thread owns the monitor, the terminal and the keyboard.
//!
//! Refresh cycles run inline between key polls. A slow cycle pushes the next
//! tick back instead of queueing it, and a forced refresh can never overlap a
//! running one.

use crate::render::{self, NotifyState, View};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use monitor_core::{Monitor, RefreshReport};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const MESSAGE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Refresh,
    ToggleNotifications,
    Quit,
}

/// Raw mode swallows SIGINT, so Ctrl-C arrives here as a key.
pub fn parse_key(key: KeyEvent) -> Option<Control> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Control::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Control::Refresh),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Control::ToggleNotifications),
        KeyCode::Char('q') | KeyCode::Esc => Some(Control::Quit),
        _ => None,
    }
}

pub struct WatchOptions {
    pub interval: Duration,
    pub notify_available: bool,
    pub home: Option<PathBuf>,
}

struct WatchApp {
    monitor: Monitor,
    options: WatchOptions,
    report: RefreshReport,
    next_refresh: Instant,
    message: Option<(String, Instant)>,
}

impl WatchApp {
    fn new(mut monitor: Monitor, options: WatchOptions) -> Self {
        let report = monitor.refresh();
        let next_refresh = Instant::now() + options.interval;
        Self {
            monitor,
            options,
            report,
            next_refresh,
            message: None,
        }
    }

    fn refresh(&mut self) {
        let started = Instant::now();
        self.report = self.monitor.refresh();
        debug!(
            scan_mode = ?self.report.scan_mode,
            records = self.report.records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refresh cycle complete"
        );
        self.next_refresh = Instant::now() + self.options.interval;
    }

    fn refresh_if_due(&mut self) {
        if Instant::now() >= self.next_refresh {
            self.refresh();
        }
    }

    fn time_until_refresh(&self) -> Duration {
        self.next_refresh.saturating_duration_since(Instant::now())
    }

    fn set_message(&mut self, msg: &str) {
        self.message = Some((msg.to_string(), Instant::now() + MESSAGE_TTL));
    }

    /// Applies one control. Returns false when the loop should stop.
    fn handle(&mut self, control: Control) -> bool {
        match control {
            Control::Refresh => {
                self.refresh();
                self.set_message("Refreshed");
            }
            Control::ToggleNotifications if self.options.notify_available => {
                let enabled = self.monitor.toggle_notifications();
                info!(enabled, "Idle notifications toggled");
                self.set_message(if enabled {
                    "Idle notifications on"
                } else {
                    "Idle notifications off"
                });
            }
            Control::ToggleNotifications => {
                self.set_message("notify-send not installed; notifications unavailable");
            }
            Control::Quit => return false,
        }
        true
    }

    fn notify_state(&self) -> NotifyState {
        if !self.options.notify_available {
            NotifyState::Unavailable
        } else if self.monitor.notifications_enabled() {
            NotifyState::On
        } else {
            NotifyState::Off
        }
    }

    fn current_message(&self) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|(_, until)| Instant::now() < *until)
            .map(|(msg, _)| msg.as_str())
    }

    fn view(&self) -> View<'_> {
        View {
            report: &self.report,
            notify: self.notify_state(),
            home: self.options.home.as_deref(),
            now: Utc::now(),
            message: self.current_message(),
        }
    }
}

pub fn run(monitor: Monitor, options: WatchOptions) -> io::Result<()> {
    let mut app = WatchApp::new(monitor, options);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut WatchApp,
) -> io::Result<()> {
    loop {
        app.refresh_if_due();
        terminal.draw(|f| render::ui(f, &app.view()))?;

        if event::poll(app.time_until_refresh())? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(control) = parse_key(key) {
                    if !app.handle(control) {
                        return Ok(());
                    }
                }
            }
        }
    }
}
