//! Frame rendering for the watch view.
//!
//! One rounded outer block carries the counts. Each working directory gets its
//! own block in the colour derived from its path, with one row per process.

use chrono::{DateTime, Utc};
use monitor_core::grouping::{
    extract_tty_name, format_cpu, format_duration, format_memory, group_by_directory,
    status_label, ProjectGroup,
};
use monitor_core::{ProcessRecord, ProcessStatus, RefreshReport};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
    Frame,
};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyState {
    On,
    Off,
    Unavailable,
}

impl NotifyState {
    fn label(self) -> &'static str {
        match self {
            NotifyState::On => "on",
            NotifyState::Off => "off",
            NotifyState::Unavailable => "unavailable",
        }
    }

    fn color(self) -> Color {
        match self {
            NotifyState::On => Color::Green,
            NotifyState::Off => Color::Gray,
            NotifyState::Unavailable => Color::DarkGray,
        }
    }
}

/// Everything a single frame needs.
pub struct View<'a> {
    pub report: &'a RefreshReport,
    pub notify: NotifyState,
    pub home: Option<&'a Path>,
    pub now: DateTime<Utc>,
    /// Transient footer text, shown instead of the key help.
    pub message: Option<&'a str>,
}

/// Maps a palette name from `path_to_color` onto a terminal colour.
pub fn group_color(name: &str) -> Color {
    match name {
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "light-blue" => Color::LightBlue,
        "light-magenta" => Color::LightMagenta,
        "light-cyan" => Color::LightCyan,
        _ => Color::Gray,
    }
}

pub fn ui(f: &mut Frame, view: &View) {
    let area = f.area();
    let records = &view.report.records;
    let active = records
        .iter()
        .filter(|record| record.status.is_active())
        .count();

    let main_block = Block::default()
        .title(Line::from(vec![
            Span::styled(" ◆ ", Style::default().fg(Color::Cyan)),
            Span::styled(
                "Claude Monitor ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "({} running, {} active, {} idle) ",
                    records.len(),
                    active,
                    records.len() - active
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = main_block.inner(area);
    f.render_widget(main_block, area);

    let chunks = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(inner);
    let body_area = chunks[0];
    let footer_area = chunks[1];

    if records.is_empty() {
        let empty_msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No Claude processes found",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        f.render_widget(empty_msg, body_area);
    } else {
        let groups = group_by_directory(records, view.home);
        render_groups(f, &groups, body_area, view.now);
    }

    f.render_widget(Paragraph::new(footer_line(view)), footer_area);
}

fn render_groups(f: &mut Frame, groups: &[ProjectGroup], area: Rect, now: DateTime<Utc>) {
    let bottom = area.y.saturating_add(area.height);
    let mut y = area.y;

    for group in groups {
        if y >= bottom {
            break;
        }
        let rows = u16::try_from(group.records.len()).unwrap_or(u16::MAX);
        let height = rows.saturating_add(2).min(bottom - y);
        let group_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height,
        };
        render_group(f, group, group_area, now);
        y = y.saturating_add(height);
    }
}

fn render_group(f: &mut Frame, group: &ProjectGroup, area: Rect, now: DateTime<Utc>) {
    let color = group_color(group.color);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", group.display_path),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .padding(Padding::horizontal(1));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = group
        .records
        .iter()
        .map(|record| record_line(record, now))
        .collect::<Vec<_>>();
    f.render_widget(Paragraph::new(lines), inner);
}

fn record_line(record: &ProcessRecord, now: DateTime<Utc>) -> Line<'static> {
    let status_style = match record.status {
        ProcessStatus::Active => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        ProcessStatus::Idle => Style::default().fg(Color::DarkGray),
    };
    let detail = Style::default().fg(Color::Gray);

    Line::from(vec![
        Span::styled(status_label(record.status), status_style),
        Span::styled(
            format!("  {:>7}", record.pid),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("  {:<8}", extract_tty_name(&record.tty)), detail),
        Span::styled(
            format!(" {:>5}", format_duration(record.last_status_change, now)),
            detail,
        ),
        Span::styled(
            format!("  cpu {:>5}", format_cpu(record.metrics.cpu_percent)),
            detail,
        ),
        Span::styled(
            format!("  mem {:>6}", format_memory(record.metrics.memory_rss)),
            detail,
        ),
        Span::styled(
            format!("  conn {}", record.metrics.active_connections),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn footer_line(view: &View) -> Line<'static> {
    if let Some(message) = view.message {
        return Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(Color::Cyan),
        ));
    }

    Line::from(vec![
        Span::styled(" [r]", Style::default().fg(Color::DarkGray)),
        Span::styled(" Refresh ", Style::default().fg(Color::Gray)),
        Span::styled(" [n]", Style::default().fg(Color::DarkGray)),
        Span::styled(" Notifications: ", Style::default().fg(Color::Gray)),
        Span::styled(view.notify.label(), Style::default().fg(view.notify.color())),
        Span::styled(" ", Style::default()),
        Span::styled(" [q]", Style::default().fg(Color::DarkGray)),
        Span::styled(" Quit ", Style::default().fg(Color::Gray)),
    ])
}
