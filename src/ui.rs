use chrono::Utc;
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Points},
        Block, Borders, Paragraph, Widget, Wrap,
    },
};
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use bullseye::score::FACE_CENTER;
use bullseye::session::Session;
use bullseye::timer::{TimerPhase, WARNING_SECS};
use bullseye::util::{group_spread, mean, std_dev};

use crate::{App, AppState};

/// Ring outlines from the outer edge inwards, in World Archery colors.
const RING_OUTLINES: [(f64, Color); 10] = [
    (50.0, Color::White),
    (45.0, Color::White),
    (40.0, Color::DarkGray),
    (35.0, Color::DarkGray),
    (30.0, Color::Blue),
    (25.0, Color::Blue),
    (20.0, Color::Red),
    (15.0, Color::Red),
    (10.0, Color::Yellow),
    (5.0, Color::Yellow),
];

pub fn format_clock(total_secs: u32) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Setup => render_setup(self, area, buf),
            AppState::Timer => render_timer(self, area, buf),
            AppState::Scoring => render_scoring(self, area, buf),
            AppState::Summary => render_summary(self, area, buf),
        }
    }
}

fn centered_block(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(top),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    chunks[1]
}

fn render_setup(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let title = if app.competition {
        "COMPETITION MODE"
    } else {
        "NEW PRACTICE"
    };

    let rows: [(&str, String); 4] = [
        ("distance", format!("{}m", app.distance_meters)),
        ("arrows per end", format!("{}", app.arrows_per_end)),
        (
            "bow",
            format!(
                "{} (clock {})",
                app.bow_category,
                format_clock(app.bow_category.match_secs())
            ),
        ),
        (
            "whistles",
            if app.cue_sink.muted { "muted" } else { "on" }.to_string(),
        ),
    ];
    let label_width = rows.iter().map(|(label, _)| label.width()).max().unwrap_or(0);

    let mut lines = vec![
        Line::from(Span::styled(title, bold.fg(Color::Green))),
        Line::from(""),
    ];
    for (label, value) in &rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>width$}  ", label, width = label_width), dim),
            Span::styled(value.clone(), bold),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "←/→/d distance · a arrows · b bow · c competition · m mute",
        dim,
    )));
    lines.push(Line::from(Span::styled("enter start · q quit", dim)));

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered_block(area, height), buf);
}

fn render_timer(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let (label, clock, color) = match app.timer.phase() {
        TimerPhase::Idle => ("READY?", format_clock(app.timer.match_secs()), Color::Gray),
        TimerPhase::Preparation { remaining } => {
            ("STEP TO THE LINE", format_clock(remaining), Color::Magenta)
        }
        TimerPhase::Active { remaining } => (
            "SHOOT",
            format_clock(remaining),
            if remaining <= WARNING_SECS {
                Color::Yellow
            } else {
                Color::Green
            },
        ),
        TimerPhase::Expired => ("ARROWS DOWN", format_clock(0), Color::Red),
    };

    let help = match app.timer.phase() {
        TimerPhase::Idle => "s start · esc back to scoring",
        TimerPhase::Expired => "enter proceed to scoring · s restart · esc back",
        _ => "f finish end · esc stop",
    };

    let lines = vec![
        Line::from(Span::styled(
            label,
            bold.fg(color).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from(Span::styled(clock, bold.fg(color))),
        Line::from(""),
        Line::from(Span::styled(help, dim)),
    ];

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered_block(area, height), buf);
}

fn render_scoring(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = &app.session else {
        Paragraph::new("no active session: press esc")
            .alignment(Alignment::Center)
            .render(centered_block(area, 1), buf);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    render_target(app, session, chunks[0], buf);
    render_scorecard(app, session, chunks[1], buf);
}

fn render_target(app: &App, session: &Session, area: Rect, buf: &mut Buffer) {
    // The stored y axis points down (screen convention); the canvas y
    // axis points up.
    let shots: Vec<(f64, f64)> = session
        .current_end()
        .shots()
        .iter()
        .map(|s| (s.x, 100.0 - s.y))
        .collect();
    let pending: Vec<(f64, f64)> = app
        .pending_shot
        .iter()
        .map(|s| (s.x, 100.0 - s.y))
        .collect();
    let cursor = [(app.cursor.0, 100.0 - app.cursor.1)];

    Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}m target", session.distance_meters)),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, 100.0])
        .y_bounds([0.0, 100.0])
        .paint(|ctx| {
            for (radius, color) in RING_OUTLINES {
                ctx.draw(&Circle {
                    x: FACE_CENTER,
                    y: FACE_CENTER,
                    radius,
                    color,
                });
            }
            if !shots.is_empty() {
                ctx.draw(&Points {
                    coords: &shots,
                    color: Color::Green,
                });
            }
            if !pending.is_empty() {
                ctx.draw(&Points {
                    coords: &pending,
                    color: Color::Magenta,
                });
            }
            ctx.draw(&Points {
                coords: &cursor,
                color: Color::Red,
            });
        })
        .render(area, buf);
}

fn render_scorecard(app: &App, session: &Session, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let current = session.current_end();
    let slots = (0..usize::from(session.arrows_per_end))
        .map(|i| {
            current
                .shots()
                .get(i)
                .map(|s| s.value.to_string())
                .unwrap_or_else(|| "·".to_string())
        })
        .join(" ");

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("End {}", session.current_end_index() + 1), bold),
            Span::styled(
                format!("   {} / {} arrows", current.len(), session.arrows_per_end),
                dim,
            ),
        ]),
        Line::from(vec![
            Span::styled(slots, bold.fg(Color::Cyan)),
            Span::styled(format!("   = {}", current.total()), bold),
        ]),
        Line::from(vec![
            Span::styled("Total ", dim),
            Span::styled(
                format!("{} / {}", session.running_total(), session.max_possible()),
                bold,
            ),
        ]),
        Line::from(""),
    ];

    if let Some(shot) = &app.pending_shot {
        lines.push(Line::from(Span::styled(
            format!(
                "pending {}: arrow number 1-9, enter to skip, esc to cancel",
                shot.value
            ),
            Style::default().fg(Color::Magenta),
        )));
        lines.push(Line::from(""));
    }

    for (i, end) in session.ends().iter().enumerate() {
        if end.is_empty() {
            continue;
        }
        let marker = if i == session.current_end_index() {
            "▸"
        } else {
            " "
        };
        let row = end.shots().iter().map(|s| s.value.to_string()).join(" ");
        lines.push(Line::from(Span::styled(
            format!("{} End {:<2} {:<13} {:>3}", marker, i + 1, row, end.total()),
            if i == session.current_end_index() {
                bold
            } else {
                dim
            },
        )));
    }
    lines.push(Line::from(""));

    if let Some(saved_ms) = app.resumed_save_ms {
        let elapsed_secs = (Utc::now().timestamp_millis() - saved_ms) / 1000;
        lines.push(Line::from(Span::styled(
            format!("resumed session saved {}", HumanTime::from(-elapsed_secs)),
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(Span::styled(
        "move ←↑↓→ · enter shot · u undo · s submit end · [/] browse",
        dim,
    )));
    let finish_help = if app.competition {
        "t timer · f finish · x abandon · esc setup"
    } else {
        "f finish · x abandon · esc setup"
    };
    lines.push(Line::from(Span::styled(finish_help, dim)));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("scorecard"))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let Some(record) = &app.summary else {
        Paragraph::new("nothing to summarize: press enter")
            .alignment(Alignment::Center)
            .render(centered_block(area, 1), buf);
        return;
    };

    let end_totals: Vec<f64> = record
        .ends_snapshot
        .iter()
        .map(|e| e.total() as f64)
        .collect();
    let shots: Vec<_> = record
        .ends_snapshot
        .iter()
        .flat_map(|e| e.shots())
        .collect();
    let inner_tens = shots.iter().filter(|s| s.value.is_inner_ten()).count();
    let tens = shots
        .iter()
        .filter(|s| s.value.points() == 10 && !s.value.is_inner_ten())
        .count();
    let misses = shots.iter().filter(|s| s.value.is_miss()).count();
    let on_face: Vec<(f64, f64)> = shots
        .iter()
        .filter(|s| !s.value.is_miss())
        .map(|s| (s.x, s.y))
        .collect();

    let mut lines = vec![
        Line::from(Span::styled("SESSION SAVED", bold.fg(Color::Green))),
        Line::from(""),
        Line::from(vec![
            Span::styled("score  ", dim),
            Span::styled(
                format!("{} / {}", record.total_score, record.total_arrows * 10),
                bold,
            ),
        ]),
        Line::from(vec![
            Span::styled("ends   ", dim),
            Span::styled(
                format!(
                    "{} × {} arrows at {}m",
                    record.ends_snapshot.len(),
                    record.arrows_per_end,
                    record.distance_meters
                ),
                bold,
            ),
        ]),
        Line::from(vec![
            Span::styled("tally  ", dim),
            Span::styled(format!("{}X · {} tens · {} misses", inner_tens, tens, misses), bold),
        ]),
    ];

    if let (Some(avg), Some(sd)) = (mean(&end_totals), std_dev(&end_totals)) {
        lines.push(Line::from(vec![
            Span::styled("per end", dim),
            Span::styled(format!(" {:.1} avg · {:.1} sd", avg, sd), bold),
        ]));
    }
    if let Some(spread) = group_spread(&on_face) {
        lines.push(Line::from(vec![
            Span::styled("group  ", dim),
            Span::styled(format!("{:.1} spread", spread), bold),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("enter new session · q quit", dim)));

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered_block(area, height), buf);
}
