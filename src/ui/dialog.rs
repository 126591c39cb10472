//! Dialog Components
//!
//! Confirmation dialog for deletes and import actions, and the OK-only
//! warning shown when read-only mode blocks a change.

use super::centered_rect;
use crate::app::{App, Mode, PendingAction, PendingKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    match (&app.mode, &app.pending_action, &app.warning_message) {
        (Mode::Confirm, Some(pending), _) => render_confirm(f, pending),
        (Mode::Warning, _, Some(message)) => render_warning(f, message),
        _ => {},
    }
}

/// Clear a centered area and draw a titled frame around it, returning the
/// inner area
fn popup(f: &mut Frame, width: u16, height: u16, title: &str, color: Color) -> Rect {
    let area = centered_rect(width, height, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn button(label: &str, selected: bool, fill: Color) -> Span<'static> {
    let style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(fill)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {} ", label), style)
}

fn render_confirm(f: &mut Frame, pending: &PendingAction) {
    let (title, accent) = match (&pending.kind, pending.destructive) {
        (PendingKind::Delete { .. }, _) => ("Confirm Delete", Color::Red),
        (PendingKind::Import { .. }, true) => ("Confirm Import", Color::Red),
        (PendingKind::Import { .. }, false) => ("Confirm Import", Color::Yellow),
    };
    let inner = popup(f, 50, 25, title, accent);

    let [message_area, _, buttons_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(2),
    ])
    .areas(inner);

    let mut lines = vec![Line::from(Span::styled(
        pending.message.as_str(),
        Style::default().fg(Color::White),
    ))];
    if let PendingKind::Delete { id, .. } = &pending.kind {
        lines.push(Line::from(Span::styled(
            format!("#{} is removed on the server immediately", id),
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        message_area,
    );

    let yes_fill = if pending.destructive {
        Color::Red
    } else {
        Color::Green
    };
    let buttons = Line::from(vec![
        button("Yes (y)", pending.selected_yes, yes_fill),
        Span::raw("    "),
        button("No (n)", !pending.selected_yes, Color::White),
    ]);
    f.render_widget(
        Paragraph::new(buttons).alignment(Alignment::Center),
        buttons_area,
    );
}

fn render_warning(f: &mut Frame, message: &str) {
    let inner = popup(f, 50, 20, "Warning", Color::Yellow);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter/Esc: close",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(content).alignment(Alignment::Center), inner);
}
