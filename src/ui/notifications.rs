//! Notifications Panel UI
//!
//! History of create, update, delete and import requests, newest first.

use super::centered_rect;
use crate::app::App;
use crate::notification::{Notification, NotificationStatus};
use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use std::time::Duration;

const COLUMNS: [(&str, Constraint); 6] = [
    (" STATUS", Constraint::Length(8)),
    (" ACTION", Constraint::Length(26)),
    (" RESOURCE", Constraint::Length(24)),
    (" DETAIL", Constraint::Min(20)),
    (" DURATION", Constraint::Length(12)),
    (" TIME AGO", Constraint::Length(12)),
];

pub fn render(f: &mut Frame, app: &App) {
    let manager = &app.session.notifications;
    let popup_area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, popup_area);

    let title = match manager.in_progress_count() {
        0 => " Notifications History ".to_string(),
        n => format!(" Notifications History [{} in progress] ", n),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let [list_area, keys_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    if manager.notifications.is_empty() {
        let msg = Paragraph::new("No notifications yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, list_area);
    } else {
        let header = Row::new(COLUMNS.iter().map(|(name, _)| {
            Cell::from(*name).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        }));
        let table = Table::new(
            manager.notifications.iter().map(history_row),
            COLUMNS.map(|(_, width)| width),
        )
        .header(header)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

        let mut state = TableState::default().with_selected(Some(app.notifications_selected));
        f.render_stateful_widget(table, list_area, &mut state);
    }

    let keys = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(": navigate  "),
        Span::styled("c", Style::default().fg(Color::Yellow)),
        Span::raw(": clear all  "),
        Span::styled("q/N/Esc", Style::default().fg(Color::Yellow)),
        Span::raw(": close"),
    ]);
    f.render_widget(Paragraph::new(keys).alignment(Alignment::Center), keys_area);
}

fn history_row(notif: &Notification) -> Row<'static> {
    let (status_color, detail, detail_color) = row_detail(notif);

    Row::new(vec![
        Cell::from(format!(" {}", notif.status.icon())).style(Style::default().fg(status_color)),
        Cell::from(format!(" {}", notif.operation_type.display_name())),
        Cell::from(format!(" {}", notif.resource_type)),
        Cell::from(format!(" {}", truncate(&detail, 50))).style(Style::default().fg(detail_color)),
        Cell::from(format!(" {}", notif.duration_display())),
        Cell::from(format!(" {}", format_time_ago(notif.created_at.elapsed()))),
    ])
}

/// Status color, detail text and detail color of one history row. Errors and
/// success summaries replace the subject.
fn row_detail(notif: &Notification) -> (Color, String, Color) {
    match &notif.status {
        NotificationStatus::Pending => (Color::Yellow, notif.subject.clone(), Color::White),
        NotificationStatus::Success => (
            Color::Green,
            notif.message.clone().unwrap_or_else(|| notif.subject.clone()),
            Color::White,
        ),
        NotificationStatus::Error(err) => (Color::Red, err.clone(), Color::Red),
    }
}

fn format_time_ago(elapsed: Duration) -> String {
    match elapsed.as_secs() {
        s if s < 60 => format!("{}s ago", s),
        s if s < 3600 => format!("{}m ago", s / 60),
        s => format!("{}h ago", s / 3600),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::OperationType;

    #[test]
    fn test_format_time_ago() {
        assert_eq!(format_time_ago(Duration::from_secs(5)), "5s ago");
        assert_eq!(format_time_ago(Duration::from_secs(125)), "2m ago");
        assert_eq!(format_time_ago(Duration::from_secs(7200)), "2h ago");
    }

    #[test]
    fn test_truncate_keeps_short_detail() {
        assert_eq!(truncate("Created faq_1", 50), "Created faq_1");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_row_detail_follows_status() {
        let mut notif = Notification::new(
            OperationType::Delete,
            "content-blocks".to_string(),
            "intro".to_string(),
        );
        assert_eq!(row_detail(&notif), (Color::Yellow, "intro".to_string(), Color::White));

        notif.set_error("Block not found".to_string());
        assert_eq!(
            row_detail(&notif),
            (Color::Red, "Block not found".to_string(), Color::Red)
        );
    }

    #[test]
    fn test_row_detail_prefers_success_summary() {
        let mut notif = Notification::new(
            OperationType::Create,
            "content-blocks".to_string(),
            "faq_1".to_string(),
        );
        notif.set_success(Some("Created faq_1".to_string()));
        assert_eq!(row_detail(&notif).1, "Created faq_1");
        assert_eq!(row_detail(&notif).0, Color::Green);
    }
}
