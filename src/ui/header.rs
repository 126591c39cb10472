//! Header Component
//!
//! Tab bar plus the API endpoint and the current panel's import actions.

use crate::app::{with_panel, App, Tab};
use crate::VERSION;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" tcms v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Row 1: Tabs
    let mut tabs = vec![Span::raw(" ")];
    for (idx, tab) in Tab::ALL.iter().enumerate() {
        let style = if *tab == app.tab {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tabs.push(Span::styled(format!(" {}:{} ", idx + 1, tab.title()), style));
        tabs.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

    // Row 2: Endpoint and actions
    let mut context = vec![
        Span::styled(" API: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.session.client.base_url().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    let actions = with_panel!(&app.active, panel => {
        panel
            .def()
            .actions
            .iter()
            .filter_map(|a| {
                a.shortcut.as_ref().map(|s| {
                    let style = if a.confirm.as_ref().is_some_and(|c| c.destructive) {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Span::styled(format!(" [{}]{} ", s, a.display_name), style)
                })
            })
            .collect::<Vec<_>>()
    });
    if !actions.is_empty() {
        context.push(Span::styled("  Actions:", Style::default().fg(Color::DarkGray)));
        context.extend(actions);
    }
    f.render_widget(Paragraph::new(Line::from(context)), rows[1]);

    // Row 3: Help hint
    let help_line = Line::from(vec![
        Span::styled(
            " ?:help  Tab:section  /:search  c:category  n:new  e:edit  R:refresh  N:history  q:quit",
            Style::default().fg(Color::DarkGray),
        ),
        if app.readonly {
            Span::styled(
                "  [READ-ONLY]",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("")
        },
    ]);
    f.render_widget(Paragraph::new(help_line), rows[2]);
}
