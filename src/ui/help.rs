//! Help Overlay
//!
//! Shows keyboard shortcuts, including the import actions of the current tab.

use super::centered_rect;
use crate::app::{with_panel, App};
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, ↑/↓", "Move up/down"),
            ("gg / G", "Go to top / bottom"),
            ("Ctrl+d/u", "Page down/up"),
            ("Tab/S-Tab", "Next/previous section"),
            ("1-4", "Jump to section"),
            ("[/]", "Previous/next server page"),
        ],
    ),
    (
        "Views",
        &[
            ("Enter/d", "View entity as JSON"),
            ("R", "Refresh from the server"),
            ("N", "Change history"),
            ("F1-F6", "Sort by column, F12 clears"),
        ],
    ),
    (
        "Filtering",
        &[
            ("/", "Search"),
            ("Esc", "Clear search"),
            ("c/C", "Next/previous category"),
        ],
    ),
    (
        "Editing",
        &[
            ("n", "New entity"),
            ("e", "Edit selected"),
            ("Ctrl+S", "Save form"),
            ("Esc", "Cancel form"),
        ],
    ),
];

fn key_line(key: &str, description: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(color)),
        Span::raw(description.to_string()),
    ])
}

pub fn render(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, popup_area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(*title, bold)));
        help_text.extend(keys.iter().map(|(k, d)| key_line(k, d, Color::Yellow)));
        help_text.push(Line::from(""));
    }

    help_text.push(Line::from(Span::styled("Actions", bold)));
    help_text.push(key_line("x/Delete", "Delete selected (asks first)", Color::Red));
    let actions = with_panel!(&app.active, panel => {
        panel
            .def()
            .actions
            .iter()
            .filter_map(|a| a.shortcut.as_ref().map(|s| (s.clone(), a.display_name.clone())))
            .collect::<Vec<_>>()
    });
    help_text.extend(actions.iter().map(|(s, d)| key_line(s, d, Color::Yellow)));
    help_text.push(Line::from(""));

    help_text.push(key_line("?/Esc", "Close help", Color::Yellow));
    help_text.push(key_line("q", "Quit application", Color::Yellow));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
}
