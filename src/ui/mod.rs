//! Terminal User Interface rendering module
//!
//! This module handles all UI rendering for tcms using the ratatui framework.
//! Each resource tab is drawn by the same generic panel renderer: a toolbar
//! with the search box and category filter above a table of the loaded
//! collection.
//!
//! # Architecture
//!
//! - `header` - Tab bar, API endpoint and action hints
//! - `form` - Create/edit modal
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Confirmation and warning dialogs
//! - `notifications` - Mutation history overlay
//!
//! # Virtual Scrolling
//!
//! The table rendering uses virtual scrolling for performance with large datasets.
//! Only visible rows are rendered, with a scrollbar indicating position.
//!
//! # JSON Highlighting
//!
//! The describe view provides syntax highlighting for JSON output:
//! - Keys in cyan
//! - Strings in green
//! - Numbers in light blue
//! - Booleans in magenta
//! - Null values in dark gray

mod dialog;
mod form;
mod header;
mod help;
mod notifications;

use crate::app::{with_panel, App, Mode};
use crate::notification::NotificationStatus;
use crate::panel::{Panel, PanelState};
use crate::resource::{extract_json_value, get_color_for_value, ColumnDef, Resource};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState, Wrap,
    },
    Frame,
};

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header (tabs + context)
            Constraint::Min(1),    // Main content (panel or describe)
            Constraint::Length(1), // Footer/crumb
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);

    if app.mode == Mode::Describe {
        render_describe_view(f, app, chunks[1]);
    } else {
        with_panel!(&mut app.active, panel => render_panel(f, panel, chunks[1]),
            else render_banners(f, chunks[1]));
    }

    render_crumb(f, app, chunks[2]);

    // Overlays
    match app.mode {
        Mode::Help => help::render(f, app),
        Mode::Confirm | Mode::Warning => dialog::render(f, app),
        Mode::Notifications => notifications::render(f, app),
        Mode::Form => {
            let hints = app.session.store.variable_hints.as_ref();
            with_panel!(&app.active, panel => {
                if let Some(state) = &panel.form {
                    form::render(f, state, hints);
                }
            });
        },
        _ => {},
    }
}

/// Placeholder for the banners tab, whose content is managed elsewhere
fn render_banners(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " System Banners ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "System banners are managed from the banners admin page.",
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            "Tab/Shift+Tab to switch to another section",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_panel<R: Resource>(f: &mut Frame, panel: &mut Panel<R>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    render_toolbar(f, panel, chunks[0]);
    render_table(f, panel, chunks[1]);
}

fn render_toolbar<R: Resource>(f: &mut Frame, panel: &Panel<R>, area: Rect) {
    let search_style = if panel.search_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let search_display = if panel.search_active {
        format!("/{}_", panel.search_text)
    } else if panel.search_text.is_empty() {
        "/search".to_string()
    } else {
        format!("/{}", panel.search_text)
    };

    let category_style = if panel.category() == crate::panel::ALL_CATEGORIES {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    };

    let line = Line::from(vec![
        Span::styled(format!(" {:<30}", search_display), search_style),
        Span::styled(
            format!("  {}: ", panel.def().category_label),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(panel.category().to_string(), category_style),
        Span::styled("  (c/C)", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Render the panel's collection as a table
/// Uses virtual scrolling for performance with large datasets
fn render_table<R: Resource>(f: &mut Frame, panel: &mut Panel<R>, area: Rect) {
    let def = panel.def();

    let title = {
        let count = panel.visible_len();
        let total = panel.items().len();
        let counts = if count == total {
            format!("[{}]", count)
        } else {
            format!("[{}/{}]", count, total)
        };
        let page_info = R::page_number(panel.filter())
            .map(|n| format!(" pg.{}", n))
            .unwrap_or_default();
        let loading = if panel.is_loading() { " ↻" } else { "" };
        format!(" {}{}{}{} ", def.display_name, counts, page_info, loading)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    // Nothing loaded yet: show the state instead of an empty table
    if panel.items().is_empty() {
        let (message, style) = match &panel.state {
            PanelState::LoadError(err) => (
                format!("Failed to load: {}", err),
                Style::default().fg(Color::Red),
            ),
            PanelState::Idle | PanelState::Loading => {
                ("Loading...".to_string(), Style::default().fg(Color::Yellow))
            },
            PanelState::Loaded => (
                format!("No {} yet. Press n to create one.", def.display_name.to_lowercase()),
                Style::default().fg(Color::DarkGray),
            ),
        };
        let paragraph = Paragraph::new(message)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, inner_area);
        return;
    }

    // Calculate viewport - account for header row
    let visible_height = (inner_area.height as usize).saturating_sub(1);
    panel.update_viewport(visible_height);
    panel.ensure_visible();

    let total_items = panel.visible_len();
    let needs_scrollbar = total_items > visible_height;

    let table_area = if needs_scrollbar {
        Rect {
            width: inner_area.width.saturating_sub(1),
            ..inner_area
        }
    } else {
        inner_area
    };

    let range = panel.visible_range();

    let header_cells: Vec<Cell> = def
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let header_text = if panel.sort_column == Some(idx) {
                let indicator = if panel.sort_ascending { "▲" } else { "▼" };
                format!(" {} {}", col.header, indicator)
            } else {
                format!(" {}", col.header)
            };

            Cell::from(header_text).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();

    let header = Row::new(header_cells).height(1);

    // Build only visible rows (virtual scrolling)
    let rows: Vec<Row> = panel
        .visible_items()
        .skip(range.start)
        .take(range.len())
        .map(|(_, row)| {
            let cells = def.columns.iter().map(|col| {
                let value = extract_json_value(row, &col.json_path);
                let style = get_cell_style(&value, col);
                Cell::from(format!(" {}", truncate_string(&value, 48))).style(style)
            });
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = def
        .columns
        .iter()
        .map(|col| Constraint::Percentage(col.width))
        .collect();

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    // Adjust selected index for virtual scrolling
    let mut state = TableState::default();
    if range.contains(&panel.selected) {
        state.select(Some(panel.selected - range.start));
    }

    f.render_stateful_widget(table, table_area, &mut state);

    if needs_scrollbar {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(symbols::scrollbar::VERTICAL)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state = ScrollbarState::new(total_items.saturating_sub(visible_height))
            .position(panel.scroll_offset);

        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

/// Get cell style based on value and column definition
fn get_cell_style(value: &str, col: &ColumnDef) -> Style {
    if let Some(ref color_map_name) = col.color_map {
        if let Some([r, g, b]) = get_color_for_value(color_map_name, value) {
            return Style::default().fg(Color::Rgb(r, g, b));
        }
    }
    Style::default()
}

/// Truncate string for display (Unicode-safe), flattening newlines
fn truncate_string(s: &str, max_len: usize) -> String {
    let flat = s.replace(['\n', '\r'], " ");
    let char_count = flat.chars().count();
    if char_count > max_len {
        let truncated: String = flat.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        flat
    }
}

fn render_describe_view(f: &mut Frame, app: &App, area: Rect) {
    let json = app
        .describe_json
        .clone()
        .unwrap_or_else(|| "No item selected".to_string());

    let lines: Vec<Line> = json.lines().map(highlight_json_line).collect();
    let total_lines = lines.len();

    let title = format!(" {} Details ", app.tab.title());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let visible_lines = inner_area.height as usize;
    let max_scroll = total_lines.saturating_sub(visible_lines);
    let scroll = app.describe_scroll.min(max_scroll);

    let paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
    f.render_widget(paragraph, inner_area);

    if total_lines > visible_lines {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(max_scroll + visible_lines).position(scroll);
        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

/// Apply JSON syntax highlighting to a single line
fn highlight_json_line(line: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = line.chars().peekable();
    let mut current = String::new();
    let mut is_key = true;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if !current.is_empty() {
                    spans.push(Span::raw(current.clone()));
                    current.clear();
                }

                let mut string_content = String::from("\"");
                while let Some(&next_c) = chars.peek() {
                    chars.next();
                    string_content.push(next_c);
                    if next_c == '"' {
                        break;
                    }
                    if next_c == '\\' {
                        if let Some(&escaped) = chars.peek() {
                            chars.next();
                            string_content.push(escaped);
                        }
                    }
                }

                let style = if is_key {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Green)
                };
                spans.push(Span::styled(string_content, style));
            },
            ':' => {
                current.push(c);
                spans.push(Span::styled(
                    current.clone(),
                    Style::default().fg(Color::White),
                ));
                current.clear();
                is_key = false;
            },
            ',' => {
                if !current.is_empty() {
                    spans.push(Span::styled(current.clone(), get_json_value_style(&current)));
                    current.clear();
                }
                spans.push(Span::styled(",", Style::default().fg(Color::White)));
                is_key = true;
            },
            '{' | '}' | '[' | ']' => {
                if !current.is_empty() {
                    spans.push(Span::styled(current.clone(), get_json_value_style(&current)));
                    current.clear();
                }
                spans.push(Span::styled(
                    c.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
                if c == '{' || c == '[' {
                    is_key = c == '{';
                }
            },
            ' ' | '\t' => {
                if !current.is_empty() {
                    spans.push(Span::styled(current.clone(), get_json_value_style(&current)));
                    current.clear();
                }
                spans.push(Span::raw(c.to_string()));
            },
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        let style = get_json_value_style(&current);
        spans.push(Span::styled(current, style));
    }

    Line::from(spans)
}

/// Get style for JSON values (numbers, booleans, null)
fn get_json_value_style(value: &str) -> Style {
    let trimmed = value.trim();
    if trimmed == "null" {
        Style::default().fg(Color::DarkGray)
    } else if trimmed == "true" || trimmed == "false" {
        Style::default().fg(Color::Magenta)
    } else if trimmed.parse::<f64>().is_ok() {
        Style::default().fg(Color::LightBlue)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_crumb(f: &mut Frame, app: &App, area: Rect) {
    let notifications = &app.session.notifications;

    let toast = notifications.current_toast();
    let toast_text = toast.map(|notif| notif.toast_message(notifications.detail_level));

    let notification_indicator = {
        let in_progress = notifications.in_progress_count();
        if in_progress > 0 {
            format!(" [↻{}]", in_progress)
        } else if notifications.has_notifications() {
            " [N]".to_string()
        } else {
            String::new()
        }
    };

    let (searching, paged) = with_panel!(&app.active, panel => {
        (panel.search_active, panel.def().paged)
    }, else (false, false));

    let status_text = if let Some(ref toast) = toast_text {
        toast.clone()
    } else {
        match app.mode {
            Mode::Describe => "j/k: scroll | q/d/Esc: back".to_string(),
            Mode::Form => "Tab: next field | Ctrl+S: save | Esc: cancel".to_string(),
            _ if searching => "Type to search | Enter: apply | Esc: clear".to_string(),
            _ if paged => "n:new e:edit x:delete | [/]: page".to_string(),
            _ if app.has_panel() => "n:new e:edit x:delete".to_string(),
            _ => String::new(),
        }
    };

    let style = match toast.map(|n| &n.status) {
        Some(NotificationStatus::Success) => Style::default().fg(Color::Green),
        Some(NotificationStatus::Error(_)) => Style::default().fg(Color::Red),
        Some(NotificationStatus::Pending) => Style::default().fg(Color::Yellow),
        None => Style::default().fg(Color::DarkGray),
    };

    let indicator_style = if notifications.in_progress_count() > 0 {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let crumb = Line::from(vec![
        Span::styled(
            format!("<{}>", app.tab.key()),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(status_text, style),
        Span::styled(notification_indicator, indicator_style),
    ]);

    f.render_widget(Paragraph::new(crumb), area);
}

/// Center a popup of the given percentage size inside `r`
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_is_char_safe() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("ééééééééééé", 6), "ééé...");
        assert_eq!(truncate_string("a\nb", 10), "a b");
    }

    #[test]
    fn test_json_value_styles() {
        assert_eq!(get_json_value_style("null").fg, Some(Color::DarkGray));
        assert_eq!(get_json_value_style("true").fg, Some(Color::Magenta));
        assert_eq!(get_json_value_style("42").fg, Some(Color::LightBlue));
    }

    #[test]
    fn test_highlight_keeps_text() {
        let line = highlight_json_line(r#"  "key": "intro","#);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, r#"  "key": "intro","#);
    }
}
