//! Create/Edit Form
//!
//! Modal editor for one entity. Locked fields (natural keys while editing,
//! everything while a save is in flight) are dimmed.

use super::centered_rect;
use crate::api::VariableHints;
use crate::panel::FormState;
use crate::resource::{FieldDef, FieldKind, Resource, ResourceKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Rows of a multiline field shown in the form
const MULTILINE_PREVIEW: usize = 4;

pub fn render<R: Resource>(f: &mut Frame, form: &FormState<R>, hints: Option<&VariableHints>) {
    let popup_area = centered_rect(70, 85, f.area());
    f.render_widget(Clear, popup_area);

    let border_color = if form.error.is_some() {
        Color::Red
    } else {
        Color::Cyan
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            form.title(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(2), // Hints / error
            Constraint::Length(1), // Keys
        ])
        .split(inner);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, field) in form.fields().iter().enumerate() {
        lines.extend(field_lines(form, field, idx == form.focus));
    }
    let body = Paragraph::new(lines).scroll((focus_scroll(form, chunks[0].height), 0));
    f.render_widget(body, chunks[0]);

    let footer = match &form.error {
        Some(err) => Line::from(Span::styled(
            format!(" {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None if form.submitting => Line::from(Span::styled(
            " Saving...",
            Style::default().fg(Color::Yellow),
        )),
        None => hint_line(form, hints),
    };
    f.render_widget(Paragraph::new(footer).wrap(Wrap { trim: true }), chunks[1]);

    let keys = Line::from(vec![
        Span::styled(" Tab/↑↓", Style::default().fg(Color::Yellow)),
        Span::raw(": field  "),
        Span::styled("←/→/Space", Style::default().fg(Color::Yellow)),
        Span::raw(": choose  "),
        Span::styled("Ctrl+S", Style::default().fg(Color::Yellow)),
        Span::raw(": save  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(": cancel"),
    ]);
    f.render_widget(Paragraph::new(keys), chunks[2]);
}

fn field_lines<R: Resource>(
    form: &FormState<R>,
    field: &FieldDef,
    focused: bool,
) -> Vec<Line<'static>> {
    let locked = form.is_locked(field);

    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if locked {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let value_style = if locked {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let marker = if focused { "▶ " } else { "  " };
    let required = if field.required { "*" } else { "" };
    let label = Span::styled(format!("{}{}{}: ", marker, field.label, required), label_style);
    let cursor = if focused && !locked { "_" } else { "" };

    let text = form.values.text(&field.key).to_string();
    let mut lines = match field.kind {
        FieldKind::Flag => {
            let mark = if form.values.flag(&field.key) { "[x]" } else { "[ ]" };
            vec![Line::from(vec![label, Span::styled(mark, value_style)])]
        },
        FieldKind::Choice => {
            let options = field
                .options
                .iter()
                .map(|o| {
                    if *o == text {
                        format!("<{}>", o)
                    } else {
                        o.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            vec![Line::from(vec![label, Span::styled(options, value_style)])]
        },
        FieldKind::Multiline => {
            let mut lines = vec![Line::from(label)];
            let body: Vec<&str> = text.lines().collect();
            let skip = body.len().saturating_sub(MULTILINE_PREVIEW);
            for l in body.iter().skip(skip) {
                lines.push(Line::from(Span::styled(format!("    {}", l), value_style)));
            }
            if body.is_empty() || text.ends_with('\n') {
                lines.push(Line::from(Span::styled(
                    format!("    {}", cursor),
                    value_style,
                )));
            } else if let Some(last) = lines.last_mut() {
                last.spans.push(Span::styled(cursor, value_style));
            }
            lines
        },
        FieldKind::Text | FieldKind::Variables => vec![Line::from(vec![
            label,
            Span::styled(format!("{}{}", text, cursor), value_style),
        ])],
    };

    if focused {
        if let Some(hint) = &field.hint {
            lines.push(Line::from(Span::styled(
                format!("    {}", hint),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    lines
}

/// Scroll so the focused field stays on screen
fn focus_scroll<R: Resource>(form: &FormState<R>, height: u16) -> u16 {
    let field_height = |f: &FieldDef| match f.kind {
        FieldKind::Multiline => MULTILINE_PREVIEW + 2,
        _ => 1,
    };
    let before: usize = form
        .fields()
        .iter()
        .take(form.focus)
        .map(field_height)
        .sum();
    let focused = form.focused().map(field_height).unwrap_or(1) + 1;
    (before + focused).saturating_sub(height as usize) as u16
}

/// Placeholders the server knows for the chosen email category
fn hint_line<R: Resource>(form: &FormState<R>, hints: Option<&VariableHints>) -> Line<'static> {
    if R::KIND != ResourceKind::EmailTemplates {
        return Line::from("");
    }
    let category = form.values.line("category");
    match hints.and_then(|h| h.get(&category)) {
        Some(names) if !names.is_empty() => {
            let listed = names
                .iter()
                .map(|n| format!("{{{{{}}}}}", n))
                .collect::<Vec<_>>()
                .join(" ");
            Line::from(vec![
                Span::styled(
                    format!(" Variables for {}: ", category),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(listed, Style::default().fg(Color::Green)),
            ])
        },
        _ => Line::from(""),
    }
}
