//! Event Handling
//!
//! Keyboard and event handling for tcms.

use crate::app::{with_panel, App, Mode, Tab};
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::{Duration, Instant};

/// Rows moved by PageUp/PageDown and Ctrl+D/U
const PAGE_SIZE: usize = 10;

/// Handle events, returns true if app should quit
pub fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return Ok(handle_key_event(app, key.code, key.modifiers));
        }
    }
    Ok(false)
}

pub fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match app.mode {
        Mode::Normal => return handle_normal_mode(app, code, modifiers),
        Mode::Form => handle_form_mode(app, code, modifiers),
        Mode::Help => handle_help_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code),
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Describe => handle_describe_mode(app, code, modifiers),
        Mode::Notifications => handle_notifications_mode(app, code),
    }
    false
}

#[derive(Debug, Clone, Copy)]
enum Nav {
    Down,
    Up,
    Top,
    Bottom,
    PageDown,
    PageUp,
}

fn navigate(app: &mut App, nav: Nav) {
    with_panel!(&mut app.active, panel => {
        match nav {
            Nav::Down => panel.next(),
            Nav::Up => panel.previous(),
            Nav::Top => panel.go_to_top(),
            Nav::Bottom => panel.go_to_bottom(),
            Nav::PageDown => panel.page_down(PAGE_SIZE),
            Nav::PageUp => panel.page_up(PAGE_SIZE),
        }
        panel.ensure_visible();
    });
}

/// Feed a key to the search box; returns false when search isn't active
fn handle_search_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    let mut committed = false;
    let handled = with_panel!(&mut app.active, panel => {
        if !panel.search_active {
            return false;
        }
        match code {
            KeyCode::Esc => {
                panel.clear_search();
                committed = true;
            },
            KeyCode::Enter => {
                panel.search_active = false;
                committed = true;
            },
            KeyCode::Backspace => {
                panel.search_text.pop();
                panel.apply_filter();
            },
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                panel.search_text.push(c);
                panel.apply_filter();
            },
            _ => {},
        }
        true
    }, else false);

    if committed {
        app.rescope();
    }
    handled
}

fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    if handle_search_input(app, code, modifiers) {
        return false;
    }

    // Double-g goes to top
    if code == KeyCode::Char('g') {
        if let Some((KeyCode::Char('g'), time)) = app.last_key_press {
            if time.elapsed() < Duration::from_millis(1000) {
                navigate(app, Nav::Top);
                app.last_key_press = None;
                return false;
            }
        }
        app.last_key_press = Some((code, Instant::now()));
        return false;
    }
    app.last_key_press = None;

    match code {
        KeyCode::Char('q') => return true,

        // Tabs
        KeyCode::Tab => app.switch_tab(app.tab.next()),
        KeyCode::BackTab => app.switch_tab(app.tab.previous()),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            if let Some(tab) = Tab::ALL.get(index) {
                app.switch_tab(*tab);
            }
        },

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => navigate(app, Nav::Down),
        KeyCode::Char('k') | KeyCode::Up => navigate(app, Nav::Up),
        KeyCode::Home => navigate(app, Nav::Top),
        KeyCode::End | KeyCode::Char('G') => navigate(app, Nav::Bottom),
        KeyCode::PageDown => navigate(app, Nav::PageDown),
        KeyCode::PageUp => navigate(app, Nav::PageUp),
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            navigate(app, Nav::PageDown)
        },
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            navigate(app, Nav::PageUp)
        },

        // Sorting with F1-F6, F12 clears
        KeyCode::F(n @ 1..=6) => {
            with_panel!(&mut app.active, panel => panel.sort_by_column((n - 1) as usize));
        },
        KeyCode::F(12) => {
            with_panel!(&mut app.active, panel => panel.clear_sort());
        },

        // Filters
        KeyCode::Char('/') => {
            with_panel!(&mut app.active, panel => panel.search_active = true);
        },
        KeyCode::Char('c') => app.cycle_category(true),
        KeyCode::Char('C') => app.cycle_category(false),

        // Paging
        KeyCode::Char(']') => app.turn_page(true),
        KeyCode::Char('[') => app.turn_page(false),

        KeyCode::Char('R') => app.refresh(),

        // Mutations
        KeyCode::Char('n') => app.open_create(),
        KeyCode::Char('e') => app.open_edit(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete(),

        KeyCode::Enter | KeyCode::Char('d') => app.enter_describe_mode(),

        KeyCode::Char('N') => app.enter_notifications_mode(),
        KeyCode::Char('?') => app.enter_help_mode(),

        // Import action shortcuts from the schema
        KeyCode::Char(c) => {
            app.request_action(c);
        },

        _ => {},
    }

    false
}

fn handle_form_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Esc {
        app.close_form();
        return;
    }
    if code == KeyCode::Char('s') && modifiers.contains(KeyModifiers::CONTROL) {
        app.submit_form();
        return;
    }

    with_panel!(&mut app.active, panel => {
        let Some(form) = panel.form.as_mut() else {
            return;
        };
        match code {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Enter => form.enter(),
            KeyCode::Left => form.cycle_choice(false),
            KeyCode::Right => form.cycle_choice(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => form.input(c),
            _ => {},
        }
    });
}

fn handle_help_mode(app: &mut App, code: KeyCode) {
    if matches!(
        code,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter
    ) {
        app.exit_mode();
    }
}

fn handle_confirm_mode(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            app.confirm_pending(false);
        },
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
        },
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = false;
            }
        },
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_pending(true),
        KeyCode::Enter => {
            let accepted = app
                .pending_action
                .as_ref()
                .is_some_and(|pending| pending.selected_yes);
            app.confirm_pending(accepted);
        },
        _ => {},
    }
}

fn handle_warning_mode(app: &mut App, code: KeyCode) {
    if matches!(code, KeyCode::Esc | KeyCode::Enter) {
        app.exit_mode();
    }
}

fn handle_describe_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
            app.exit_mode();
        },
        KeyCode::Char('j') | KeyCode::Down => {
            app.describe_scroll = app.describe_scroll.saturating_add(1);
        },
        KeyCode::Char('k') | KeyCode::Up => {
            app.describe_scroll = app.describe_scroll.saturating_sub(1);
        },
        KeyCode::PageDown => {
            app.describe_scroll = app.describe_scroll.saturating_add(PAGE_SIZE);
        },
        KeyCode::PageUp => {
            app.describe_scroll = app.describe_scroll.saturating_sub(PAGE_SIZE);
        },
        KeyCode::Char('d') => {
            if modifiers.contains(KeyModifiers::CONTROL) {
                app.describe_scroll = app.describe_scroll.saturating_add(PAGE_SIZE);
            } else {
                app.exit_mode();
            }
        },
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.describe_scroll = app.describe_scroll.saturating_sub(PAGE_SIZE);
        },
        KeyCode::Char('g') | KeyCode::Home => {
            app.describe_scroll = 0;
        },
        KeyCode::Char('G') | KeyCode::End => {
            app.describe_scroll_to_bottom(30); // Approximate visible lines
        },
        _ => {},
    }
}

fn handle_notifications_mode(app: &mut App, code: KeyCode) {
    let count = app.session.notifications.notifications.len();
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('N') => app.exit_mode(),
        KeyCode::Char('j') | KeyCode::Down => {
            if count > 0 {
                app.notifications_selected = (app.notifications_selected + 1).min(count - 1);
            }
        },
        KeyCode::Char('k') | KeyCode::Up => {
            app.notifications_selected = app.notifications_selected.saturating_sub(1);
        },
        KeyCode::Char('c') => app.clear_notifications(),
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CmsClient;
    use crate::config::Config;

    fn app_on(tab: Tab) -> App {
        let client = CmsClient::new("http://127.0.0.1:9", None).unwrap();
        App::new(client, Config::default(), tab, false)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app_on(Tab::Banners);
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut app,
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        ));
    }

    #[tokio::test]
    async fn test_search_captures_keys() {
        let mut app = app_on(Tab::ContentBlocks);
        press(&mut app, KeyCode::Char('/'));
        // 'q' is typed into the search box, not a quit
        assert!(!press(&mut app, KeyCode::Char('q')));
        let text = with_panel!(&app.active, panel => panel.search_text.clone());
        assert_eq!(text, "q");

        press(&mut app, KeyCode::Esc);
        let (text, active) =
            with_panel!(&app.active, panel => (panel.search_text.clone(), panel.search_active));
        assert!(text.is_empty());
        assert!(!active);
    }

    #[tokio::test]
    async fn test_committed_search_reaches_email_filter() {
        let mut app = app_on(Tab::EmailTemplates);
        press(&mut app, KeyCode::Char('/'));
        for c in "invite".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let search = |app: &App| match &app.active {
            crate::app::ActivePanel::EmailTemplates(panel) => panel.filter().search.clone(),
            _ => panic!("email templates are mounted"),
        };
        // Typing only narrows locally
        assert_eq!(search(&app), None);

        press(&mut app, KeyCode::Enter);
        assert_eq!(search(&app).as_deref(), Some("invite"));

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(search(&app), None);
    }

    #[tokio::test]
    async fn test_form_typing_and_escape() {
        let mut app = app_on(Tab::ContentBlocks);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Form);

        for c in "faq_1".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let key = with_panel!(&app.active, panel => {
            panel.form.as_ref().map(|f| f.values.text("key").to_string())
        });
        assert_eq!(key.as_deref(), Some("faq_1"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn test_invalid_submit_stays_in_form() {
        let mut app = app_on(Tab::ContentBlocks);
        press(&mut app, KeyCode::Char('n'));
        handle_key_event(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(app.mode, Mode::Form);
        let error = with_panel!(&app.active, panel => {
            panel.form.as_ref().and_then(|f| f.error.clone())
        });
        assert_eq!(error.as_deref(), Some("Key is required"));
    }

    #[tokio::test]
    async fn test_confirm_can_be_declined() {
        let mut app = app_on(Tab::ContentBlocks);
        press(&mut app, KeyCode::Char('I'));
        assert_eq!(app.mode, Mode::Confirm);
        assert!(app.pending_action.as_ref().is_some_and(|p| p.selected_yes));

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.pending_action.is_none());
        assert!(!app.session.notifications.has_notifications());
    }
}
