use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, View};

/// File written by the export key.
pub const EXPORT_FILE: &str = "sheetwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits, even while typing a search.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.search_active {
        handle_search_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Table),
        KeyCode::Char('2') => app.set_view(View::Dashboard),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Char('r') => app.refresh_all(),
        KeyCode::Char('?') => app.toggle_help(),

        // Filters only apply to the table.
        KeyCode::Char('/') if app.current_view == View::Table => app.start_search(),
        KeyCode::Char('f') if app.current_view == View::Table => app.cycle_column_filter(),
        KeyCode::Char('x') => app.clear_filters(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exportado para {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Falha ao exportar: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while the search prompt is open
fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.apply_search(),
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::RefreshRequest;
    use crate::poller::testing::{snapshot, ScriptedSource};
    use crate::poller::{PollConfig, Poller};
    use crate::source::QueryHandle;
    use crate::ui::Theme;
    use crate::view::TableView;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    async fn app() -> App {
        let source = ScriptedSource::new();
        source.push(snapshot(json!({
            "rows": [{"nome": "Ana", "plano": "anual"}, {"nome": "Rui", "plano": "mensal"}]
        })));
        let config = PollConfig::new(std::time::Duration::from_secs(8)).unwrap();
        let poller: Arc<Poller<_, TableView>> = Arc::new(Poller::new(source, config));
        poller.tick().await;
        App::with_theme(poller.handle(), None, QueryHandle::new(), "scripted", Theme::dark())
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = app().await;
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_search_typing_does_not_trigger_shortcuts() {
        let mut app = app().await;
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert!(app.search_active);

        for c in "rq".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)));
        }
        assert!(app.running);
        assert_eq!(app.search_text, "rq");
        assert!(app.take_refresh_requests().is_empty());

        handle_key_event(&mut app, key(KeyCode::Backspace));
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.search_filter(), "r");
        assert_eq!(
            app.take_refresh_requests(),
            vec![RefreshRequest::Table { force: true }]
        );
    }

    #[tokio::test]
    async fn test_help_swallows_next_key() {
        let mut app = app().await;
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[tokio::test]
    async fn test_navigation_and_reload() {
        let mut app = app().await;
        handle_key_event(&mut app, key(KeyCode::Down));
        assert_eq!(app.selected_row, 1);
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.selected_row, 0);

        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert_eq!(
            app.take_refresh_requests(),
            vec![RefreshRequest::Table { force: true }]
        );
    }

    #[tokio::test]
    async fn test_column_filter_key() {
        let mut app = app().await;
        handle_key_event(&mut app, key(KeyCode::Char('f')));
        assert_eq!(app.column_filter(), "nome");
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.column_filter(), "");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_search() {
        let mut app = app().await;
        app.start_search();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!app.running);
    }
}
