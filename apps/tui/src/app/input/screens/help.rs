use crate::app::state::{App, AppScreen};
use crossterm::event::KeyCode;

/// Screens where `?` is ordinary text.
const fn is_typing(app: &App) -> bool {
    matches!(app.screen, AppScreen::Login | AppScreen::Upload)
        || (matches!(app.screen, AppScreen::Datasets) && app.search_active)
}

pub fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Char('?') if !is_typing(app) => {
            app.show_help = !app.show_help;
            true
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            true
        }
        _ => false,
    }
}
