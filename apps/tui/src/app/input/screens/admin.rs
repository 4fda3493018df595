use crate::app::input::helpers::{navigate, wrap_increment};
use crate::app::state::{App, AppScreen};
use crossterm::event::KeyCode;

pub fn handle_admin_input(app: &mut App, key: KeyCode) {
    if let Some(index) = navigate(key, app.admin.selected, app.admin.users.len()) {
        app.admin.selected = index;
        return;
    }

    match key {
        KeyCode::Esc => {
            app.screen = AppScreen::Datasets;
        }
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Char('r') => app.open_admin(),
        KeyCode::Enter => app.open_admin_user(),
        _ => {}
    }
}

pub fn handle_admin_user_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => {
            app.screen = AppScreen::Admin;
        }
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            app.admin.chart_tab = wrap_increment(app.admin.chart_tab, 2);
        }
        KeyCode::Char('q') => {
            app.running = false;
        }
        _ => {}
    }
}
