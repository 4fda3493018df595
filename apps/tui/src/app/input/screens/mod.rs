use crate::app::state::{App, AppScreen};
use crossterm::event::KeyCode;

mod admin;
mod dashboard;
mod datasets;
mod help;
mod login;
mod upload;

pub fn dispatch_input(app: &mut App, key: KeyCode) {
    if help::handle_help_toggle(app, key) {
        return;
    }
    if app.show_help {
        return;
    }

    match app.screen {
        AppScreen::Login => login::handle_login_input(app, key),
        AppScreen::Datasets => datasets::handle_datasets_input(app, key),
        AppScreen::Dashboard => dashboard::handle_dashboard_input(app, key),
        AppScreen::Upload => upload::handle_upload_input(app, key),
        AppScreen::Admin => admin::handle_admin_input(app, key),
        AppScreen::AdminUser => admin::handle_admin_user_input(app, key),
    }
}
