pub mod screens;
pub mod widgets;

use crate::app::{App, AppScreen};
use ratatui::Frame;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    match app.screen {
        AppScreen::Login => screens::login::render_login(app, f),
        AppScreen::Datasets => screens::datasets::render_datasets(app, f),
        AppScreen::Dashboard => screens::dashboard::render_dashboard(app, f),
        AppScreen::Upload => screens::upload::render_upload(app, f),
        AppScreen::Admin => screens::admin::render_admin(app, f),
        AppScreen::AdminUser => screens::admin::render_admin_user(app, f),
    }

    if app.show_help {
        screens::help::render_help(app, f);
    }
}
