use crate::app::state::{App, AppScreen};
use crossterm::event::KeyCode;

pub fn handle_upload_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => {
            app.screen = AppScreen::Datasets;
        }
        KeyCode::Enter => {
            let input = app.upload.path_input.trim().to_string();
            if input.is_empty() {
                app.start_upload();
                return;
            }
            if app.upload.running {
                app.status_message = "Wait for the current upload to finish".to_string();
                return;
            }
            for path in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                app.upload.queue.add(expand_home(path));
            }
            app.upload.progress = app.upload.queue.progress();
            app.upload.path_input.clear();
        }
        KeyCode::Backspace => {
            app.upload.path_input.pop();
        }
        KeyCode::Char(c) => app.upload.path_input.push(c),
        _ => {}
    }
}

fn expand_home(path: &str) -> std::path::PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => std::path::PathBuf::from(home).join(rest),
        _ => std::path::PathBuf::from(path),
    }
}
