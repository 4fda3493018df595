use crate::app::input::helpers::navigate;
use crate::app::state::App;
use crossterm::event::KeyCode;
use taam_dashboard::confirm::{ConfirmEvent, ConfirmState, ConfirmTarget};
use tracing::warn;

pub fn handle_datasets_input(app: &mut App, key: KeyCode) {
    if app.confirm.is_open() {
        handle_confirm_input(app, key);
        return;
    }

    let total_rows = app.visible_datasets().len();
    if let Some(index) = navigate(key, app.selected_dataset_index, total_rows) {
        app.selected_dataset_index = index;
        return;
    }

    if app.search_active {
        handle_search_input(app, key);
        return;
    }

    match key {
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Enter => app.open_dashboard(),
        KeyCode::Char('/') => {
            app.search_active = true;
            app.search_query.clear();
            app.apply_search();
        }
        KeyCode::Char('r') => app.refresh_datasets(),
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('a') => app.open_admin(),
        KeyCode::Char('L') => app.sign_out(),
        KeyCode::Char('d') => {
            let target = app
                .selected_dataset()
                .map(|dataset| ConfirmTarget::new(dataset.uid.clone(), dataset.filename.clone()));
            if let Some(target) = target {
                if let Err(e) = app.confirm.process(ConfirmEvent::Open(target)) {
                    warn!("{e}");
                }
            }
        }
        KeyCode::Char('g') => generate_selected(app),
        _ => {}
    }
}

fn generate_selected(app: &mut App) {
    if app.generating.is_some() {
        app.status_message = "Chart generation already running".to_string();
        return;
    }
    if let Some(uid) = app.selected_dataset().map(|dataset| dataset.uid.clone()) {
        app.status_message = "Generating charts...".to_string();
        app.actions.generate_charts(uid.clone());
        app.generating = Some(uid);
    }
}

fn handle_search_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.open_dashboard(),
        KeyCode::Backspace => {
            app.search_query.pop();
            app.apply_search();
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.apply_search();
        }
        _ => {}
    }
}

fn handle_confirm_input(app: &mut App, key: KeyCode) {
    let event = match (app.confirm.state(), key) {
        (
            ConfirmState::Confirming(_) | ConfirmState::Failed(..),
            KeyCode::Char('y') | KeyCode::Enter,
        ) => ConfirmEvent::Accept,
        (
            ConfirmState::Confirming(_) | ConfirmState::Failed(..),
            KeyCode::Char('n') | KeyCode::Esc,
        ) => ConfirmEvent::Cancel,
        _ => return,
    };

    match app.confirm.process(event) {
        Ok(ConfirmState::Working(target)) => {
            let uid = target.id.clone();
            app.actions.delete_dataset(uid);
        }
        Ok(_) => {}
        Err(e) => warn!("{e}"),
    }
}
