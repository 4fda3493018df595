use crate::app::input::helpers::{navigate, wrap_decrement, wrap_increment};
use crate::app::state::App;
use crossterm::event::KeyCode;
use taam_dashboard::domain::{FilterDimension, FilterValue};

pub fn handle_dashboard_input(app: &mut App, key: KeyCode) {
    let Some(dashboard) = app.dashboard.as_ref() else {
        app.close_dashboard();
        return;
    };

    if dashboard.dropdown.is_some() {
        handle_dropdown_input(app, key);
        return;
    }

    match key {
        KeyCode::Esc | KeyCode::Char('b') => app.close_dashboard(),
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Tab | KeyCode::Right => focus_filter(app, true),
        KeyCode::BackTab | KeyCode::Left => focus_filter(app, false),
        KeyCode::Enter | KeyCode::Char(' ') => open_dropdown(app),
        KeyCode::Char('c') => clear_filters(app),
        KeyCode::Char('m') => load_more(app),
        KeyCode::Char('r') => {
            if let Some(dashboard) = &app.dashboard {
                app.actions.refetch_summary(dashboard.loader.clone());
            }
        }
        KeyCode::Char('g') => {
            if app.generating.is_none() {
                let uid = dashboard.loader.dataset_id().to_string();
                app.status_message = "Generating charts...".to_string();
                app.actions.generate_charts(uid.clone());
                app.generating = Some(uid);
            }
        }
        _ => move_respondent(app, key),
    }
}

fn focus_filter(app: &mut App, forward: bool) {
    if let Some(dashboard) = app.dashboard.as_mut() {
        let count = FilterDimension::ALL.len();
        dashboard.focused_filter = if forward {
            wrap_increment(dashboard.focused_filter, count)
        } else {
            wrap_decrement(dashboard.focused_filter, count)
        };
    }
}

/// Dropdown entries for the focused dimension: "all" then the backend options.
fn dropdown_len(app: &App) -> usize {
    app.dashboard.as_ref().map_or(0, |dashboard| {
        dashboard
            .snapshot
            .filter_options
            .options(dashboard.focused_dimension())
            .len()
            + 1
    })
}

fn open_dropdown(app: &mut App) {
    if let Some(dashboard) = app.dashboard.as_mut() {
        let dimension = dashboard.focused_dimension();
        let options = dashboard.snapshot.filter_options.options(dimension);
        let current = dashboard
            .selection
            .get(dimension)
            .and_then(|value| options.iter().position(|option| option == value))
            .map_or(0, |index| index + 1);
        dashboard.dropdown = Some(current);
    }
}

fn handle_dropdown_input(app: &mut App, key: KeyCode) {
    let len = dropdown_len(app);
    let Some(dashboard) = app.dashboard.as_mut() else {
        return;
    };
    let cursor = dashboard.dropdown.unwrap_or(0);

    match key {
        KeyCode::Esc => dashboard.dropdown = None,
        KeyCode::Up => dashboard.dropdown = Some(wrap_decrement(cursor, len)),
        KeyCode::Down => dashboard.dropdown = Some(wrap_increment(cursor, len)),
        KeyCode::Enter => {
            dashboard.dropdown = None;
            let dimension = dashboard.focused_dimension();
            let value = match cursor {
                0 => FilterValue::All,
                index => dashboard
                    .snapshot
                    .filter_options
                    .options(dimension)
                    .get(index - 1)
                    .map_or(FilterValue::All, |option| FilterValue::Only(option.clone())),
            };
            let Some(baseline) = dashboard.snapshot.distribution_chart().cloned() else {
                app.status_message = "No distribution chart to filter yet".to_string();
                return;
            };
            dashboard.filtering = true;
            app.actions
                .set_filter(dashboard.filters.clone(), dimension, value, baseline);
        }
        _ => {}
    }
}

fn clear_filters(app: &mut App) {
    let Some(dashboard) = app.dashboard.as_mut() else {
        return;
    };
    let Some(baseline) = dashboard.snapshot.distribution_chart().cloned() else {
        return;
    };
    dashboard.filtering = true;
    app.actions
        .clear_filters(dashboard.filters.clone(), baseline);
}

fn load_more(app: &App) {
    if let Some(dashboard) = &app.dashboard {
        let snapshot = &dashboard.snapshot;
        if snapshot.has_more && !snapshot.loading_more && !snapshot.loading {
            app.actions.load_more(dashboard.loader.clone());
        }
    }
}

/// Respondent list navigation; reaching the last card pulls the next page.
fn move_respondent(app: &mut App, key: KeyCode) {
    let Some(dashboard) = app.dashboard.as_mut() else {
        return;
    };
    let total = dashboard.snapshot.respondent_charts.len();
    let Some(index) = navigate(key, dashboard.selected_respondent, total) else {
        return;
    };
    dashboard.selected_respondent = index;
    if index + 1 >= total {
        load_more(app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::{AppScreen, DashboardView};
    use std::time::Duration;
    use taam_dashboard::{ApiClient, Session, TokenStorage};

    fn app_with_dashboard() -> App {
        let client = match ApiClient::new(
            "http://127.0.0.1:9",
            Session::new(TokenStorage::memory()),
            Duration::from_secs(1),
        ) {
            Ok(client) => client,
            Err(e) => panic!("client: {e}"),
        };
        let mut view = DashboardView::open(&client, "d1");
        view.snapshot.loading = false;
        view.snapshot.filter_options.genders = vec!["Female".to_string(), "Male".to_string()];
        let mut app = App::new(client);
        app.dashboard = Some(view);
        app.screen = AppScreen::Dashboard;
        app
    }

    fn dropdown(app: &App) -> Option<usize> {
        app.dashboard.as_ref().and_then(|dashboard| dashboard.dropdown)
    }

    #[tokio::test]
    async fn dropdown_opens_on_all_and_closes_on_escape() {
        let mut app = app_with_dashboard();
        handle_dashboard_input(&mut app, KeyCode::Tab);
        handle_dashboard_input(&mut app, KeyCode::Enter);
        assert_eq!(dropdown(&app), Some(0));

        handle_dashboard_input(&mut app, KeyCode::Down);
        handle_dashboard_input(&mut app, KeyCode::Down);
        handle_dashboard_input(&mut app, KeyCode::Down);
        assert_eq!(dropdown(&app), Some(0));

        handle_dashboard_input(&mut app, KeyCode::Esc);
        assert_eq!(dropdown(&app), None);
        assert_eq!(app.screen, AppScreen::Dashboard);
    }

    #[tokio::test]
    async fn choosing_a_filter_needs_a_distribution_chart() {
        let mut app = app_with_dashboard();
        handle_dashboard_input(&mut app, KeyCode::Tab);
        handle_dashboard_input(&mut app, KeyCode::Enter);
        handle_dashboard_input(&mut app, KeyCode::Down);
        handle_dashboard_input(&mut app, KeyCode::Enter);

        assert_eq!(dropdown(&app), None);
        assert_eq!(app.status_message, "No distribution chart to filter yet");
        assert!(app.dashboard.as_ref().is_some_and(|dashboard| !dashboard.filtering));
    }

    #[tokio::test]
    async fn escape_leaves_the_dashboard() {
        let mut app = app_with_dashboard();
        handle_dashboard_input(&mut app, KeyCode::Esc);
        assert!(app.dashboard.is_none());
        assert_eq!(app.screen, AppScreen::Datasets);
    }
}
