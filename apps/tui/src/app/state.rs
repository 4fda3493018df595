use std::collections::HashMap;
use std::time::{Duration, Instant};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use taam_dashboard::charts::{
    ChartDataLoader, FilterController, FilterOutcome, LoadOutcome, LoaderSnapshot, SummaryUpdates,
};
use taam_dashboard::confirm::{ConfirmDialog, ConfirmEvent};
use taam_dashboard::domain::{
    AdminUser, ChartCount, Dataset, FilterDimension, FilterSelection, GenerateOutcome, User,
    UserCharts, UserDatasets,
};
use taam_dashboard::upload::UploadQueue;
use taam_dashboard::ApiClient;
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::actions::{AppActions, AppMessage};

const THROBBER_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Login,
    Datasets,
    Dashboard,
    Upload,
    Admin,
    AdminUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub field: LoginField,
    pub submitting: bool,
    pub error: Option<String>,
}

impl LoginForm {
    pub const fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            field: LoginField::Email,
            submitting: false,
            error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// The open dataset: its loader, its filters and what the UI last saw.
///
/// Dropping the view tears both controllers down, so nothing from a closed
/// dashboard can land in the next one.
#[derive(Debug)]
pub struct DashboardView {
    pub loader: ChartDataLoader,
    pub filters: FilterController,
    pub updates: SummaryUpdates,
    pub snapshot: LoaderSnapshot,
    pub selection: FilterSelection,
    pub selected_respondent: usize,
    pub focused_filter: usize,
    /// Option cursor of the open dropdown; 0 is "All".
    pub dropdown: Option<usize>,
    pub filtering: bool,
    pub filter_error: Option<String>,
}

impl DashboardView {
    pub fn open(client: &ApiClient, dataset_id: &str) -> Self {
        let loader = ChartDataLoader::new(client.clone(), dataset_id);
        let (filters, updates) = FilterController::new(client.clone(), dataset_id);
        Self {
            loader,
            filters,
            updates,
            snapshot: LoaderSnapshot {
                loading: true,
                ..LoaderSnapshot::default()
            },
            selection: FilterSelection::default(),
            selected_respondent: 0,
            focused_filter: 0,
            dropdown: None,
            filtering: false,
            filter_error: None,
        }
    }

    pub fn focused_dimension(&self) -> FilterDimension {
        FilterDimension::from_index(self.focused_filter).unwrap_or(FilterDimension::AgeGroup)
    }

    /// Applies published filter results and refreshes the snapshot.
    pub fn sync(&mut self) {
        let applied = self.loader.apply_pending(&mut self.updates);
        if applied > 0 {
            debug!("applied {applied} filtered summary charts");
        }
        self.snapshot = self.loader.snapshot();
        self.selection = self.filters.selection();

        let total = self.snapshot.respondent_charts.len();
        if total > 0 && self.selected_respondent >= total {
            self.selected_respondent = total - 1;
        }
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        self.loader.teardown();
        self.filters.teardown();
    }
}

#[derive(Debug, Default)]
pub struct UploadView {
    pub queue: UploadQueue,
    pub path_input: String,
    pub running: bool,
    pub progress: (usize, usize),
}

#[derive(Debug, Default)]
pub struct AdminView {
    pub users: Vec<AdminUser>,
    pub selected: usize,
    pub loading: bool,
    pub detail: Option<(UserDatasets, UserCharts)>,
    pub chart_tab: usize,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub screen: AppScreen,
    pub actions: AppActions,
    pub messages: mpsc::UnboundedReceiver<AppMessage>,
    pub status_message: String,
    pub show_help: bool,
    pub login: LoginForm,
    pub user: Option<User>,
    pub datasets: Vec<Dataset>,
    pub chart_counts: HashMap<String, ChartCount>,
    pub datasets_loading: bool,
    pub selected_dataset_index: usize,
    pub search_active: bool,
    pub search_query: String,
    pub filtered_dataset_indices: Vec<usize>,
    pub confirm: ConfirmDialog,
    pub generating: Option<String>,
    pub dashboard: Option<DashboardView>,
    pub upload: UploadView,
    pub admin: AdminView,
    pub throbber: ThrobberState,
    pub last_frame: Instant,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        let (tx, messages) = mpsc::unbounded_channel();
        Self {
            running: true,
            screen: AppScreen::Login,
            actions: AppActions::new(client, tx),
            messages,
            status_message: String::new(),
            show_help: false,
            login: LoginForm::new(),
            user: None,
            datasets: Vec::new(),
            chart_counts: HashMap::new(),
            datasets_loading: false,
            selected_dataset_index: 0,
            search_active: false,
            search_query: String::new(),
            filtered_dataset_indices: Vec::new(),
            confirm: ConfirmDialog::new(),
            generating: None,
            dashboard: None,
            upload: UploadView::default(),
            admin: AdminView::default(),
            throbber: ThrobberState::default(),
            last_frame: Instant::now(),
        }
    }

    /// Resumes a persisted session or shows the login screen.
    pub fn start(&mut self) {
        let session = self.actions.client().session();
        if session.init() {
            self.user = session.user();
            self.show_datasets();
        } else {
            self.screen = AppScreen::Login;
        }
    }

    pub fn is_staff(&self) -> bool {
        self.actions.client().session().is_staff()
    }

    /// Per-frame housekeeping: spinner, background results, dashboard sync
    /// and the session check.
    pub fn update(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_frame) >= THROBBER_INTERVAL {
            self.throbber.calc_next();
            self.last_frame = now;
        }

        while let Ok(message) = self.messages.try_recv() {
            self.handle_message(message);
        }

        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.sync();
        }

        if self.screen != AppScreen::Login && !self.actions.client().session().is_authenticated() {
            self.session_expired();
        }
    }

    fn session_expired(&mut self) {
        info!("session ended, returning to login");
        self.reset_signed_in_state();
        self.status_message = "Your session has expired. Please log in again.".to_string();
    }

    fn reset_signed_in_state(&mut self) {
        self.dashboard = None;
        self.user = None;
        self.datasets.clear();
        self.chart_counts.clear();
        self.clear_search();
        self.confirm = ConfirmDialog::new();
        self.admin = AdminView::default();
        self.login = LoginForm::new();
        self.screen = AppScreen::Login;
    }

    pub fn sign_out(&mut self) {
        self.actions.logout();
        self.reset_signed_in_state();
        self.status_message = "Signed out".to_string();
    }

    pub fn submit_login(&mut self) {
        if !self.login.is_complete() {
            self.login.error = Some("Email and password are required".to_string());
            return;
        }
        self.login.submitting = true;
        self.login.error = None;
        self.actions
            .login(self.login.email.trim().to_string(), self.login.password.clone());
    }

    pub fn show_datasets(&mut self) {
        self.dashboard = None;
        self.screen = AppScreen::Datasets;
        self.refresh_datasets();
    }

    pub fn refresh_datasets(&mut self) {
        self.datasets_loading = true;
        self.actions.load_datasets();
    }

    pub fn visible_datasets(&self) -> Vec<&Dataset> {
        if self.search_active && !self.search_query.is_empty() {
            self.filtered_dataset_indices
                .iter()
                .filter_map(|index| self.datasets.get(*index))
                .collect()
        } else {
            self.datasets.iter().collect()
        }
    }

    pub fn selected_dataset(&self) -> Option<&Dataset> {
        self.visible_datasets()
            .get(self.selected_dataset_index)
            .copied()
    }

    /// Fuzzy-matches the query against file names, best match first.
    pub fn apply_search(&mut self) {
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, usize)> = self
            .datasets
            .iter()
            .enumerate()
            .filter_map(|(index, dataset)| {
                matcher
                    .fuzzy_match(&dataset.filename, &self.search_query)
                    .map(|score| (score, index))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        self.filtered_dataset_indices = scored.into_iter().map(|(_, index)| index).collect();
        self.selected_dataset_index = 0;
    }

    pub fn clear_search(&mut self) {
        self.search_active = false;
        self.search_query.clear();
        self.filtered_dataset_indices.clear();
        self.selected_dataset_index = 0;
    }

    pub fn open_dashboard(&mut self) {
        let Some(uid) = self.selected_dataset().map(|dataset| dataset.uid.clone()) else {
            return;
        };
        let view = DashboardView::open(self.actions.client(), &uid);
        self.actions.initialize_dashboard(view.loader.clone());
        // Replacing the old view drops it, which tears it down.
        self.dashboard = Some(view);
        self.screen = AppScreen::Dashboard;
        self.status_message.clear();
    }

    pub fn close_dashboard(&mut self) {
        self.dashboard = None;
        self.screen = AppScreen::Datasets;
    }

    pub fn open_upload(&mut self) {
        if !self.upload.running {
            self.upload.queue.clear_finished();
            self.upload.progress = self.upload.queue.progress();
        }
        self.screen = AppScreen::Upload;
    }

    pub fn start_upload(&mut self) {
        if self.upload.running || !self.upload.queue.has_pending() {
            return;
        }
        self.upload.running = true;
        let queue = std::mem::take(&mut self.upload.queue);
        self.upload.progress = queue.progress();
        self.upload.queue = queue.clone();
        self.actions.upload(queue);
    }

    pub fn open_admin(&mut self) {
        if !self.is_staff() {
            self.status_message = "Admin access requires a staff account".to_string();
            return;
        }
        self.admin = AdminView {
            loading: true,
            ..AdminView::default()
        };
        self.screen = AppScreen::Admin;
        self.actions.load_admin_users();
    }

    pub fn open_admin_user(&mut self) {
        let Some(user) = self.admin.users.get(self.admin.selected) else {
            return;
        };
        self.admin.loading = true;
        self.admin.detail = None;
        self.admin.chart_tab = 0;
        self.actions.load_admin_detail(user.id);
        self.screen = AppScreen::AdminUser;
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::LoggedIn(result) => {
                self.login.submitting = false;
                match result {
                    Ok(user) => {
                        self.status_message = format!("Welcome, {}", user.display_name());
                        self.user = Some(user);
                        self.login = LoginForm::new();
                        self.show_datasets();
                    }
                    Err(message) => self.login.error = Some(message),
                }
            }
            AppMessage::Datasets(result) => {
                self.datasets_loading = false;
                match result {
                    Ok(datasets) => {
                        self.datasets = datasets;
                        if self.search_active {
                            self.apply_search();
                        }
                        let total = self.visible_datasets().len();
                        if self.selected_dataset_index >= total {
                            self.selected_dataset_index = total.saturating_sub(1);
                        }
                    }
                    Err(message) => self.status_message = message,
                }
            }
            AppMessage::ChartCounts(counts) => {
                self.chart_counts = counts
                    .into_iter()
                    .map(|count| (count.dataset_uid.clone(), count))
                    .collect();
            }
            AppMessage::Deleted { uid, result } => self.finish_delete(&uid, result),
            AppMessage::Generated { uid, result } => self.finish_generate(&uid, result),
            AppMessage::DashboardReady(outcome) => {
                if outcome == LoadOutcome::Failed {
                    self.status_message = "Some chart data could not be loaded".to_string();
                }
            }
            AppMessage::MoreLoaded(outcome) => {
                if outcome == LoadOutcome::Failed {
                    self.status_message = "Could not load more respondents".to_string();
                }
            }
            AppMessage::SummaryRefetched(outcome) => {
                if outcome == LoadOutcome::Applied {
                    self.status_message = "Summary charts refreshed".to_string();
                    self.reapply_filters();
                }
            }
            AppMessage::Filtered(outcome) => self.finish_filter(outcome),
            AppMessage::UploadProgress { item, progress } => {
                self.upload.progress = progress;
                self.upload.queue.sync_item(item);
            }
            AppMessage::UploadDone(queue) => {
                self.upload.running = false;
                self.upload.progress = queue.progress();
                let uploaded = queue.uploaded().count();
                let (finished, total) = queue.progress();
                self.upload.queue = queue;
                self.status_message =
                    format!("Uploaded {uploaded} of {total} files ({finished} finished)");
                if uploaded > 0 {
                    self.refresh_datasets();
                }
            }
            AppMessage::AdminUsers(result) => {
                self.admin.loading = false;
                match result {
                    Ok(users) => self.admin.users = users,
                    Err(message) => self.status_message = message,
                }
            }
            AppMessage::AdminDetail(result) => {
                self.admin.loading = false;
                match result {
                    Ok(detail) => self.admin.detail = Some(detail),
                    Err(message) => self.status_message = message,
                }
            }
        }
    }

    /// A refetched summary carries the unfiltered distribution, so an active
    /// selection is requested again on top of it.
    fn reapply_filters(&mut self) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return;
        };
        if dashboard.filters.selection().is_empty() {
            return;
        }
        let Some(baseline) = dashboard.loader.snapshot().distribution_chart().cloned() else {
            return;
        };
        dashboard.filtering = true;
        self.actions
            .reapply_filters(dashboard.filters.clone(), baseline);
    }

    fn finish_delete(&mut self, uid: &str, result: Result<(), String>) {
        let event = match result {
            Ok(()) => {
                self.datasets.retain(|dataset| dataset.uid != uid);
                self.chart_counts.remove(uid);
                if self.search_active {
                    self.apply_search();
                }
                let total = self.visible_datasets().len();
                if self.selected_dataset_index >= total {
                    self.selected_dataset_index = total.saturating_sub(1);
                }
                self.status_message = "Dataset deleted".to_string();
                ConfirmEvent::Done
            }
            Err(message) => ConfirmEvent::Error(message),
        };
        if let Err(e) = self.confirm.process(event) {
            warn!("{e}");
        }
    }

    fn finish_generate(&mut self, uid: &str, result: Result<GenerateOutcome, String>) {
        self.generating = None;
        match result {
            Ok(outcome) => {
                self.status_message = if outcome.message.is_empty() {
                    format!("Generated {} charts", outcome.charts_created)
                } else {
                    outcome.message
                };
                if let Some(dashboard) = &self.dashboard {
                    if dashboard.loader.dataset_id() == uid {
                        self.actions.refetch_summary(dashboard.loader.clone());
                    }
                }
                self.refresh_datasets();
            }
            Err(message) => self.status_message = message,
        }
    }

    fn finish_filter(&mut self, outcome: FilterOutcome) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return;
        };
        match outcome {
            FilterOutcome::Applied { .. } => {
                dashboard.filtering = false;
                dashboard.filter_error = None;
            }
            FilterOutcome::Failed(message) => {
                dashboard.filtering = false;
                dashboard.filter_error = Some(message);
            }
            FilterOutcome::Superseded | FilterOutcome::Cancelled => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration as StdDuration;
    use taam_dashboard::domain::FilterValue;
    use taam_dashboard::session::{Session, TokenStorage};
    use taam_dashboard::ApiError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dataset(uid: &str, filename: &str) -> Dataset {
        Dataset {
            uid: uid.to_string(),
            filename: filename.to_string(),
            row_count: 10,
            size_bytes: 100,
            mime_type: None,
            parsed_ok: true,
            error_message: None,
            owner_email: None,
            created_at: None,
        }
    }

    fn app() -> App {
        let client = ApiClient::new(
            "http://127.0.0.1:9",
            Session::new(TokenStorage::memory()),
            StdDuration::from_secs(1),
        );
        match client {
            Ok(client) => App::new(client),
            Err(e) => panic!("client: {e}"),
        }
    }

    #[tokio::test]
    async fn fuzzy_search_ranks_matching_files() {
        let mut app = app();
        app.datasets = vec![
            dataset("d1", "dubai_wave1.csv"),
            dataset("d2", "abu_dhabi.xlsx"),
            dataset("d3", "dubai_wave2.csv"),
        ];
        app.search_active = true;
        app.search_query = "dubwave".to_string();
        app.apply_search();

        let names: Vec<&str> = app
            .visible_datasets()
            .iter()
            .map(|dataset| dataset.filename.as_str())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.starts_with("dubai")));

        app.clear_search();
        assert_eq!(app.visible_datasets().len(), 3);
    }

    #[tokio::test]
    async fn failed_login_keeps_the_form_open() {
        let mut app = app();
        app.login.email = "a@b.c".to_string();
        app.handle_message(AppMessage::LoggedIn(Err("Invalid email or password.".to_string())));

        assert_eq!(app.screen, AppScreen::Login);
        assert_eq!(app.login.error.as_deref(), Some("Invalid email or password."));
        assert_eq!(app.login.email, "a@b.c");
    }

    #[tokio::test]
    async fn signed_out_session_returns_to_login() {
        let mut app = app();
        app.screen = AppScreen::Datasets;
        app.datasets = vec![dataset("d1", "a.csv")];

        app.update();

        assert_eq!(app.screen, AppScreen::Login);
        assert!(app.datasets.is_empty());
        assert!(app.status_message.contains("expired"));
    }

    #[tokio::test]
    async fn deleted_dataset_leaves_the_list() {
        let mut app = app();
        app.datasets = vec![dataset("d1", "a.csv"), dataset("d2", "b.csv")];
        app.selected_dataset_index = 1;
        let _ = app.confirm.process(ConfirmEvent::Open(
            taam_dashboard::confirm::ConfirmTarget::new("d2", "b.csv"),
        ));
        let _ = app.confirm.process(ConfirmEvent::Accept);

        app.handle_message(AppMessage::Deleted {
            uid: "d2".to_string(),
            result: Ok(()),
        });

        assert_eq!(app.datasets.len(), 1);
        assert_eq!(app.selected_dataset_index, 0);
        assert!(!app.confirm.is_open());
    }

    fn distribution_total(app: &App) -> Option<u64> {
        app.dashboard.as_ref().and_then(|dashboard| {
            dashboard
                .snapshot
                .distribution_chart()
                .and_then(|chart| chart.derived_metrics.total_respondents)
        })
    }

    #[tokio::test]
    async fn refreshed_summary_keeps_the_active_filter() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "results": [{
                    "uid": "dist-1",
                    "chart_type": "persona_distribution",
                    "chart_config": {"title": "Persona Distribution"},
                    "derived_metrics": {
                        "total_respondents": 45,
                        "persona_distribution": {"Obligati": {"count": 45, "percentage": 100.0}}
                    }
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/charts/dataset/d1/filtered-distribution/"))
            .and(query_param("gender", "Female"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_respondents": 45,
                "filtered_respondents": 12,
                "distribution": [{"persona": "Value Hunters", "count": 12, "percentage": 100.0}]
            })))
            .mount(&server)
            .await;

        let session = Session::new(TokenStorage::memory());
        session.login(
            "t".to_string(),
            None,
            User {
                id: 1,
                email: "analyst@example.com".to_string(),
                firstname: String::new(),
                lastname: String::new(),
                is_staff: false,
            },
        )?;
        let client = ApiClient::new(&server.uri(), session, StdDuration::from_secs(5))?;
        let mut app = App::new(client.clone());
        let view = DashboardView::open(&client, "d1");
        assert_eq!(view.loader.refetch_summary().await, LoadOutcome::Applied);
        let Some(baseline) = view.loader.snapshot().distribution_chart().cloned() else {
            panic!("summary has no distribution chart");
        };
        view.filters
            .set_filter(
                FilterDimension::Gender,
                FilterValue::Only("Female".to_string()),
                &baseline,
            )
            .await;
        let loader = view.loader.clone();
        app.dashboard = Some(view);
        app.screen = AppScreen::Dashboard;
        if let Some(dashboard) = app.dashboard.as_mut() {
            dashboard.sync();
        }
        assert_eq!(distribution_total(&app), Some(12));

        // Regeneration or `r` puts the unfiltered counts back.
        assert_eq!(loader.refetch_summary().await, LoadOutcome::Applied);
        app.handle_message(AppMessage::SummaryRefetched(LoadOutcome::Applied));
        assert!(app.dashboard.as_ref().is_some_and(|d| d.filtering));

        if let Some(message) = app.messages.recv().await {
            app.handle_message(message);
        }
        if let Some(dashboard) = app.dashboard.as_mut() {
            dashboard.sync();
        }
        assert_eq!(distribution_total(&app), Some(12));
        assert!(app.dashboard.as_ref().is_some_and(|d| !d.filtering));
        assert_eq!(
            app.dashboard
                .as_ref()
                .and_then(|d| d.selection.gender.clone()),
            Some("Female".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn refresh_without_filters_sends_no_filter_request() {
        let mut app = app();
        let client = app.actions.client().clone();
        app.dashboard = Some(DashboardView::open(&client, "d1"));
        app.handle_message(AppMessage::SummaryRefetched(LoadOutcome::Applied));
        assert!(app.dashboard.as_ref().is_some_and(|d| !d.filtering));
        assert!(app.messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn closing_the_dashboard_tears_its_loader_down() {
        let mut app = app();
        let client = app.actions.client().clone();
        let view = DashboardView::open(&client, "d1");
        let loader = view.loader.clone();
        app.dashboard = Some(view);
        app.screen = AppScreen::Dashboard;

        app.close_dashboard();

        assert!(loader.is_torn_down());
        assert_eq!(app.screen, AppScreen::Datasets);
    }
}
