use std::future::Future;

use taam_dashboard::charts::{ChartDataLoader, FilterController, FilterOutcome, LoadOutcome};
use taam_dashboard::domain::{
    AdminUser, ChartCount, ChartRecord, Dataset, FilterDimension, FilterValue, GenerateOutcome,
    User, UserCharts, UserDatasets,
};
use taam_dashboard::upload::{UploadItem, UploadQueue};
use taam_dashboard::{ApiClient, ApiError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Results of background work, drained by the UI on every tick.
#[derive(Debug)]
pub enum AppMessage {
    LoggedIn(Result<User, String>),
    Datasets(Result<Vec<Dataset>, String>),
    ChartCounts(Vec<ChartCount>),
    Deleted {
        uid: String,
        result: Result<(), String>,
    },
    Generated {
        uid: String,
        result: Result<GenerateOutcome, String>,
    },
    DashboardReady(LoadOutcome),
    MoreLoaded(LoadOutcome),
    SummaryRefetched(LoadOutcome),
    Filtered(FilterOutcome),
    UploadProgress {
        item: UploadItem,
        progress: (usize, usize),
    },
    UploadDone(UploadQueue),
    AdminUsers(Result<Vec<AdminUser>, String>),
    AdminDetail(Result<(UserDatasets, UserCharts), String>),
}

/// Spawns backend calls so the draw loop never waits on the network.
#[derive(Debug, Clone)]
pub struct AppActions {
    client: ApiClient,
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl AppActions {
    pub const fn new(client: ApiClient, tx: mpsc::UnboundedSender<AppMessage>) -> Self {
        Self { client, tx }
    }

    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if tx.send(task.await).is_err() {
                debug!("ui closed before background result arrived");
            }
        });
    }

    pub fn login(&self, email: String, password: String) {
        let client = self.client.clone();
        self.spawn(async move {
            AppMessage::LoggedIn(
                client
                    .login(&email, &password)
                    .await
                    .map_err(|e| e.user_message("Login failed. Please try again.")),
            )
        });
    }

    pub fn logout(&self) {
        let client = self.client.clone();
        tokio::spawn(async move { client.logout().await });
    }

    /// Dataset list first, then chart counts; counts are best effort.
    pub fn load_datasets(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let datasets = client
                .datasets()
                .await
                .map_err(|e| log_background("datasets", &e));
            let listed = datasets.is_ok();
            if tx.send(AppMessage::Datasets(datasets)).is_err() || !listed {
                return;
            }
            match client.chart_counts().await {
                Ok(summary) => {
                    let _ = tx.send(AppMessage::ChartCounts(summary.results));
                }
                Err(e) => {
                    log_background("chart counts", &e);
                }
            }
        });
    }

    pub fn delete_dataset(&self, uid: String) {
        let client = self.client.clone();
        self.spawn(async move {
            let result = client
                .delete_dataset(&uid)
                .await
                .map_err(|e| e.user_message("Failed to delete dataset"));
            AppMessage::Deleted { uid, result }
        });
    }

    pub fn generate_charts(&self, uid: String) {
        let client = self.client.clone();
        self.spawn(async move {
            let result = client
                .generate_charts(&uid)
                .await
                .map_err(|e| e.user_message("Failed to generate charts"));
            AppMessage::Generated { uid, result }
        });
    }

    pub fn initialize_dashboard(&self, loader: ChartDataLoader) {
        self.spawn(async move { AppMessage::DashboardReady(loader.initialize().await) });
    }

    pub fn load_more(&self, loader: ChartDataLoader) {
        self.spawn(async move { AppMessage::MoreLoaded(loader.load_more().await) });
    }

    pub fn refetch_summary(&self, loader: ChartDataLoader) {
        self.spawn(async move { AppMessage::SummaryRefetched(loader.refetch_summary().await) });
    }

    pub fn set_filter(
        &self,
        filters: FilterController,
        dimension: FilterDimension,
        value: FilterValue,
        baseline: ChartRecord,
    ) {
        self.spawn(async move {
            AppMessage::Filtered(filters.set_filter(dimension, value, &baseline).await)
        });
    }

    pub fn clear_filters(&self, filters: FilterController, baseline: ChartRecord) {
        self.spawn(async move { AppMessage::Filtered(filters.clear_all(&baseline).await) });
    }

    pub fn reapply_filters(&self, filters: FilterController, baseline: ChartRecord) {
        self.spawn(async move { AppMessage::Filtered(filters.reapply(&baseline).await) });
    }

    /// Runs the queue in the background and hands it back when done.
    pub fn upload(&self, mut queue: UploadQueue) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let progress_tx = tx.clone();
            let result = queue
                .run(&client, |item, progress| {
                    let _ = progress_tx.send(AppMessage::UploadProgress {
                        item: item.clone(),
                        progress,
                    });
                })
                .await;
            if let Err(e) = result {
                warn!("upload queue stopped: {e}");
            }
            let _ = tx.send(AppMessage::UploadDone(queue));
        });
    }

    pub fn load_admin_users(&self) {
        let client = self.client.clone();
        self.spawn(async move {
            AppMessage::AdminUsers(
                client
                    .admin_users()
                    .await
                    .map_err(|e| e.user_message("Failed to load users")),
            )
        });
    }

    pub fn load_admin_detail(&self, user_id: i64) {
        let client = self.client.clone();
        self.spawn(async move {
            let (datasets, charts) =
                tokio::join!(client.user_datasets(user_id), client.user_charts(user_id));
            let detail = match (datasets, charts) {
                (Ok(datasets), Ok(charts)) => Ok((datasets, charts)),
                (Err(e), _) | (_, Err(e)) => Err(e.user_message("Failed to load user data")),
            };
            AppMessage::AdminDetail(detail)
        });
    }
}

fn log_background(what: &str, error: &ApiError) -> String {
    warn!("background load of {what} failed: {error}");
    error.user_message(&format!("Failed to load {what}"))
}
