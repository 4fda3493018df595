use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::charts::SummaryUpdates;
use crate::domain::{ChartKind, ChartRecord, Dataset, FilterOptionSet};
use crate::error::ApiError;

/// What a loader operation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Skipped,
    Failed,
    Cancelled,
}

/// Immutable copy of everything the loader holds, handed to views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderSnapshot {
    pub dataset: Option<Dataset>,
    pub summary_charts: Vec<ChartRecord>,
    pub respondent_charts: Vec<ChartRecord>,
    pub filter_options: FilterOptionSet,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
}

impl LoaderSnapshot {
    pub fn distribution_chart(&self) -> Option<&ChartRecord> {
        self.summary_charts
            .iter()
            .find(|chart| chart.kind() == &ChartKind::PersonaDistribution)
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    snapshot: LoaderSnapshot,
    activated: bool,
}

/// Chart data for one dataset view: metadata, summary charts, filter options
/// and the respondent charts loaded so far.
///
/// Clones share state, so a view can hand copies to background tasks.
/// Nothing is mutated once [`ChartDataLoader::teardown`] has run.
#[derive(Debug, Clone)]
pub struct ChartDataLoader {
    client: ApiClient,
    dataset_id: Arc<str>,
    state: Arc<Mutex<LoaderState>>,
    cancel: CancellationToken,
}

impl ChartDataLoader {
    pub fn new(client: ApiClient, dataset_id: &str) -> Self {
        Self {
            client,
            dataset_id: Arc::from(dataset_id),
            state: Arc::new(Mutex::new(LoaderState::default())),
            cancel: CancellationToken::new(),
        }
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn snapshot(&self) -> LoaderSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn guarded<T>(
        &self,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ApiError::Cancelled),
            result = request => result,
        }
    }

    /// Runs `apply` under the lock unless the view has been torn down.
    fn apply<R>(&self, apply: impl FnOnce(&mut LoaderSnapshot) -> R) -> Option<R> {
        let mut state = self.state.lock();
        if self.is_torn_down() {
            return None;
        }
        Some(apply(&mut state.snapshot))
    }

    /// First activation: fetches metadata, summary charts, filter options and
    /// the first respondent page together. Each failure leaves its field
    /// empty without stopping the others. Later calls do nothing.
    pub async fn initialize(&self) -> LoadOutcome {
        {
            let mut state = self.state.lock();
            if state.activated || self.is_torn_down() {
                return LoadOutcome::Skipped;
            }
            state.activated = true;
            state.snapshot.loading = true;
        }

        let id = &*self.dataset_id;
        let (dataset, summary, options, first_page) = tokio::join!(
            self.guarded(self.client.dataset(id)),
            self.guarded(self.client.summary_charts(id)),
            self.guarded(self.client.filter_options(id)),
            self.guarded(self.client.respondent_charts(id, 1)),
        );

        let applied = self.apply(|snapshot| {
            let mut failed = false;

            match dataset {
                Ok(dataset) => snapshot.dataset = Some(dataset),
                Err(e) => failed |= log_failure("dataset", id, &e),
            }
            match summary {
                Ok(page) => snapshot.summary_charts = page.results,
                Err(e) => failed |= log_failure("summary charts", id, &e),
            }
            match options {
                Ok(options) => snapshot.filter_options = options,
                Err(e) => failed |= log_failure("filter options", id, &e),
            }
            match first_page {
                Ok(page) => {
                    snapshot.respondent_charts = page.results;
                    snapshot.page = 1;
                    snapshot.has_more = page.has_next;
                }
                Err(e) => failed |= log_failure("respondent charts", id, &e),
            }

            snapshot.loading = false;
            info!(
                "dataset {id}: {} summary charts, {} respondent charts, more: {}",
                snapshot.summary_charts.len(),
                snapshot.respondent_charts.len(),
                snapshot.has_more
            );
            failed
        });

        match applied {
            None => LoadOutcome::Cancelled,
            Some(true) => LoadOutcome::Failed,
            Some(false) => LoadOutcome::Applied,
        }
    }

    /// Appends the next respondent page. Does nothing when no more pages are
    /// known or a load is already running. A failed page is retried by the
    /// next call.
    pub async fn load_more(&self) -> LoadOutcome {
        let next_page = {
            let mut state = self.state.lock();
            let snapshot = &mut state.snapshot;
            if self.is_torn_down()
                || snapshot.loading
                || snapshot.loading_more
                || !snapshot.has_more
            {
                return LoadOutcome::Skipped;
            }
            snapshot.loading_more = true;
            snapshot.page + 1
        };

        let id = &*self.dataset_id;
        let result = self
            .guarded(self.client.respondent_charts(id, next_page))
            .await;

        let applied = self.apply(|snapshot| {
            snapshot.loading_more = false;
            match result {
                Ok(page) => {
                    debug!("dataset {id}: page {next_page} added {}", page.results.len());
                    snapshot.respondent_charts.extend(page.results);
                    snapshot.page = next_page;
                    snapshot.has_more = page.has_next;
                    LoadOutcome::Applied
                }
                Err(e) => {
                    log_failure("respondent page", id, &e);
                    LoadOutcome::Failed
                }
            }
        });

        applied.unwrap_or(LoadOutcome::Cancelled)
    }

    /// Replaces the summary charts wholesale, e.g. after regeneration.
    pub async fn refetch_summary(&self) -> LoadOutcome {
        let id = &*self.dataset_id;
        let result = self.guarded(self.client.summary_charts(id)).await;

        let applied = self.apply(|snapshot| match result {
            Ok(page) => {
                snapshot.summary_charts = page.results;
                LoadOutcome::Applied
            }
            Err(e) => {
                log_failure("summary charts", id, &e);
                LoadOutcome::Failed
            }
        });

        applied.unwrap_or(LoadOutcome::Cancelled)
    }

    /// Swaps in `record` for the summary chart of the same kind. A kind with
    /// no existing entry is ignored rather than inserted.
    pub fn update_summary_chart(&self, record: ChartRecord) -> bool {
        self.apply(|snapshot| {
            let Some(slot) = snapshot
                .summary_charts
                .iter_mut()
                .find(|chart| chart.kind() == record.kind())
            else {
                debug!("no summary chart of kind {}, update dropped", record.kind());
                return false;
            };
            *slot = record;
            true
        })
        .unwrap_or(false)
    }

    /// Applies every summary record published so far. Returns how many
    /// replaced an entry.
    pub fn apply_pending(&self, updates: &mut SummaryUpdates) -> usize {
        let mut applied = 0;
        while let Ok(record) = updates.try_recv() {
            if self.update_summary_chart(record) {
                applied += 1;
            }
        }
        applied
    }

    /// Cancels in-flight requests; late responses are dropped.
    pub fn teardown(&self) {
        let _state = self.state.lock();
        if !self.is_torn_down() {
            debug!("dataset {}: loader torn down", self.dataset_id);
            self.cancel.cancel();
        }
    }
}

fn log_failure(what: &str, dataset: &str, error: &ApiError) -> bool {
    if !matches!(error, ApiError::Cancelled) {
        warn!("dataset {dataset}: failed to load {what}: {error}");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::fixtures::{
        distribution_record, mount_dataset, mount_respondents, signed_in_loader,
    };
    use crate::domain::PersonaShare;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uids(charts: &[ChartRecord]) -> Vec<String> {
        charts.iter().map(|chart| chart.uid.clone()).collect()
    }

    #[tokio::test]
    async fn pages_through_forty_five_respondents() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        mount_dataset(&server, "d1", 45).await;
        mount_respondents(&server, "d1", 45, None).await;
        let loader = signed_in_loader(&server, "d1")?;

        assert_eq!(loader.initialize().await, LoadOutcome::Applied);
        let first = loader.snapshot();
        assert_eq!(first.respondent_charts.len(), 20);
        assert!(first.has_more);
        assert!(!first.loading);

        assert_eq!(loader.load_more().await, LoadOutcome::Applied);
        let second = loader.snapshot();
        assert_eq!(second.respondent_charts.len(), 40);
        assert!(second.has_more);
        assert_eq!(
            uids(&second.respondent_charts[..20]),
            uids(&first.respondent_charts)
        );

        assert_eq!(loader.load_more().await, LoadOutcome::Applied);
        let third = loader.snapshot();
        assert_eq!(third.respondent_charts.len(), 45);
        assert!(!third.has_more);
        assert_eq!(
            uids(&third.respondent_charts[..40]),
            uids(&second.respondent_charts)
        );
        assert_eq!(third.respondent_charts[44].uid, "respondent-44");

        assert_eq!(loader.load_more().await, LoadOutcome::Skipped);
        assert_eq!(loader.snapshot().respondent_charts.len(), 45);

        let requested_page_four = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .any(|request| request.url.query().is_some_and(|q| q.contains("page=4")));
        assert!(!requested_page_four);
        Ok(())
    }

    #[tokio::test]
    async fn load_more_while_in_flight_is_dropped() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        mount_dataset(&server, "d1", 45).await;
        mount_respondents(&server, "d1", 45, Some(Duration::from_millis(200))).await;
        let loader = signed_in_loader(&server, "d1")?;
        loader.initialize().await;

        let (first, second, during) = tokio::join!(loader.load_more(), loader.load_more(), async {
            loader.snapshot()
        });

        assert_eq!(first, LoadOutcome::Applied);
        assert_eq!(second, LoadOutcome::Skipped);
        assert!(during.loading_more);
        assert!(!during.loading);
        assert_eq!(loader.snapshot().respondent_charts.len(), 40);
        assert!(!loader.snapshot().loading_more);

        let page_two_requests = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.query().is_some_and(|q| q.contains("page=2")))
            .count();
        assert_eq!(page_two_requests, 1);
        Ok(())
    }

    #[tokio::test]
    async fn one_failed_fetch_does_not_block_the_others() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/dataset/d1/filter-options/"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;
        mount_dataset(&server, "d1", 5).await;
        mount_respondents(&server, "d1", 5, None).await;
        let loader = signed_in_loader(&server, "d1")?;

        assert_eq!(loader.initialize().await, LoadOutcome::Failed);
        let snapshot = loader.snapshot();
        assert_eq!(snapshot.filter_options, FilterOptionSet::default());
        assert_eq!(snapshot.dataset.map(|d| d.row_count), Some(5));
        assert_eq!(snapshot.summary_charts.len(), 2);
        assert_eq!(snapshot.respondent_charts.len(), 5);
        assert!(!snapshot.has_more);
        assert!(!snapshot.loading);
        Ok(())
    }

    #[tokio::test]
    async fn failed_page_keeps_cursor_for_retry() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/dataset/d1/respondents/"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_dataset(&server, "d1", 45).await;
        mount_respondents(&server, "d1", 45, None).await;
        let loader = signed_in_loader(&server, "d1")?;
        loader.initialize().await;

        assert_eq!(loader.load_more().await, LoadOutcome::Failed);
        assert_eq!(loader.snapshot().respondent_charts.len(), 20);
        assert_eq!(loader.snapshot().page, 1);

        assert_eq!(loader.load_more().await, LoadOutcome::Applied);
        assert_eq!(loader.snapshot().respondent_charts.len(), 40);
        Ok(())
    }

    #[tokio::test]
    async fn initialize_runs_once() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        mount_dataset(&server, "d1", 3).await;
        mount_respondents(&server, "d1", 3, None).await;
        let loader = signed_in_loader(&server, "d1")?;

        assert_eq!(loader.initialize().await, LoadOutcome::Applied);
        assert_eq!(loader.initialize().await, LoadOutcome::Skipped);
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_exactly_the_matching_kind() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        mount_dataset(&server, "d1", 3).await;
        mount_respondents(&server, "d1", 3, None).await;
        let loader = signed_in_loader(&server, "d1")?;
        loader.initialize().await;
        let before = loader.snapshot().summary_charts;

        let mut replacement = distribution_record();
        replacement.derived_metrics.total_respondents = Some(42);
        replacement.derived_metrics.persona_distribution.insert(
            "Value Hunters".to_string(),
            PersonaShare {
                count: 42,
                percentage: 100.0,
            },
        );
        assert!(loader.update_summary_chart(replacement.clone()));

        let after = loader.snapshot().summary_charts;
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0], replacement);
        assert_eq!(after[1], before[1]);
        Ok(())
    }

    #[tokio::test]
    async fn update_with_unknown_kind_changes_nothing() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        mount_dataset(&server, "d1", 3).await;
        mount_respondents(&server, "d1", 3, None).await;
        let loader = signed_in_loader(&server, "d1")?;
        loader.initialize().await;
        let before = loader.snapshot().summary_charts;

        let mut stray = distribution_record();
        stray.chart_type = ChartKind::Pie;
        assert!(!loader.update_summary_chart(stray));
        assert_eq!(loader.snapshot().summary_charts, before);
        Ok(())
    }

    #[tokio::test]
    async fn refetch_summary_replaces_the_whole_list() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "results": [{
                    "uid": "old",
                    "chart_type": "persona_distribution",
                    "chart_config": {"title": "Old"}
                }]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_dataset(&server, "d1", 3).await;
        mount_respondents(&server, "d1", 3, None).await;
        let loader = signed_in_loader(&server, "d1")?;

        loader.initialize().await;
        assert_eq!(uids(&loader.snapshot().summary_charts), vec!["old"]);

        assert_eq!(loader.refetch_summary().await, LoadOutcome::Applied);
        assert_eq!(
            uids(&loader.snapshot().summary_charts),
            vec!["dist-1", "heatmap-1"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn teardown_drops_late_pages() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        mount_dataset(&server, "d1", 45).await;
        mount_respondents(&server, "d1", 45, Some(Duration::from_millis(300))).await;
        let loader = signed_in_loader(&server, "d1")?;
        loader.initialize().await;

        let background = loader.clone();
        let pending = tokio::spawn(async move { background.load_more().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        loader.teardown();

        assert_eq!(pending.await.ok(), Some(LoadOutcome::Cancelled));
        assert_eq!(loader.snapshot().respondent_charts.len(), 20);
        assert_eq!(loader.load_more().await, LoadOutcome::Skipped);
        assert!(!loader.update_summary_chart(distribution_record()));
        Ok(())
    }
}
