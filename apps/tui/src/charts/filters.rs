use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::charts::SummaryUpdates;
use crate::domain::{
    ChartRecord, FilterDimension, FilterSelection, FilterValue, FilteredDistribution, PersonaShare,
};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The filtered distribution was published for the loader to apply.
    Applied { filtered_respondents: u64 },
    /// A newer request was issued before this one came back.
    Superseded,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Default)]
struct FilterState {
    selection: FilterSelection,
    latest: u64,
}

/// Demographic filters over the persona distribution of one dataset.
///
/// Every change issues a request tagged with a sequence number. Only the
/// response to the most recent request is published, so a slow reply for an
/// older selection never overwrites a newer one.
#[derive(Debug, Clone)]
pub struct FilterController {
    client: ApiClient,
    dataset_id: Arc<str>,
    state: Arc<Mutex<FilterState>>,
    publisher: mpsc::UnboundedSender<ChartRecord>,
    cancel: CancellationToken,
}

impl FilterController {
    /// Returns the controller and the receiving end its results go to.
    pub fn new(client: ApiClient, dataset_id: &str) -> (Self, SummaryUpdates) {
        let (publisher, updates) = mpsc::unbounded_channel();
        let controller = Self {
            client,
            dataset_id: Arc::from(dataset_id),
            state: Arc::new(Mutex::new(FilterState::default())),
            publisher,
            cancel: CancellationToken::new(),
        };
        (controller, updates)
    }

    pub fn selection(&self) -> FilterSelection {
        self.state.lock().selection.clone()
    }

    /// Sets one dimension, keeping the others, and fetches the distribution
    /// for the merged selection. The selection stays set if the fetch fails.
    pub async fn set_filter(
        &self,
        dimension: FilterDimension,
        value: FilterValue,
        baseline: &ChartRecord,
    ) -> FilterOutcome {
        self.issue(|selection| selection.set(dimension, value), baseline)
            .await
    }

    /// Resets every dimension and fetches the unfiltered distribution.
    pub async fn clear_all(&self, baseline: &ChartRecord) -> FilterOutcome {
        self.issue(|selection| *selection = FilterSelection::default(), baseline)
            .await
    }

    /// Fetches the current selection again over a fresh baseline, e.g. after
    /// the summary charts were refetched and hold the unfiltered counts.
    pub async fn reapply(&self, baseline: &ChartRecord) -> FilterOutcome {
        self.issue(|_| {}, baseline).await
    }

    async fn issue(
        &self,
        change: impl FnOnce(&mut FilterSelection),
        baseline: &ChartRecord,
    ) -> FilterOutcome {
        let (selection, sequence) = {
            let mut state = self.state.lock();
            if self.cancel.is_cancelled() {
                return FilterOutcome::Cancelled;
            }
            change(&mut state.selection);
            state.latest += 1;
            (state.selection.clone(), state.latest)
        };
        debug!(
            "dataset {}: filter request #{sequence} {:?}",
            self.dataset_id,
            selection.query_pairs()
        );

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.client.filtered_distribution(&self.dataset_id, &selection) => result,
        };

        // Publishing under the lock keeps channel order equal to request order.
        let state = self.state.lock();
        if self.cancel.is_cancelled() {
            return FilterOutcome::Cancelled;
        }
        if state.latest != sequence {
            debug!(
                "dataset {}: dropping filter response #{sequence}, #{} is newer",
                self.dataset_id, state.latest
            );
            return FilterOutcome::Superseded;
        }

        match result {
            Ok(distribution) => {
                let filtered_respondents = distribution.filtered_respondents;
                info!(
                    "dataset {}: {filtered_respondents} of {} respondents match",
                    self.dataset_id, distribution.total_respondents
                );
                if self
                    .publisher
                    .send(overlay_distribution(baseline, &distribution))
                    .is_err()
                {
                    debug!("summary receiver gone, filtered chart discarded");
                }
                FilterOutcome::Applied {
                    filtered_respondents,
                }
            }
            Err(e) => {
                warn!("dataset {}: filtered distribution failed: {e}", self.dataset_id);
                FilterOutcome::Failed(e.user_message("Failed to apply filters"))
            }
        }
    }

    pub fn teardown(&self) {
        let _state = self.state.lock();
        self.cancel.cancel();
    }
}

/// The baseline distribution chart with its counts replaced by the filtered
/// ones. Everything else, title included, is kept.
pub fn overlay_distribution(
    baseline: &ChartRecord,
    distribution: &FilteredDistribution,
) -> ChartRecord {
    let mut record = baseline.clone();
    let metrics = &mut record.derived_metrics;
    metrics.total_respondents = Some(distribution.filtered_respondents);
    metrics.persona_distribution = distribution
        .distribution
        .iter()
        .map(|entry| {
            (
                entry.persona.clone(),
                PersonaShare {
                    count: entry.count,
                    percentage: entry.percentage,
                },
            )
        })
        .collect();
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::signed_in_client;
    use crate::charts::fixtures::{distribution_record, mount_dataset, mount_respondents};
    use crate::charts::{ChartDataLoader, LoadOutcome};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FILTERED_PATH: &str = "/charts/dataset/d1/filtered-distribution/";

    fn filtered_body(
        filtered: u64,
        persona: &str,
        count: u64,
        percentage: f64,
    ) -> serde_json::Value {
        json!({
            "total_respondents": 45,
            "filtered_respondents": filtered,
            "distribution": [
                {"persona": persona, "persona_code": "B", "count": count, "percentage": percentage}
            ],
            "filters_applied": {}
        })
    }

    #[test]
    fn overlay_keeps_title_and_replaces_counts() -> Result<(), serde_json::Error> {
        let distribution: FilteredDistribution =
            serde_json::from_value(filtered_body(42, "Value Hunters", 10, 23.8))?;
        let merged = overlay_distribution(&distribution_record(), &distribution);

        assert_eq!(merged.title(), "Persona Distribution");
        assert_eq!(merged.uid, "dist-1");
        assert_eq!(merged.derived_metrics.total_respondents, Some(42));
        assert_eq!(merged.derived_metrics.persona_distribution.len(), 1);
        let share = merged.derived_metrics.persona_distribution.get("Value Hunters");
        assert_eq!(share.map(|s| s.count), Some(10));
        assert!(share.is_some_and(|s| (s.percentage - 23.8).abs() < 1e-9));
        Ok(())
    }

    #[tokio::test]
    async fn filtered_result_reaches_the_loader() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .and(query_param("gender", "Female"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(42, "Value Hunters", 10, 23.8)),
            )
            .mount(&server)
            .await;
        mount_dataset(&server, "d1", 45).await;
        mount_respondents(&server, "d1", 45, None).await;

        let client = signed_in_client(&server)?;
        let loader = ChartDataLoader::new(client.clone(), "d1");
        loader.initialize().await;
        let (filters, mut updates) = FilterController::new(client, "d1");
        let baseline = distribution_record();

        let outcome = filters
            .set_filter(
                FilterDimension::Gender,
                FilterValue::parse("Female"),
                &baseline,
            )
            .await;
        assert_eq!(
            outcome,
            FilterOutcome::Applied {
                filtered_respondents: 42
            }
        );
        assert_eq!(loader.apply_pending(&mut updates), 1);

        let snapshot = loader.snapshot();
        let chart = snapshot.distribution_chart();
        assert_eq!(chart.map(ChartRecord::title), Some("Persona Distribution"));
        assert_eq!(
            chart.and_then(|c| c.derived_metrics.total_respondents),
            Some(42)
        );
        assert_eq!(snapshot.summary_charts[1].uid, "heatmap-1");
        Ok(())
    }

    #[tokio::test]
    async fn clear_all_sends_no_filter_parameters() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(45, "Obligati", 25, 55.6)),
            )
            .mount(&server)
            .await;

        let (filters, _updates) = FilterController::new(signed_in_client(&server)?, "d1");
        let baseline = distribution_record();
        filters
            .set_filter(
                FilterDimension::Emirate,
                FilterValue::parse("Dubai"),
                &baseline,
            )
            .await;
        filters
            .set_filter(
                FilterDimension::AgeGroup,
                FilterValue::parse("26-30"),
                &baseline,
            )
            .await;
        assert_eq!(
            filters.clear_all(&baseline).await,
            FilterOutcome::Applied {
                filtered_respondents: 45
            }
        );

        assert!(filters.selection().is_empty());
        let requests = server.received_requests().await.unwrap_or_default();
        let last = requests.last().map(|r| r.url.query().unwrap_or_default().to_string());
        assert_eq!(last.as_deref(), Some(""));
        let second = requests
            .get(1)
            .and_then(|r| r.url.query())
            .unwrap_or_default()
            .to_string();
        assert!(second.contains("emirate=Dubai"));
        assert!(second.contains("age_group=26-30"));
        Ok(())
    }

    #[tokio::test]
    async fn all_on_every_dimension_sends_no_filter_parameters() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(45, "Obligati", 25, 55.6)),
            )
            .mount(&server)
            .await;

        let (filters, _updates) = FilterController::new(signed_in_client(&server)?, "d1");
        let baseline = distribution_record();
        filters
            .set_filter(
                FilterDimension::Gender,
                FilterValue::parse("Female"),
                &baseline,
            )
            .await;
        filters
            .set_filter(
                FilterDimension::Emirate,
                FilterValue::parse("Dubai"),
                &baseline,
            )
            .await;
        for dimension in FilterDimension::ALL {
            filters
                .set_filter(dimension, FilterValue::parse("all"), &baseline)
                .await;
        }

        assert!(filters.selection().is_empty());
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 5);
        let last = requests
            .last()
            .map(|r| r.url.query().unwrap_or_default().to_string());
        assert_eq!(last.as_deref(), Some(""));
        Ok(())
    }

    #[tokio::test]
    async fn refetched_summary_is_filtered_again() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .and(query_param("gender", "Female"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(12, "Value Hunters", 12, 100.0)),
            )
            .mount(&server)
            .await;
        mount_dataset(&server, "d1", 45).await;
        mount_respondents(&server, "d1", 45, None).await;

        let client = signed_in_client(&server)?;
        let loader = ChartDataLoader::new(client.clone(), "d1");
        loader.initialize().await;
        let (filters, mut updates) = FilterController::new(client, "d1");
        let total = |loader: &ChartDataLoader| {
            loader
                .snapshot()
                .distribution_chart()
                .and_then(|c| c.derived_metrics.total_respondents)
        };

        let baseline = distribution_record();
        filters
            .set_filter(
                FilterDimension::Gender,
                FilterValue::parse("Female"),
                &baseline,
            )
            .await;
        loader.apply_pending(&mut updates);
        assert_eq!(total(&loader), Some(12));

        assert_eq!(loader.refetch_summary().await, LoadOutcome::Applied);
        assert_eq!(total(&loader), Some(45));

        let refreshed = loader.snapshot().distribution_chart().cloned();
        let Some(refreshed) = refreshed else {
            panic!("refetch lost the distribution chart");
        };
        assert_eq!(
            filters.reapply(&refreshed).await,
            FilterOutcome::Applied {
                filtered_respondents: 12
            }
        );
        assert_eq!(loader.apply_pending(&mut updates), 1);
        assert_eq!(total(&loader), Some(12));
        assert_eq!(filters.selection().gender.as_deref(), Some("Female"));
        Ok(())
    }

    #[tokio::test]
    async fn slow_older_response_never_wins() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .and(query_param("gender", "female"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(12, "Value Hunters", 12, 100.0))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .and(query_param_is_missing("gender"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(45, "Obligati", 25, 55.6)),
            )
            .mount(&server)
            .await;

        let (filters, mut updates) = FilterController::new(signed_in_client(&server)?, "d1");
        let baseline = distribution_record();

        let (female, all) = tokio::join!(
            filters.set_filter(
                FilterDimension::Gender,
                FilterValue::parse("female"),
                &baseline
            ),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                filters
                    .set_filter(FilterDimension::Gender, FilterValue::All, &baseline)
                    .await
            }
        );

        assert_eq!(female, FilterOutcome::Superseded);
        assert_eq!(
            all,
            FilterOutcome::Applied {
                filtered_respondents: 45
            }
        );
        let published = updates.try_recv().ok();
        assert_eq!(
            published.and_then(|r| r.derived_metrics.total_respondents),
            Some(45)
        );
        assert!(updates.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn failure_keeps_selection_and_publishes_nothing() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "Filtering failed"})),
            )
            .mount(&server)
            .await;

        let (filters, mut updates) = FilterController::new(signed_in_client(&server)?, "d1");
        let outcome = filters
            .set_filter(
                FilterDimension::Emirate,
                FilterValue::parse("Dubai"),
                &distribution_record(),
            )
            .await;

        assert_eq!(outcome, FilterOutcome::Failed("Filtering failed".to_string()));
        assert_eq!(filters.selection().emirate.as_deref(), Some("Dubai"));
        assert!(updates.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn teardown_discards_in_flight_response() -> Result<(), ApiError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILTERED_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(filtered_body(3, "Obligati", 3, 100.0))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let (filters, mut updates) = FilterController::new(signed_in_client(&server)?, "d1");
        let background = filters.clone();
        let pending = tokio::spawn(async move {
            background
                .set_filter(
                    FilterDimension::Gender,
                    FilterValue::parse("Male"),
                    &distribution_record(),
                )
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        filters.teardown();

        assert_eq!(pending.await.ok(), Some(FilterOutcome::Cancelled));
        assert!(updates.try_recv().is_err());
        Ok(())
    }
}
