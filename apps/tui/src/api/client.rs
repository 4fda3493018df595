use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::api::endpoints::Endpoint;
use crate::domain::{
    AdminUser, ChartCountSummary, ChartRecord, Dataset, FilterOptionSet, FilterSelection,
    FilteredDistribution, GenerateOutcome, LoginResponse, Page, TokenStatus, UploadOutcome, User,
    UserCharts, UserDatasets,
};
use crate::error::{backend_message, ApiError};
use crate::session::Session;

/// Typed client for the TAAM REST API.
///
/// Cloning is cheap: the connection pool and the session are shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn request(&self, endpoint: &Endpoint<'_>) -> Result<RequestBuilder, ApiError> {
        let mut builder = self
            .http
            .request(endpoint.method(), endpoint.url(&self.base_url));

        let query = endpoint.query();
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if endpoint.requires_auth() {
            let token = self.session.bearer_token().ok_or(ApiError::Unauthorized)?;
            builder = builder.bearer_auth(token);
        }

        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status,
            message: backend_message(&body),
        })
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(builder).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<T, ApiError> {
        self.json(self.request(&endpoint)?).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let builder = self
            .request(&Endpoint::Login)?
            .json(&json!({ "email": email, "password": password }));

        // A failed login is a 401 too; that must not be read as an expired session.
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                message: backend_message(&body),
            });
        }

        let login: LoginResponse = serde_json::from_slice(&response.bytes().await?)?;
        let user = login.user();
        self.session
            .login(login.token.clone(), login.refresh.clone(), user.clone())?;
        Ok(user)
    }

    /// Ends the session locally even when the backend call fails.
    pub async fn logout(&self) {
        match self.request(&Endpoint::Logout) {
            Ok(builder) => {
                if let Err(e) = self.send(builder).await {
                    warn!("logout request failed: {e}");
                }
            }
            Err(e) => debug!("logout without a token: {e}"),
        }
        self.session.logout();
    }

    pub async fn token_status(&self) -> Result<TokenStatus, ApiError> {
        self.get(Endpoint::TokenStatus).await
    }

    pub async fn datasets_page(&self, page: u32) -> Result<Page<Dataset>, ApiError> {
        self.get(Endpoint::Datasets { page }).await
    }

    /// Every dataset visible to the user, following `next` until exhausted.
    pub async fn datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.datasets_page(page).await?;
            all.extend(batch.results);
            if !batch.has_next {
                return Ok(all);
            }
            page += 1;
        }
    }

    pub async fn dataset(&self, uid: &str) -> Result<Dataset, ApiError> {
        self.get(Endpoint::Dataset(uid)).await
    }

    pub async fn delete_dataset(&self, uid: &str) -> Result<(), ApiError> {
        self.send(self.request(&Endpoint::DeleteDataset(uid))?)
            .await
            .map(|_| ())
    }

    pub async fn upload_dataset(&self, path: &Path) -> Result<UploadOutcome, ApiError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ApiError::InvalidFile(format!("Invalid file name: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime_for(&file_name))?;

        let builder = self
            .request(&Endpoint::UploadDataset)?
            .multipart(Form::new().part("file", part));
        self.json(builder).await
    }

    pub async fn summary_charts(&self, dataset: &str) -> Result<Page<ChartRecord>, ApiError> {
        self.get(Endpoint::SummaryCharts(dataset)).await
    }

    pub async fn chart_counts(&self) -> Result<ChartCountSummary, ApiError> {
        self.get(Endpoint::ChartCounts).await
    }

    pub async fn generate_charts(&self, dataset: &str) -> Result<GenerateOutcome, ApiError> {
        let builder = self
            .request(&Endpoint::GenerateCharts)?
            .json(&json!({ "dataset_id": dataset }));
        self.json(builder).await
    }

    pub async fn respondent_charts(
        &self,
        dataset: &str,
        page: u32,
    ) -> Result<Page<ChartRecord>, ApiError> {
        self.get(Endpoint::RespondentCharts { dataset, page }).await
    }

    pub async fn filter_options(&self, dataset: &str) -> Result<FilterOptionSet, ApiError> {
        self.get(Endpoint::FilterOptions(dataset)).await
    }

    /// Only the dimensions set in `selection` are sent.
    pub async fn filtered_distribution(
        &self,
        dataset: &str,
        selection: &FilterSelection,
    ) -> Result<FilteredDistribution, ApiError> {
        let mut builder = self.request(&Endpoint::FilteredDistribution(dataset))?;
        let pairs = selection.query_pairs();
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        self.json(builder).await
    }

    pub async fn admin_users(&self) -> Result<Vec<AdminUser>, ApiError> {
        self.get(Endpoint::AdminUsers).await
    }

    pub async fn user_datasets(&self, user_id: i64) -> Result<UserDatasets, ApiError> {
        self.get(Endpoint::UserDatasets(user_id)).await
    }

    pub async fn user_charts(&self, user_id: i64) -> Result<UserCharts, ApiError> {
        self.get(Endpoint::UserCharts(user_id)).await
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".xlsx") {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else if lower.ends_with(".xls") {
        "application/vnd.ms-excel"
    } else {
        "text/csv"
    }
}
