use reqwest::Method;

/// Page size used to pull "all" summary charts for a dataset in one request.
pub const SUMMARY_PAGE_SIZE: u32 = 100;

/// Page size for respondent chart pagination.
pub const RESPONDENT_PAGE_SIZE: u32 = 20;

/// Every backend operation the dashboard calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Login,
    Logout,
    TokenStatus,
    Datasets { page: u32 },
    UploadDataset,
    Dataset(&'a str),
    DeleteDataset(&'a str),
    SummaryCharts(&'a str),
    ChartCounts,
    GenerateCharts,
    RespondentCharts { dataset: &'a str, page: u32 },
    FilterOptions(&'a str),
    FilteredDistribution(&'a str),
    AdminUsers,
    UserDatasets(i64),
    UserCharts(i64),
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        match self {
            Self::Login | Self::Logout | Self::UploadDataset | Self::GenerateCharts => Method::POST,
            Self::DeleteDataset(_) => Method::DELETE,
            _ => Method::GET,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => "/commons/auth/login/".to_string(),
            Self::Logout => "/commons/auth/logout/".to_string(),
            Self::TokenStatus => "/commons/auth/token-status/".to_string(),
            Self::Datasets { .. } => "/datasets/".to_string(),
            Self::UploadDataset => "/datasets/upload/".to_string(),
            Self::Dataset(uid) | Self::DeleteDataset(uid) => format!("/datasets/{uid}/"),
            Self::SummaryCharts(_) => "/charts/".to_string(),
            Self::ChartCounts => "/charts/summary/".to_string(),
            Self::GenerateCharts => "/charts/generate/".to_string(),
            Self::RespondentCharts { dataset, .. } => {
                format!("/charts/dataset/{dataset}/respondents/")
            }
            Self::FilterOptions(uid) => format!("/charts/dataset/{uid}/filter-options/"),
            Self::FilteredDistribution(uid) => {
                format!("/charts/dataset/{uid}/filtered-distribution/")
            }
            Self::AdminUsers => "/users/admin/list/".to_string(),
            Self::UserDatasets(id) => format!("/users/{id}/datasets/"),
            Self::UserCharts(id) => format!("/users/{id}/charts/"),
        }
    }

    /// Fixed query parameters. Filter parameters are added by the caller.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Datasets { page } if *page > 1 => vec![("page", page.to_string())],
            Self::SummaryCharts(uid) => vec![
                ("dataset", (*uid).to_string()),
                ("page_size", SUMMARY_PAGE_SIZE.to_string()),
            ],
            Self::RespondentCharts { page, .. } => vec![
                ("page", page.to_string()),
                ("page_size", RESPONDENT_PAGE_SIZE.to_string()),
            ],
            _ => Vec::new(),
        }
    }

    pub const fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}
