use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One uploaded survey file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub uid: String,
    pub filename: String,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parsed_ok: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Chart discriminator as sent by the backend in `chart_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    PersonaDistribution,
    TaamRadar,
    HeatmapCanonical,
    Bar,
    Line,
    Pie,
    Scatter,
    Heatmap,
    Other(String),
}

impl ChartKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PersonaDistribution => "persona_distribution",
            Self::TaamRadar => "taam_radar",
            Self::HeatmapCanonical => "heatmap_canonical",
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::Heatmap => "heatmap",
            Self::Other(kind) => kind,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::PersonaDistribution => "Persona Distribution",
            Self::TaamRadar => "TAAM Radar",
            Self::HeatmapCanonical => "Canonical Heatmap",
            Self::Bar => "Bar Chart",
            Self::Line => "Line Chart",
            Self::Pie => "Pie Chart",
            Self::Scatter => "Scatter Plot",
            Self::Heatmap => "Heatmap",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for ChartKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "persona_distribution" => Self::PersonaDistribution,
            "taam_radar" => Self::TaamRadar,
            "heatmap_canonical" => Self::HeatmapCanonical,
            "bar" => Self::Bar,
            "line" => Self::Line,
            "pie" => Self::Pie,
            "scatter" => Self::Scatter,
            "heatmap" => Self::Heatmap,
            _ => Self::Other(value),
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point of a radar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisValue {
    pub axis: String,
    pub value: f64,
    #[serde(default)]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub persona_code: Option<String>,
    #[serde(default)]
    pub persona_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub axes: Vec<String>,
    /// Observed series.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_data: Vec<AxisValue>,
    /// Canonical persona series.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub canonical_data: Vec<AxisValue>,
    /// Fields this client does not interpret, kept so records round-trip.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaShare {
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(default)]
    pub respondent_index: Option<u64>,
    #[serde(default)]
    pub persona_code: Option<String>,
    #[serde(default)]
    pub persona_name: Option<String>,
    #[serde(default)]
    pub total_respondents: Option<u64>,
    #[serde(default)]
    pub persona_distribution: BTreeMap<String, PersonaShare>,
    #[serde(default)]
    pub survey_answers: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A generated chart as returned by the backend. Never computed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub uid: String,
    pub chart_type: ChartKind,
    #[serde(default)]
    pub chart_config: ChartConfig,
    #[serde(default)]
    pub derived_metrics: DerivedMetrics,
    #[serde(default)]
    pub is_canonical: bool,
}

impl ChartRecord {
    pub const fn kind(&self) -> &ChartKind {
        &self.chart_type
    }

    pub fn title(&self) -> &str {
        &self.chart_config.title
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<AxisValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AxisValue>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A page of results.
///
/// The respondent endpoint reports `next` as a boolean while the standard
/// list endpoints report the next page URL or null; both end up in `has_next`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "next", deserialize_with = "next_flag")]
    pub has_next: bool,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

fn next_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(url) => !url.is_empty(),
        _ => false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    AgeGroup,
    Gender,
    Emirate,
}

impl FilterDimension {
    pub const ALL: [Self; 3] = [Self::AgeGroup, Self::Gender, Self::Emirate];

    /// Query parameter name understood by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgeGroup => "age_group",
            Self::Gender => "gender",
            Self::Emirate => "emirate",
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::AgeGroup),
            1 => Some(Self::Gender),
            2 => Some(Self::Emirate),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AgeGroup => "Age Group",
            Self::Gender => "Gender",
            Self::Emirate => "Emirate",
        }
    }
}

/// Value chosen in a filter dropdown. `All` clears the dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    All,
    Only(String),
}

impl FilterValue {
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub emirate: Option<String>,
}

impl FilterSelection {
    pub fn get(&self, dimension: FilterDimension) -> Option<&str> {
        match dimension {
            FilterDimension::AgeGroup => self.age_group.as_deref(),
            FilterDimension::Gender => self.gender.as_deref(),
            FilterDimension::Emirate => self.emirate.as_deref(),
        }
    }

    /// Merges one dimension into the selection, leaving the others alone.
    pub fn set(&mut self, dimension: FilterDimension, value: FilterValue) {
        let slot = match dimension {
            FilterDimension::AgeGroup => &mut self.age_group,
            FilterDimension::Gender => &mut self.gender,
            FilterDimension::Emirate => &mut self.emirate,
        };
        *slot = match value {
            FilterValue::All => None,
            FilterValue::Only(value) => Some(value),
        };
    }

    pub const fn is_empty(&self) -> bool {
        self.age_group.is_none() && self.gender.is_none() && self.emirate.is_none()
    }

    /// Query pairs for the set dimensions only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        FilterDimension::ALL
            .iter()
            .filter_map(|dimension| {
                self.get(*dimension)
                    .map(|value| (dimension.as_str(), value.to_string()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterOptionSet {
    #[serde(default)]
    pub age_groups: Vec<String>,
    #[serde(default)]
    pub genders: Vec<String>,
    #[serde(default)]
    pub emirates: Vec<String>,
}

impl FilterOptionSet {
    pub fn options(&self, dimension: FilterDimension) -> &[String] {
        match dimension {
            FilterDimension::AgeGroup => &self.age_groups,
            FilterDimension::Gender => &self.genders,
            FilterDimension::Emirate => &self.emirates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistributionEntry {
    pub persona: String,
    #[serde(default)]
    pub persona_code: Option<String>,
    pub count: u64,
    #[serde(alias = "percent")]
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilteredDistribution {
    #[serde(default)]
    pub total_respondents: u64,
    pub filtered_respondents: u64,
    #[serde(default)]
    pub distribution: Vec<DistributionEntry>,
    #[serde(default)]
    pub filters_applied: BTreeMap<String, String>,
}

/// Per-dataset chart counts from `/charts/summary/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartCount {
    pub dataset_uid: String,
    pub chart_count: u64,
    #[serde(default)]
    pub has_distribution: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartCountSummary {
    #[serde(default)]
    pub results: Vec<ChartCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub is_taam: bool,
    #[serde(default)]
    pub charts_created: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadOutcome {
    #[serde(default)]
    pub success: bool,
    pub dataset: Dataset,
    #[serde(default)]
    pub message: String,
}

/// Signed-in user as cached in the session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "user_id")]
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.firstname, self.lastname);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub expires_in: Option<f64>,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl LoginResponse {
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            email: self.email.clone(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            is_staff: self.is_staff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenStatus {
    pub is_expired: bool,
    #[serde(default)]
    pub expires_in_seconds: f64,
    #[serde(default)]
    pub email: String,
}

/// Row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub dataset_count: u64,
    #[serde(default)]
    pub chart_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountSummary {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserDatasets {
    pub user: AccountSummary,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserCharts {
    pub user: AccountSummary,
    #[serde(default)]
    pub charts: Vec<ChartRecord>,
}

/// Persona codes and names, A through J.
pub const PERSONAS: [(&str, &str); 10] = [
    ("A", "Seamless Shoppers"),
    ("B", "Value Hunters"),
    ("C", "Aspirational Splurgers"),
    ("D", "Obligati"),
    ("E", "Luxe Enthusiasts"),
    ("F", "Dependables"),
    ("G", "Sprezzatura"),
    ("H", "Ascent Beautifiers"),
    ("I", "Refined Connoisseurs"),
    ("J", "Exotica Seekers"),
];

pub fn persona_code_for(name: &str) -> Option<&'static str> {
    PERSONAS
        .iter()
        .find(|(code, persona)| *persona == name || *code == name)
        .map(|(code, _)| *code)
}
