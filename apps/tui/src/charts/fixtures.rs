//! Backend stand-ins shared by the chart tests.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::client::tests::signed_in_client;
use crate::api::RESPONDENT_PAGE_SIZE;
use crate::charts::ChartDataLoader;
use crate::domain::ChartRecord;
use crate::error::ApiError;

pub fn signed_in_loader(server: &MockServer, dataset: &str) -> Result<ChartDataLoader, ApiError> {
    Ok(ChartDataLoader::new(signed_in_client(server)?, dataset))
}

fn distribution_json() -> Value {
    json!({
        "uid": "dist-1",
        "chart_type": "persona_distribution",
        "chart_config": {"title": "Persona Distribution", "description": "All respondents"},
        "derived_metrics": {
            "total_respondents": 45,
            "persona_distribution": {
                "Value Hunters": {"count": 20, "percentage": 44.4},
                "Obligati": {"count": 25, "percentage": 55.6}
            }
        }
    })
}

pub fn distribution_record() -> ChartRecord {
    serde_json::from_value(distribution_json()).expect("distribution fixture decodes")
}

pub fn summary_json() -> Value {
    json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            distribution_json(),
            {
                "uid": "heatmap-1",
                "chart_type": "heatmap_canonical",
                "is_canonical": true,
                "chart_config": {"title": "Persona Heatmap"}
            }
        ]
    })
}

fn respondent(index: u64) -> Value {
    json!({
        "uid": format!("respondent-{index}"),
        "chart_type": "taam_radar",
        "is_canonical": false,
        "chart_config": {
            "title": format!("Respondent {}", index + 1),
            "user_data": [{"axis": "Price", "value": 3.5, "percent": 70.0}]
        },
        "derived_metrics": {"respondent_index": index}
    })
}

fn respondent_page(total: u64, page: u64) -> Value {
    let size = u64::from(RESPONDENT_PAGE_SIZE);
    let start = (page - 1) * size;
    let end = (start + size).min(total);
    json!({
        "results": (start..end).map(respondent).collect::<Vec<_>>(),
        "count": total,
        "next": end < total,
        "previous": page > 1,
        "page": page,
        "total_pages": total.div_ceil(size)
    })
}

/// Dataset detail, summary charts and filter options for `dataset`.
pub async fn mount_dataset(server: &MockServer, dataset: &str, rows: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/datasets/{dataset}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": dataset,
            "filename": "survey.csv",
            "row_count": rows,
            "parsed_ok": true
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charts/"))
        .and(query_param("dataset", dataset))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_json()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/charts/dataset/{dataset}/filter-options/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "age_groups": ["18-25", "26-30"],
            "genders": ["Female", "Male"],
            "emirates": ["Abu Dhabi", "Dubai"]
        })))
        .mount(server)
        .await;
}

/// Respondent pages of twenty for `total` respondents.
pub async fn mount_respondents(
    server: &MockServer,
    dataset: &str,
    total: u64,
    delay: Option<Duration>,
) {
    let pages = total.div_ceil(u64::from(RESPONDENT_PAGE_SIZE)).max(1);
    for page in 1..=pages {
        let mut response = ResponseTemplate::new(200).set_body_json(respondent_page(total, page));
        if let Some(delay) = delay {
            response = response.set_delay(delay);
        }
        Mock::given(method("GET"))
            .and(path(format!("/charts/dataset/{dataset}/respondents/")))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .mount(server)
            .await;
    }
}
