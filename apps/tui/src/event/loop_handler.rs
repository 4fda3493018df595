use std::collections::HashMap;
use std::io::Stdout;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde::Serialize;
use taam_dashboard::domain::ChartCount;
use taam_dashboard::ApiClient;
use tracing::{debug, info, warn};

use crate::app::{handle_input, App};
use crate::ui;

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Sign-in details for a headless run; without them the stored session is used.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Prints datasets and chart counts without opening the UI.
pub async fn run_headless(
    client: &ApiClient,
    credentials: Option<Credentials>,
    json: bool,
) -> Result<()> {
    authenticate(client, credentials).await?;
    let report = build_report(client).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn authenticate(client: &ApiClient, credentials: Option<Credentials>) -> Result<()> {
    if let Some(credentials) = credentials {
        let user = client
            .login(&credentials.email, &credentials.password)
            .await
            .map_err(|e| eyre!(e.user_message("Login failed")))?;
        info!("headless login as {}", user.email);
        return Ok(());
    }
    if !client.session().init() {
        return Err(eyre!(
            "Not signed in. Pass --email and --password or sign in through the dashboard first."
        ));
    }

    // The stored token may have lapsed since it was saved.
    match client.token_status().await {
        Ok(status) if status.is_expired => {
            client.session().expire();
            Err(eyre!("The stored session has expired. Please log in again."))
        }
        Ok(status) => {
            debug!(
                "resumed session for {}, {:.0}s left",
                status.email, status.expires_in_seconds
            );
            Ok(())
        }
        Err(e) if e.is_unauthorized() => Err(eyre!(e.user_message("Session expired"))),
        Err(e) => Err(eyre!(e.user_message("Could not verify the stored session"))),
    }
}

async fn build_report(client: &ApiClient) -> Result<HeadlessReport> {
    let datasets = client.datasets().await?;
    // Counts are best effort; the listing alone is still useful.
    let counts: HashMap<String, ChartCount> = match client.chart_counts().await {
        Ok(summary) => summary
            .results
            .into_iter()
            .map(|count| (count.dataset_uid.clone(), count))
            .collect(),
        Err(e) => {
            warn!("chart counts unavailable: {e}");
            HashMap::new()
        }
    };

    let rows: Vec<HeadlessDataset> = datasets
        .into_iter()
        .map(|dataset| {
            let count = counts.get(&dataset.uid);
            HeadlessDataset {
                chart_count: count.map(|c| c.chart_count),
                has_distribution: count.is_some_and(|c| c.has_distribution),
                uid: dataset.uid,
                filename: dataset.filename,
                row_count: dataset.row_count,
                parsed_ok: dataset.parsed_ok,
                created_at: dataset.created_at.map(|at| at.to_rfc3339()),
            }
        })
        .collect();

    Ok(HeadlessReport {
        user: client.session().user().map(|user| user.email),
        total_datasets: rows.len(),
        total_rows: rows.iter().map(|row| row.row_count).sum(),
        total_charts: rows.iter().filter_map(|row| row.chart_count).sum(),
        datasets: rows,
    })
}

fn print_report(report: &HeadlessReport) {
    println!("\nTAAM Datasets");
    println!("=============");
    if let Some(user) = &report.user {
        println!("Signed in as: {user}");
    }
    println!("Total datasets: {}", report.total_datasets);
    println!("Total rows: {}", report.total_rows);
    println!("Total charts: {}", report.total_charts);

    println!("\nDatasets:");
    for dataset in &report.datasets {
        let charts = dataset
            .chart_count
            .map_or_else(|| "-".to_string(), |count| count.to_string());
        println!(
            "- {} | {} rows | {} charts{} | {}",
            dataset.filename,
            dataset.row_count,
            charts,
            if dataset.has_distribution { "" } else { " (no summary)" },
            dataset.created_at.as_deref().unwrap_or("-"),
        );
    }
}

#[derive(Debug, Serialize)]
struct HeadlessReport {
    user: Option<String>,
    total_datasets: usize,
    total_rows: u64,
    total_charts: u64,
    datasets: Vec<HeadlessDataset>,
}

#[derive(Debug, Serialize)]
struct HeadlessDataset {
    uid: String,
    filename: String,
    row_count: u64,
    parsed_ok: bool,
    chart_count: Option<u64>,
    has_distribution: bool,
    created_at: Option<String>,
}

/// Run the main application event loop
pub fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update();

        terminal
            .draw(|f| ui::ui(app, f))
            .map_err(|e| eyre!("Terminal draw error: {e}"))?;

        if !matches!(event::poll(EVENT_POLL_TIMEOUT), Ok(true)) {
            continue;
        }
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                handle_input(app, key.code);
                if !app.running {
                    break;
                }
            }
            Ok(Event::Resize(_, _)) => {
                if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
                    debug!("redraw after resize failed: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("failed to read terminal event: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taam_dashboard::{Session, TokenStorage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_backend(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/commons/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t",
                "user_id": 1,
                "email": "analyst@example.com"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "next": null,
                "results": [
                    {"uid": "d1", "filename": "wave1.csv", "row_count": 45, "parsed_ok": true},
                    {"uid": "d2", "filename": "wave2.xlsx", "row_count": 10, "parsed_ok": true}
                ]
            })))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> Result<ApiClient> {
        Ok(ApiClient::new(
            &server.uri(),
            Session::new(TokenStorage::memory()),
            Duration::from_secs(5),
        )?)
    }

    #[tokio::test]
    async fn report_joins_datasets_with_chart_counts() -> Result<()> {
        let server = MockServer::start().await;
        mount_backend(&server).await;
        Mock::given(method("GET"))
            .and(path("/charts/summary/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"dataset_uid": "d1", "chart_count": 47, "has_distribution": true}]
            })))
            .mount(&server)
            .await;

        let client = client(&server)?;
        authenticate(
            &client,
            Some(Credentials {
                email: "analyst@example.com".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await?;
        let report = build_report(&client).await?;

        assert_eq!(report.user.as_deref(), Some("analyst@example.com"));
        assert_eq!(report.total_datasets, 2);
        assert_eq!(report.total_rows, 55);
        assert_eq!(report.total_charts, 47);
        assert_eq!(report.datasets[0].chart_count, Some(47));
        assert_eq!(report.datasets[1].chart_count, None);
        Ok(())
    }

    #[tokio::test]
    async fn missing_chart_counts_do_not_fail_the_report() -> Result<()> {
        let server = MockServer::start().await;
        mount_backend(&server).await;
        Mock::given(method("GET"))
            .and(path("/charts/summary/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client(&server)?;
        client.login("analyst@example.com", "pw").await?;
        let report = build_report(&client).await?;

        assert_eq!(report.total_datasets, 2);
        assert_eq!(report.total_charts, 0);
        Ok(())
    }

    #[tokio::test]
    async fn headless_without_a_session_is_refused() -> Result<()> {
        let server = MockServer::start().await;
        let client = client(&server)?;
        assert!(authenticate(&client, None).await.is_err());
        Ok(())
    }

    fn stored_session(dir: &tempfile::TempDir) -> Result<TokenStorage> {
        let storage = TokenStorage::file(dir.path().join("session.json"));
        Session::new(storage.clone()).login(
            "stored".to_string(),
            None,
            taam_dashboard::domain::User {
                id: 1,
                email: "analyst@example.com".to_string(),
                firstname: String::new(),
                lastname: String::new(),
                is_staff: false,
            },
        )?;
        Ok(storage)
    }

    async fn mount_token_status(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/commons/auth/token-status/"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn stored_session_is_checked_before_reporting() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;
        mount_token_status(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "is_expired": false,
                "expires_in_seconds": 600.0,
                "email": "analyst@example.com"
            })),
        )
        .await;

        let client = ApiClient::new(
            &server.uri(),
            Session::new(stored_session(&dir)?),
            Duration::from_secs(5),
        )?;
        authenticate(&client, None).await?;
        assert!(client.session().is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_stored_token_is_cleared() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;
        mount_token_status(&server, ResponseTemplate::new(401)).await;

        let storage = stored_session(&dir)?;
        let client = ApiClient::new(
            &server.uri(),
            Session::new(storage.clone()),
            Duration::from_secs(5),
        )?;
        let err = authenticate(&client, None).await.err();

        assert_eq!(
            err.map(|e| e.to_string()),
            Some("Your session has expired. Please log in again.".to_string())
        );
        assert!(!client.session().is_authenticated());
        assert!(storage.load()?.auth_token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn expired_stored_token_is_refused() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;
        mount_token_status(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({"is_expired": true})),
        )
        .await;

        let client = ApiClient::new(
            &server.uri(),
            Session::new(stored_session(&dir)?),
            Duration::from_secs(5),
        )?;
        assert!(authenticate(&client, None).await.is_err());
        assert!(!client.session().is_authenticated());
        Ok(())
    }
}
