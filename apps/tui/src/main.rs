mod app;
mod cli;
mod event;
mod terminal;
mod ui;

use std::fs::OpenOptions;

use app::App;
use clap::Parser;
use cli::CliArgs;
use color_eyre::eyre::{eyre, Result};
use event::Credentials;
use taam_dashboard::{ApiClient, AppConfig, Session, TokenStorage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();
    let config = AppConfig::from_env()?;

    init_logging(&config, args.log_directives())?;
    let session = Session::new(TokenStorage::file(config.session_file.clone()));
    let client = ApiClient::new(&config.api_url, session, config.http_timeout)
        .map_err(|e| eyre!("Failed to build HTTP client: {e}"))?;
    info!("starting against {}", client.base_url());

    if args.headless || !is_terminal() {
        let credentials = match (args.email, args.password) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };
        return event::run_headless(&client, credentials, args.json).await;
    }

    let mut app = App::new(client);
    app.start();

    let mut terminal = terminal::setup()?;
    let result = event::run(&mut terminal, &mut app);
    terminal::cleanup(true, true);

    result
}

/// Logs go to a file; stdout belongs to the UI or the headless report.
fn init_logging(config: &AppConfig, default_directives: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| eyre!("Failed to open log file {}: {e}", config.log_file.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
