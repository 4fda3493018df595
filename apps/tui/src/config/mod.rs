#[allow(clippy::module_inception)]
mod config;

pub use config::{AppConfig, DEFAULT_API_URL, DEFAULT_LOG_FILE, DEFAULT_TIMEOUT_SECS};
