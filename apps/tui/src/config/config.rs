use color_eyre::eyre::{eyre, Result};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_LOG_FILE: &str = "taam-dash.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub session_file: PathBuf,
    pub log_file: PathBuf,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = get("TAAM_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(eyre!("TAAM_API_URL must be an http(s) URL, got {api_url}"));
        }

        let session_file = get("TAAM_SESSION_FILE").map_or_else(
            || default_session_file(get("HOME").or_else(|| get("USERPROFILE"))),
            PathBuf::from,
        );

        let log_file = get("TAAM_LOG_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from);

        let http_timeout = match get("TAAM_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    eyre!("TAAM_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw}")
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            session_file,
            log_file,
            http_timeout,
        })
    }
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(
        || PathBuf::from("./.taam-session.json"),
        |home| PathBuf::from(home).join(".taam").join("session.json"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() -> Result<()> {
        let config = AppConfig::from_lookup(lookup(&[("HOME", "/home/analyst")]))?;
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(
            config.session_file,
            PathBuf::from("/home/analyst/.taam/session.json")
        );
        assert_eq!(config.log_file, PathBuf::from("taam-dash.log"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn no_home_falls_back_to_working_directory() -> Result<()> {
        let config = AppConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config.session_file, PathBuf::from("./.taam-session.json"));
        Ok(())
    }

    #[test]
    fn env_values_override_defaults() -> Result<()> {
        let config = AppConfig::from_lookup(lookup(&[
            ("TAAM_API_URL", "https://taam.example.com/api/"),
            ("TAAM_SESSION_FILE", "/tmp/s.json"),
            ("TAAM_HTTP_TIMEOUT_SECS", "5"),
            ("TAAM_LOG_FILE", ""),
        ]))?;
        assert_eq!(config.api_url, "https://taam.example.com/api");
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        Ok(())
    }

    #[test]
    fn bad_values_are_reported() {
        let timeout = AppConfig::from_lookup(lookup(&[("TAAM_HTTP_TIMEOUT_SECS", "soon")]));
        let url = AppConfig::from_lookup(lookup(&[("TAAM_API_URL", "localhost:8000")]));
        assert!(timeout.is_err());
        assert!(url.is_err());
    }
}
