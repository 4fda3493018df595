use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "taam-dash", version, about = "TAAM survey persona dashboard")]
pub struct CliArgs {
    /// Print datasets and chart counts, then exit
    #[arg(long)]
    pub headless: bool,

    /// Print the headless report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override the backend base URL
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Override where the session token is stored
    #[arg(long = "session-file", value_name = "PATH")]
    pub session_file: Option<String>,

    /// Override the log file
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Sign in before running headless
    #[arg(long, requires = "password")]
    pub email: Option<String>,

    #[arg(long, requires = "email")]
    pub password: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(url) = &self.api_url {
            std::env::set_var("TAAM_API_URL", url);
        }
        if let Some(path) = &self.session_file {
            std::env::set_var("TAAM_SESSION_FILE", path);
        }
        if let Some(path) = &self.log_file {
            std::env::set_var("TAAM_LOG_FILE", path);
        }
    }

    /// Default tracing directives; `RUST_LOG` still wins when set.
    pub const fn log_directives(&self) -> &'static str {
        if self.debug {
            "taam_dashboard=debug,taam_dash=debug"
        } else {
            "taam_dashboard=info,taam_dash=info"
        }
    }
}
