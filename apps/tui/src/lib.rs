// Client library for the TAAM survey-persona backend, shared by the
// terminal dashboard and the headless reporter.
pub mod api;
pub mod charts;
pub mod config;
pub mod confirm;
pub mod domain;
pub mod error;
pub mod session;
pub mod upload;

pub use api::ApiClient;
pub use config::AppConfig;
pub use error::ApiError;
pub use session::{Session, TokenStorage};
