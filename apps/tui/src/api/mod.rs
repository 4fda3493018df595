// REST access to the TAAM backend: endpoint registry plus the typed client.

pub mod client;
pub mod endpoints;

pub use client::ApiClient;
pub use endpoints::{Endpoint, RESPONDENT_PAGE_SIZE, SUMMARY_PAGE_SIZE};
