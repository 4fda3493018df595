pub mod admin;
pub mod dashboard;
pub mod datasets;
pub mod help;
pub mod login;
pub mod upload;
