pub mod charts;
pub mod popup;
pub mod radar;
pub mod status;
pub mod tables;
