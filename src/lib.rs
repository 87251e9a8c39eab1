pub mod analysis;
pub mod api;
pub mod config;
pub mod ingestion;
pub mod report;
