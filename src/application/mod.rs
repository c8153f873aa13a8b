pub mod listing_scraper;
pub mod purchase_pipeline;
pub mod reconciliation_runner;
pub mod token_monitor;
