pub mod chain_resolver;
pub mod dedup_tracker;
pub mod listing_parser;
pub mod portfolio_reconciliation;
pub mod purchase_simulator;
