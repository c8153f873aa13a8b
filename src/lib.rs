//! DexScout Token Scout Library
//!
//! Screen-scrapes new token listings from the DexScreener mobile app, records
//! simulated purchases and reconciles them against live pair prices.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod rate_limit;
pub mod task_runner;
