//! Listing Pipeline End-to-End Tests
//!
//! Drives the monitor and purchase pipelines against a scripted screen.
//!
//! Test Categories:
//! 1. Scanning - header filtering, caps, stale element handling
//! 2. Monitoring - liquidity floor, dedup across polls and restarts
//! 3. Purchases - chain detection, clipboard hashes, sentinels, fatal flush

mod common;

use common::{DetailPage, MockScreen};
use dexscout::application::listing_scraper::ListingScraper;
use dexscout::application::purchase_pipeline::{PurchasePipeline, PurchaseTiming};
use dexscout::application::token_monitor::TokenMonitor;
use dexscout::domain::entities::simulated_purchase::{
    ListingDetails, SimulatedPurchase, PAIR_HASH_UNAVAILABLE, TOKEN_HASH_UNAVAILABLE,
};
use dexscout::domain::entities::token_record::TokenRecord;
use dexscout::domain::errors::{AutomationError, PipelineError};
use dexscout::domain::services::chain_resolver::ChainResolver;
use dexscout::domain::services::dedup_tracker::KnownTokenSet;
use dexscout::domain::services::listing_parser::ListingParser;
use dexscout::domain::services::purchase_simulator::PurchaseSimulator;
use dexscout::persistence::purchase_ledger::PurchaseLedger;
use dexscout::persistence::token_store::TokenStore;
use dexscout::task_runner::{run_polling_loop, PollingConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const PEPE_ROW: &str =
    "PEPE, 2h, $0.001234, 3, ▲, 12%, PEPE/WETH, LIQ, $5.2K, VOL, $100, MCAP, $2M";
const DUST_ROW: &str = "DUST, 5m, $0.5, ▼, 3%, DUST/SOL, LIQ, <$1";
const MOON_ROW: &str = "MOON, 1h, $2, ▲, 50%, MOON/ETH, LIQ, $1.2M";

fn scraper(screen: &Arc<MockScreen>, max_listings: usize) -> ListingScraper {
    ListingScraper::new(screen.clone(), ListingParser::default(), max_listings, 3)
}

fn names(records: &[TokenRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Scanning
// ============================================================================

#[tokio::test]
async fn test_scan_skips_headers_and_parses_rows() {
    let screen = Arc::new(MockScreen::new(&["Trending", PEPE_ROW, "Newest pairs", MOON_ROW]));

    let listings = scraper(&screen, 8).scan().await.unwrap();

    assert_eq!(listings.len(), 2);
    let pepe = &listings[0].record;
    assert_eq!(pepe.name, "PEPE");
    assert_eq!(pepe.price_adjustment, "3");
    assert_eq!(pepe.liquidity, "$5.2K");
    assert_eq!(pepe.market_cap, "$2M");
    assert_eq!(listings[1].record.name, "MOON");
}

#[tokio::test]
async fn test_scan_stops_at_listing_cap() {
    let rows: Vec<String> = (0..12)
        .map(|i| format!("T{}, 1m, $1, ▲, 1%, T{}/SOL, LIQ, $10", i, i))
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let screen = Arc::new(MockScreen::new(&rows));

    let listings = scraper(&screen, 8).scan().await.unwrap();

    assert_eq!(listings.len(), 8);
    assert_eq!(listings[7].record.name, "T7");
}

#[tokio::test]
async fn test_stale_listing_query_is_retried() {
    let screen = Arc::new(MockScreen::new(&[PEPE_ROW]).with_stale_scans(2));

    let listings = scraper(&screen, 8).scan().await.unwrap();

    assert_eq!(listings.len(), 1);
    assert_eq!(screen.scans(), 3);
}

#[tokio::test]
async fn test_stale_listing_query_gives_up_after_budget() {
    let screen = Arc::new(MockScreen::new(&[PEPE_ROW]).with_stale_scans(3));

    let result = scraper(&screen, 8).scan().await;

    assert!(matches!(result, Err(AutomationError::StaleElement(_))));
    assert_eq!(screen.scans(), 3);
}

#[tokio::test]
async fn test_stale_row_is_read_again_then_skipped() {
    let once = Arc::new(MockScreen::new(&[PEPE_ROW, MOON_ROW]).with_stale_row(0, 1));
    let listings = scraper(&once, 8).scan().await.unwrap();
    assert_eq!(listings.len(), 2);

    let always = Arc::new(MockScreen::new(&[PEPE_ROW, MOON_ROW]).with_stale_row(0, 10));
    let listings = scraper(&always, 8).scan().await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].record.name, "MOON");
}

// ============================================================================
// Monitoring
// ============================================================================

#[tokio::test]
async fn test_monitor_emits_liquid_unseen_tokens_once() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("tokens_data.json");
    let screen = Arc::new(MockScreen::new(&["Trending", PEPE_ROW, DUST_ROW, MOON_ROW]));

    let mut monitor =
        TokenMonitor::new(scraper(&screen, 8), TokenStore::new(&store_path), 1.0).await;

    let fresh = monitor.poll_once().await.unwrap();
    assert_eq!(names(&fresh), vec!["PEPE", "MOON"]);

    let saved: Vec<TokenRecord> = read_json(&store_path);
    assert_eq!(names(&saved), vec!["PEPE", "MOON"]);

    let fresh = monitor.poll_once().await.unwrap();
    assert!(fresh.is_empty());

    screen.set_rows(&["NEWT, 1m, $0.2, ▲, 5%, NEWT/SOL, LIQ, $900", PEPE_ROW]);
    let fresh = monitor.poll_once().await.unwrap();
    assert_eq!(names(&fresh), vec!["NEWT"]);
    assert_eq!(monitor.known().len(), 3);
}

#[tokio::test]
async fn test_monitor_remembers_tokens_across_restarts() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("tokens_data.json");

    let mut moon = TokenRecord::empty(chrono::Utc::now());
    moon.name = "MOON".to_string();
    TokenStore::new(&store_path)
        .save(&KnownTokenSet::from_records(vec![moon]))
        .await
        .unwrap();

    let screen = Arc::new(MockScreen::new(&[PEPE_ROW, MOON_ROW]));
    let mut monitor =
        TokenMonitor::new(scraper(&screen, 8), TokenStore::new(&store_path), 1.0).await;

    let fresh = monitor.poll_once().await.unwrap();
    assert_eq!(names(&fresh), vec!["PEPE"]);

    let saved: Vec<TokenRecord> = read_json(&store_path);
    assert_eq!(names(&saved), vec!["MOON", "PEPE"]);
}

#[tokio::test]
async fn test_monitor_runs_in_polling_loop() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(MockScreen::new(&[PEPE_ROW]));
    let mut monitor = TokenMonitor::new(
        scraper(&screen, 8),
        TokenStore::new(dir.path().join("tokens_data.json")),
        1.0,
    )
    .await;
    let polling = PollingConfig {
        interval: Duration::from_millis(1),
        max_consecutive_failures: 3,
        max_retry_delay: Duration::from_millis(1),
        max_polls: Some(3),
    };

    run_polling_loop(&mut monitor, &polling).await.unwrap();

    assert_eq!(screen.scans(), 3);
    assert_eq!(monitor.known().len(), 1);
}

#[tokio::test]
async fn test_monitor_loop_gives_up_on_persistent_staleness() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(MockScreen::new(&[PEPE_ROW]).with_stale_scans(100));
    let mut monitor = TokenMonitor::new(
        scraper(&screen, 8),
        TokenStore::new(dir.path().join("tokens_data.json")),
        1.0,
    )
    .await;
    let polling = PollingConfig {
        interval: Duration::from_millis(1),
        max_consecutive_failures: 2,
        max_retry_delay: Duration::from_millis(1),
        max_polls: None,
    };

    let result = run_polling_loop(&mut monitor, &polling).await;

    assert!(matches!(
        result,
        Err(PipelineError::TooManyFailures { failures: 2, .. })
    ));
}

#[tokio::test]
async fn test_tokens_stay_new_until_the_store_is_written() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("tokens_data.json");
    // A directory in place of the document makes the write fail
    std::fs::create_dir(&store_path).unwrap();
    std::fs::write(store_path.join("keep"), "x").unwrap();

    let screen = Arc::new(MockScreen::new(&[PEPE_ROW]));
    let mut monitor =
        TokenMonitor::new(scraper(&screen, 8), TokenStore::new(&store_path), 1.0).await;

    let result = monitor.poll_once().await;
    assert!(matches!(result, Err(PipelineError::Store(_))));
    assert!(!monitor.known().contains("PEPE"));

    std::fs::remove_dir_all(&store_path).unwrap();
    let fresh = monitor.poll_once().await.unwrap();
    assert_eq!(names(&fresh), vec!["PEPE"]);

    let saved: Vec<TokenRecord> = read_json(&store_path);
    assert_eq!(names(&saved), vec!["PEPE"]);
}

// ============================================================================
// Purchases
// ============================================================================

fn purchase_screen() -> MockScreen {
    MockScreen::new(&[
        "Newest",
        PEPE_ROW,
        MOON_ROW,
        "ODD, 1m, $1, ▲, 1%, ODD/X, LIQ, $10",
    ])
    .with_detail(
        "PEPE",
        DetailPage {
            chain_candidates: vec!["Share".into(), "Base".into(), "Watchlist".into()],
            pair_hash: Some("0xpepepair".into()),
            token_hash: Some("0xpepetoken".into()),
        },
    )
    .with_detail(
        "MOON",
        DetailPage {
            chain_candidates: vec!["Atlantis".into()],
            pair_hash: None,
            token_hash: Some("0xmoontoken".into()),
        },
    )
}

fn pipeline(screen: &Arc<MockScreen>, dir: &Path) -> PurchasePipeline {
    PurchasePipeline::new(
        scraper(screen, 8),
        ChainResolver::default(),
        PurchaseSimulator::default(),
        PurchaseLedger::new(
            dir.join("simulated_purchases.json"),
            dir.join("pair_hash.json"),
        ),
        PurchaseTiming::immediate(),
    )
}

#[tokio::test]
async fn test_purchase_run_records_every_listing() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(purchase_screen());

    let run = pipeline(&screen, dir.path()).run().await.unwrap();

    assert_eq!(run.purchases.len(), 3);
    assert_eq!(screen.backs(), 3);
    assert!(screen.on_listing_page());

    let pepe = &run.purchases[0];
    assert_eq!(pepe.token_name, "PEPE");
    assert_eq!(pepe.chain_id, "base");
    assert_eq!(pepe.pair_hash1, "0xpepepair");
    assert_eq!(pepe.pair_hash2, "0xpepetoken");
    assert!((pepe.purchase_price - 0.0001234).abs() < 1e-12);
    assert!((pepe.tokens_purchased - 1.0 / 0.0001234).abs() < 1e-6);

    let moon = &run.purchases[1];
    assert_eq!(moon.chain_id, "");
    assert_eq!(moon.pair_hash1, PAIR_HASH_UNAVAILABLE);
    assert_eq!(moon.pair_hash2, "0xmoontoken");
    assert_eq!(moon.tokens_purchased, 0.5);

    let odd = &run.purchases[2];
    assert_eq!(odd.pair_hash1, PAIR_HASH_UNAVAILABLE);
    assert_eq!(odd.pair_hash2, TOKEN_HASH_UNAVAILABLE);

    let ledger: Vec<SimulatedPurchase> = read_json(&dir.path().join("simulated_purchases.json"));
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger[0].pair_hash1, "0xpepepair");
    assert_eq!(ledger[1].pair_hash1, PAIR_HASH_UNAVAILABLE);
    assert_eq!(ledger[2].token_name, "ODD");

    let details: Vec<ListingDetails> = read_json(&dir.path().join("pair_hash.json"));
    assert_eq!(details.len(), 3);
    assert_eq!(details[0].blockchain_name, "Base");
    assert_eq!(details[0].chain_id, "base");
    assert_eq!(details[0].record.liquidity, "$5.2K");
    assert_eq!(details[1].blockchain_name, "");
}

#[tokio::test]
async fn test_purchase_session_handles_each_token_once() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(purchase_screen());
    let mut pipeline = pipeline(&screen, dir.path());

    let first = pipeline.run().await.unwrap();
    let second = pipeline.run().await.unwrap();

    assert_eq!(first.purchases.len(), 3);
    assert!(second.purchases.is_empty());
    assert_eq!(screen.backs(), 3);

    // An empty run leaves the first run's ledger in place
    let ledger: Vec<SimulatedPurchase> = read_json(&dir.path().join("simulated_purchases.json"));
    assert_eq!(ledger.len(), 3);
    let details: Vec<ListingDetails> = read_json(&dir.path().join("pair_hash.json"));
    assert_eq!(details.len(), 3);
}

#[tokio::test]
async fn test_later_runs_extend_the_session_ledger() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(purchase_screen());
    let mut pipeline = pipeline(&screen, dir.path());

    pipeline.run().await.unwrap();
    screen.set_rows(&["NEWT, 1m, $0.2, ▲, 5%, NEWT/SOL, LIQ, $900", PEPE_ROW]);
    let second = pipeline.run().await.unwrap();

    assert_eq!(second.purchases.len(), 1);
    assert_eq!(second.purchases[0].token_name, "NEWT");

    let ledger: Vec<SimulatedPurchase> = read_json(&dir.path().join("simulated_purchases.json"));
    let recorded: Vec<&str> = ledger.iter().map(|p| p.token_name.as_str()).collect();
    assert_eq!(recorded, vec!["PEPE", "MOON", "ODD", "NEWT"]);
}

#[tokio::test]
async fn test_unreadable_chain_still_records_purchase() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(purchase_screen().with_broken_chain_query());

    let run = pipeline(&screen, dir.path()).run().await.unwrap();

    assert_eq!(run.purchases.len(), 3);
    let pepe = &run.purchases[0];
    assert_eq!(pepe.token_name, "PEPE");
    assert_eq!(pepe.chain_id, "");
    assert_eq!(pepe.pair_hash1, "0xpepepair");
    assert_eq!(run.details[0].blockchain_name, "");
    assert_eq!(screen.backs(), 3);
}

#[tokio::test]
async fn test_lost_session_flushes_purchases_before_failing() {
    let dir = tempdir().unwrap();
    let screen = Arc::new(purchase_screen().losing_session_on("MOON"));

    let result = pipeline(&screen, dir.path()).run().await;

    match result {
        Err(e @ PipelineError::Automation(AutomationError::SessionLost(_))) => {
            assert!(e.is_fatal())
        }
        other => panic!("expected a lost session, got {:?}", other.map(|r| r.purchases.len())),
    }

    let ledger: Vec<SimulatedPurchase> = read_json(&dir.path().join("simulated_purchases.json"));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].token_name, "PEPE");
    let details: Vec<ListingDetails> = read_json(&dir.path().join("pair_hash.json"));
    assert_eq!(details.len(), 1);
}
