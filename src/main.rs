use dexscout::application::listing_scraper::ListingScraper;
use dexscout::application::purchase_pipeline::{PurchasePipeline, PurchaseTiming};
use dexscout::application::reconciliation_runner::ReconciliationRunner;
use dexscout::application::token_monitor::TokenMonitor;
use dexscout::config::{RunMode, ScoutConfig};
use dexscout::domain::repositories::screen_driver::ScreenDriver;
use dexscout::domain::services::chain_resolver::ChainResolver;
use dexscout::domain::services::listing_parser::ListingParser;
use dexscout::domain::services::purchase_simulator::PurchaseSimulator;
use dexscout::infrastructure::appium_client::{AppiumClient, AppiumConfig};
use dexscout::infrastructure::dexscreener_client::{DexScreenerClient, DexScreenerConfig};
use dexscout::persistence::purchase_ledger::PurchaseLedger;
use dexscout::persistence::token_store::TokenStore;
use dexscout::persistence::ResultsStore;
use dexscout::task_runner::{run_polling_loop, PollingConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dexscout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ScoutConfig::from_env();
    info!("DexScout starting in {} mode", config.run_mode);
    let started = Instant::now();

    let outcome = match config.run_mode {
        RunMode::Reconcile => reconcile(&config).await,
        RunMode::Monitor | RunMode::Purchase => with_session(&config).await,
    };

    info!(
        "Execution completed in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    outcome
}

async fn reconcile(config: &ScoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = DexScreenerClient::new(DexScreenerConfig {
        api_base: config.price_api_base_url.clone(),
        timeout: Duration::from_millis(config.price_api_timeout_milliseconds),
        requests_per_minute: config.price_api_requests_per_minute,
    })?;

    let runner = ReconciliationRunner::new(
        Arc::new(client),
        PurchaseLedger::new(&config.purchases_path, &config.listing_details_path),
        ResultsStore::new(&config.results_path),
    );
    let batch = runner.run().await?;
    info!(
        "Reconciled {} purchases, skipped {}",
        batch.summary.reconciled, batch.summary.skipped
    );
    Ok(())
}

/// Open an automation session, run the screen pipeline, and always close the session
async fn with_session(config: &ScoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    let appium = Arc::new(
        AppiumClient::connect(&AppiumConfig {
            server_url: config.appium_url.clone(),
            device_name: config.device_name.clone(),
            app_package: config.app_package.clone(),
            app_activity: config.app_activity.clone(),
            request_timeout: Duration::from_secs(60),
        })
        .await?,
    );

    // Allow time for the app to fully load
    tokio::time::sleep(Duration::from_secs(config.app_load_wait_seconds)).await;

    let driver: Arc<dyn ScreenDriver> = appium.clone();
    let scraper = ListingScraper::new(
        driver,
        ListingParser::new(config.parser),
        config.max_listings_per_scan,
        config.max_extraction_attempts,
    );

    let outcome = match config.run_mode {
        RunMode::Monitor => monitor(config, scraper).await,
        _ => purchase(config, scraper).await,
    };

    if let Err(e) = appium.quit().await {
        warn!("Failed to close the automation session: {}", e);
    }
    outcome
}

async fn monitor(
    config: &ScoutConfig,
    scraper: ListingScraper,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut monitor = TokenMonitor::new(
        scraper,
        TokenStore::new(&config.tokens_store_path),
        config.min_liquidity_usd,
    )
    .await;
    let polling = PollingConfig::new(
        Duration::from_secs(config.poll_interval_seconds),
        config.max_consecutive_failures,
    );

    info!(
        "Monitoring new listings every {}s. Press Ctrl+C to stop.",
        config.poll_interval_seconds
    );
    tokio::select! {
        result = run_polling_loop(&mut monitor, &polling) => {
            if let Err(e) = result {
                error!("Monitoring stopped: {}", e);
                return Err(e.into());
            }
        }
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("Received Ctrl+C signal"),
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        },
    }

    info!("Monitoring stopped with {} known tokens", monitor.known().len());
    Ok(())
}

async fn purchase(
    config: &ScoutConfig,
    scraper: ListingScraper,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = PurchasePipeline::new(
        scraper,
        ChainResolver::default(),
        PurchaseSimulator::new(config.purchase_amount_usd),
        PurchaseLedger::new(&config.purchases_path, &config.listing_details_path),
        PurchaseTiming::default(),
    );

    let run = pipeline.run().await?;
    info!("Recorded {} simulated purchases", run.purchases.len());
    Ok(())
}
