//! Token Monitor
//!
//! One monitoring poll: scan the listing screen, drop illiquid rows, keep the
//! tokens never seen before, persist the history and announce the newcomers.

use async_trait::async_trait;
use tracing::info;

use super::listing_scraper::ListingScraper;
use crate::domain::entities::token_record::TokenRecord;
use crate::domain::errors::PipelineError;
use crate::domain::services::dedup_tracker::KnownTokenSet;
use crate::persistence::token_store::TokenStore;
use crate::task_runner::PollTask;

/// Records whose parsed liquidity reaches `floor_usd`, in input order
pub fn apply_liquidity_floor(records: Vec<TokenRecord>, floor_usd: f64) -> Vec<TokenRecord> {
    records
        .into_iter()
        .filter(|record| {
            let liquidity = record.liquidity_usd();
            if liquidity < floor_usd {
                info!(
                    "Skipping token '{}' due to liquidity ${} < ${}",
                    record.name, liquidity, floor_usd
                );
                false
            } else {
                true
            }
        })
        .collect()
}

pub struct TokenMonitor {
    scraper: ListingScraper,
    store: TokenStore,
    known: KnownTokenSet,
    min_liquidity_usd: f64,
}

impl TokenMonitor {
    /// Build a monitor seeded with the persisted history
    pub async fn new(scraper: ListingScraper, store: TokenStore, min_liquidity_usd: f64) -> Self {
        let known = store.load_known().await;
        Self {
            scraper,
            store,
            known,
            min_liquidity_usd,
        }
    }

    pub fn known(&self) -> &KnownTokenSet {
        &self.known
    }

    /// Run one scan and return the tokens seen for the first time
    pub async fn poll_once(&mut self) -> Result<Vec<TokenRecord>, PipelineError> {
        let scanned = self
            .scraper
            .scan()
            .await?
            .into_iter()
            .map(|listing| listing.record)
            .collect();
        let liquid = apply_liquidity_floor(scanned, self.min_liquidity_usd);

        // Names only become known once the history holding them is on disk
        let mut known = self.known.clone();
        let fresh = known.filter_new(liquid);
        if fresh.is_empty() {
            return Ok(fresh);
        }

        self.store.save(&known).await?;
        self.known = known;

        info!("Detected {} new tokens", fresh.len());
        for record in &fresh {
            info!("\n{}", record);
        }
        info!("Added {} new tokens to the token store", fresh.len());

        Ok(fresh)
    }
}

#[async_trait]
impl PollTask for TokenMonitor {
    fn name(&self) -> &str {
        "token monitor"
    }

    async fn poll(&mut self) -> Result<(), PipelineError> {
        self.poll_once().await.map(|_| ())
    }
}
