use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::entities::simulated_purchase::{ExtractedHashes, SimulatedPurchase};
use crate::domain::entities::token_record::TokenRecord;

/// Default notional spent per simulated purchase (USD)
pub const DEFAULT_PURCHASE_AMOUNT_USD: f64 = 1.0;

/// Builds synthetic purchases of a fixed notional
#[derive(Debug, Clone)]
pub struct PurchaseSimulator {
    amount_usd: f64,
}

impl PurchaseSimulator {
    pub fn new(amount_usd: f64) -> Self {
        Self { amount_usd }
    }

    pub fn amount_usd(&self) -> f64 {
        self.amount_usd
    }

    /// Simulate buying `record` at its adjusted displayed price.
    ///
    /// Always yields a purchase: an empty chain id or failed hash copies are
    /// carried into the record so reconciliation can report them per token.
    pub fn simulate(
        &self,
        record: &TokenRecord,
        chain_id: &str,
        hashes: &ExtractedHashes,
        purchase_date: DateTime<Utc>,
    ) -> SimulatedPurchase {
        let price = record.normalized_price();
        match record.adjustment_zeros() {
            Some(zeros) => info!(
                "Adjusted price for '{}' with {} missing zeros: {}",
                record.name,
                zeros,
                price.value()
            ),
            None => info!("No price adjustment needed for '{}'", record.name),
        }

        if chain_id.is_empty() {
            warn!(
                "Purchase of '{}' has no chain id and cannot be reconciled",
                record.name
            );
        }

        let (pair_hash1, pair_hash2) = hashes.or_sentinels();

        SimulatedPurchase {
            token_name: record.name.clone(),
            chain_id: chain_id.to_string(),
            pair_hash1,
            pair_hash2,
            purchase_price: price.value(),
            purchase_amount_usd: self.amount_usd,
            tokens_purchased: price.units_for(self.amount_usd),
            purchase_date,
        }
    }
}

impl Default for PurchaseSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_PURCHASE_AMOUNT_USD)
    }
}
