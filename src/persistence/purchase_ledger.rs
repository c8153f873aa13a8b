//! Purchase Ledger
//!
//! The documents written by a purchase run: the simulated purchases and the
//! listing details behind them. Both are always written together.

use std::path::PathBuf;

use super::{JsonStore, StoreResult};
use crate::domain::entities::simulated_purchase::{ListingDetails, SimulatedPurchase};

pub struct PurchaseLedger {
    purchases: JsonStore<SimulatedPurchase>,
    details: JsonStore<ListingDetails>,
}

impl PurchaseLedger {
    pub fn new(purchases_path: impl Into<PathBuf>, details_path: impl Into<PathBuf>) -> Self {
        Self {
            purchases: JsonStore::new(purchases_path),
            details: JsonStore::new(details_path),
        }
    }

    /// Recorded purchases; a missing ledger is empty
    pub async fn load_purchases(&self) -> StoreResult<Vec<SimulatedPurchase>> {
        self.purchases.load().await
    }

    pub async fn load_details(&self) -> StoreResult<Vec<ListingDetails>> {
        self.details.load().await
    }

    pub async fn save(
        &self,
        details: &[ListingDetails],
        purchases: &[SimulatedPurchase],
    ) -> StoreResult<()> {
        self.details.save(details).await?;
        self.purchases.save(purchases).await
    }
}
