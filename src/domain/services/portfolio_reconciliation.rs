//! Portfolio Reconciliation Service
//!
//! Values every simulated purchase at the live pair price and totals the
//! batch. Purchases that cannot be valued are skipped with a reason; the batch
//! never fails as a whole.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::entities::reconciliation_result::{
    ReconciliationBatch, ReconciliationResult, SkipReason, SkippedPurchase,
};
use crate::domain::entities::simulated_purchase::SimulatedPurchase;
use crate::domain::repositories::price_source::PriceSource;

/// Reconciles purchases one at a time, in ledger order
pub struct PortfolioReconciliationService {
    source: Arc<dyn PriceSource>,
}

impl PortfolioReconciliationService {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    pub async fn reconcile(&self, purchases: &[SimulatedPurchase]) -> ReconciliationBatch {
        let mut batch = ReconciliationBatch::default();

        for purchase in purchases {
            match self.reconcile_one(purchase).await {
                Ok(result) => {
                    batch.summary.record(&result);
                    batch.results.push(result);
                }
                Err(reason) => {
                    warn!("Skipping token '{}': {}", purchase.token_name, reason);
                    batch.skipped.push(SkippedPurchase {
                        token_name: purchase.token_name.clone(),
                        reason,
                    });
                }
            }
        }

        batch.summary.skipped = batch.skipped.len();
        batch
    }

    async fn reconcile_one(
        &self,
        purchase: &SimulatedPurchase,
    ) -> Result<ReconciliationResult, SkipReason> {
        if purchase.chain_id.trim().is_empty() {
            return Err(SkipReason::MissingChainId);
        }
        if !purchase.has_pair_hash() {
            return Err(SkipReason::MissingPairHash);
        }

        info!(
            "Retrieving {} data for '{}' on chain '{}' pair '{}'",
            self.source.name(),
            purchase.token_name,
            purchase.chain_id,
            purchase.pair_hash1
        );

        let snapshot = self
            .source
            .pair_snapshot(&purchase.chain_id, &purchase.pair_hash1)
            .await
            .map_err(|e| SkipReason::ApiError(e.to_string()))?
            .ok_or(SkipReason::PairNotFound)?;

        let current_price = snapshot.price_usd.ok_or(SkipReason::PriceUnavailable)?;

        Ok(ReconciliationResult::new(
            purchase.clone(),
            current_price,
            &snapshot,
            Utc::now(),
        ))
    }
}
