//! Reconciliation Runner
//!
//! Loads the purchase ledger, values it against live prices, logs the report
//! and writes the results document.

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::entities::reconciliation_result::ReconciliationBatch;
use crate::domain::errors::PipelineError;
use crate::domain::repositories::price_source::PriceSource;
use crate::domain::services::portfolio_reconciliation::PortfolioReconciliationService;
use crate::persistence::purchase_ledger::PurchaseLedger;
use crate::persistence::ResultsStore;

pub struct ReconciliationRunner {
    service: PortfolioReconciliationService,
    ledger: PurchaseLedger,
    results: ResultsStore,
}

impl ReconciliationRunner {
    pub fn new(
        source: Arc<dyn PriceSource>,
        ledger: PurchaseLedger,
        results: ResultsStore,
    ) -> Self {
        Self {
            service: PortfolioReconciliationService::new(source),
            ledger,
            results,
        }
    }

    /// Reconcile the whole ledger.
    ///
    /// An unreadable ledger reconciles nothing. The results document is only
    /// written when at least one purchase was valued.
    pub async fn run(&self) -> Result<ReconciliationBatch, PipelineError> {
        let purchases = match self.ledger.load_purchases().await {
            Ok(purchases) => purchases,
            Err(e) => {
                error!("Error loading simulated purchases: {}", e);
                return Ok(ReconciliationBatch::default());
            }
        };
        info!("Reconciling {} simulated purchases", purchases.len());

        let batch = self.service.reconcile(&purchases).await;

        for result in &batch.results {
            info!("\n{}", result);
        }
        info!("\n{}", batch.summary);

        if batch.results.is_empty() {
            info!("No purchase could be reconciled, results not written");
        } else {
            self.results.save(&batch.results).await?;
        }

        Ok(batch)
    }
}
