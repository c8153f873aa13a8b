//! Price Source Trait
//!
//! Live pair quotes keyed by `(chain id, pair address)`. The reconciliation
//! engine only sees this trait, so tests can substitute canned snapshots.

use crate::domain::entities::reconciliation_result::PairSnapshot;
use crate::domain::errors::PriceApiError;
use async_trait::async_trait;

pub type PriceResult<T> = Result<T, PriceApiError>;

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Current snapshot of a pair, or `None` when the API knows no such pair
    async fn pair_snapshot(
        &self,
        chain_id: &str,
        pair_address: &str,
    ) -> PriceResult<Option<PairSnapshot>>;
}
