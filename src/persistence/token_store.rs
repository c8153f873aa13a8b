//! Token Store
//!
//! Persists the monitor's known-token history so restarts do not re-announce
//! tokens already seen.

use std::path::PathBuf;
use tracing::info;

use super::{JsonStore, StoreResult};
use crate::domain::entities::token_record::TokenRecord;
use crate::domain::services::dedup_tracker::KnownTokenSet;

pub struct TokenStore {
    store: JsonStore<TokenRecord>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    /// Rebuild the known set; an unreadable document starts from nothing
    pub async fn load_known(&self) -> KnownTokenSet {
        let records = self.store.load_or_default().await;
        let known = KnownTokenSet::from_records(records);
        info!(
            "Loaded {} known tokens from {}",
            known.len(),
            self.store.path().display()
        );
        known
    }

    /// Rewrite the full history
    pub async fn save(&self, known: &KnownTokenSet) -> StoreResult<()> {
        self.store.save(known.records()).await
    }
}
