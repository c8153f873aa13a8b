//! Persistence Layer
//!
//! JSON document stores for scanned tokens, simulated purchases, listing
//! details and reconciliation results. Every document is a pretty-printed
//! JSON array rewritten in full on each save.
//!
//! # Documents
//! - `tokens_data.json`: every token ever recorded by the monitor
//! - `simulated_purchases.json`: the purchase ledger
//! - `pair_hash.json`: listing record plus chain and copied hashes
//! - `purchase_results.json`: reconciliation output

pub mod purchase_ledger;
pub mod token_store;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::entities::reconciliation_result::ReconciliationResult;
use crate::domain::errors::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// A JSON array of `T` kept in one file
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry; a missing file is an empty store
    pub async fn load(&self) -> StoreResult<Vec<T>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let entries: Vec<T> = serde_json::from_slice(&bytes)?;
                debug!("Loaded {} entries from {}", entries.len(), self.path.display());
                Ok(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but an unreadable document starts over empty
    pub async fn load_or_default(&self) -> Vec<T> {
        match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Could not read {}: {}, starting with an empty store",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace the document with `entries`
    pub async fn save(&self, entries: &[T]) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(entries)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write then rename so a crash never leaves a truncated document
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!("Saved {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

/// Reconciliation output document
pub type ResultsStore = JsonStore<ReconciliationResult>;
