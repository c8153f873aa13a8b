//! Dedup tracker: emits each token name at most once.

use std::collections::HashSet;
use tracing::debug;

use crate::domain::entities::token_record::TokenRecord;

/// Token names already emitted, plus the records that introduced them.
///
/// Grows monotonically. Names are compared exactly (case and whitespace matter).
#[derive(Debug, Clone, Default)]
pub struct KnownTokenSet {
    names: HashSet<String>,
    records: Vec<TokenRecord>,
}

impl KnownTokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted record list
    pub fn from_records(records: Vec<TokenRecord>) -> Self {
        let names = records.iter().map(|r| r.name.clone()).collect();
        Self { names, records }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every record ever emitted, in emission order
    pub fn records(&self) -> &[TokenRecord] {
        &self.records
    }

    /// Keep only records whose name has never been seen, in scrape order.
    ///
    /// The kept names join the set and the kept records are appended to the
    /// history. A name repeated within the batch is emitted once.
    pub fn filter_new(&mut self, batch: Vec<TokenRecord>) -> Vec<TokenRecord> {
        let mut fresh = Vec::new();
        for record in batch {
            if self.names.insert(record.name.clone()) {
                fresh.push(record);
            } else {
                debug!("Token '{}' already known, skipping", record.name);
            }
        }
        self.records.extend(fresh.iter().cloned());
        fresh
    }
}
