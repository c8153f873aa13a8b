use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token_record::TokenRecord;

pub const PAIR_HASH_UNAVAILABLE: &str = "First hash not available";
pub const TOKEN_HASH_UNAVAILABLE: &str = "Second hash not available";

/// On-chain identifiers copied from a listing's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedHashes {
    pub pair: Option<String>,
    pub token: Option<String>,
}

impl ExtractedHashes {
    /// Pair and token hashes, with sentinels standing in for failed copies
    pub fn or_sentinels(&self) -> (String, String) {
        let pick = |value: &Option<String>, sentinel: &str| match value {
            Some(hash) if !hash.trim().is_empty() => hash.trim().to_string(),
            _ => sentinel.to_string(),
        };
        (
            pick(&self.pair, PAIR_HASH_UNAVAILABLE),
            pick(&self.token, TOKEN_HASH_UNAVAILABLE),
        )
    }
}

/// Synthetic purchase of a fixed notional of one listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedPurchase {
    pub token_name: String,
    /// Price API chain id; empty when the chain could not be mapped
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub pair_hash1: String,
    #[serde(default)]
    pub pair_hash2: String,
    pub purchase_price: f64,
    pub purchase_amount_usd: f64,
    pub tokens_purchased: f64,
    pub purchase_date: DateTime<Utc>,
}

impl SimulatedPurchase {
    /// Whether the pair hash can key a price lookup
    pub fn has_pair_hash(&self) -> bool {
        let hash = self.pair_hash1.trim();
        !hash.is_empty() && hash != PAIR_HASH_UNAVAILABLE
    }
}

/// Listing as recorded by a purchase run: the scraped record plus what the
/// detail page revealed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetails {
    #[serde(flatten)]
    pub record: TokenRecord,
    #[serde(default)]
    pub blockchain_name: String,
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub pair_hash1: String,
    #[serde(default)]
    pub pair_hash2: String,
}
