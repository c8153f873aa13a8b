//! Listing Parser
//!
//! Turns the comma-delimited description of one listing row into a [`TokenRecord`].
//!
//! Layout, in screen order:
//! - name, age, displayed price (fixed slots 0-2)
//! - optional elided-zero count (slot 3, digits only)
//! - change indicator, change value, project name
//! - `(tag, value)` pairs: `LIQ`, `VOL`, `MCAP`; other tags are dropped
//!
//! Short input never fails: missing fields keep their defaults.

use chrono::{DateTime, Utc};

use crate::domain::entities::token_record::{ListingTag, RawListing, TokenRecord};

/// Index of the only slot that may hold the elided-zero count
const ADJUSTMENT_SLOT: usize = 3;

/// How slot 3 is read when it holds digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjustmentPolicy {
    /// Digits at slot 3 are the adjustment; every later field moves one slot right
    #[default]
    Positional,
    /// Slot 3 is always the change indicator
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Drop empty and `?` fields before reading positions
    pub drop_placeholders: bool,
    pub adjustment: AdjustmentPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            drop_placeholders: true,
            adjustment: AdjustmentPolicy::Positional,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingParser {
    config: ParserConfig,
}

impl ListingParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Split and parse an element description
    pub fn parse_description(&self, description: &str, analyzed_at: DateTime<Utc>) -> TokenRecord {
        let listing = RawListing::from_description(description, self.config.drop_placeholders);
        self.parse(&listing, analyzed_at)
    }

    pub fn parse(&self, listing: &RawListing, analyzed_at: DateTime<Utc>) -> TokenRecord {
        let mut record = TokenRecord::empty(analyzed_at);

        if let Some(name) = listing.get(0) {
            record.name = name.to_string();
        }
        if let Some(time) = listing.get(1) {
            record.time = time.to_string();
        }
        if let Some(price) = listing.get(2) {
            record.price = price.to_string();
        }

        let mut index = ADJUSTMENT_SLOT;
        if self.config.adjustment == AdjustmentPolicy::Positional {
            if let Some(token) = listing.get(index).filter(|t| is_digit_string(t)) {
                record.price_adjustment = token.to_string();
                index += 1;
            }
        }

        // Positional fields stop at the first tag so a row missing its
        // change columns still yields its metrics.
        for slot in [
            &mut record.change_indicator,
            &mut record.change,
            &mut record.project_name,
        ] {
            match listing.get(index) {
                Some(token) if ListingTag::parse(token).is_none() => {
                    *slot = token.to_string();
                    index += 1;
                }
                _ => break,
            }
        }

        while let Some(key) = listing.get(index) {
            let Some(value) = listing.get(index + 1) else {
                break;
            };
            if let Some(tag) = ListingTag::parse(key) {
                record.set_tag(tag, value);
            }
            index += 2;
        }

        record
    }
}

fn is_digit_string(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}
