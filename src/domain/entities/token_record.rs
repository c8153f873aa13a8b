use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::magnitude::parse_magnitude;
use crate::domain::value_objects::price::Price;

/// Sentinel for the fixed leading fields when the listing is too short
pub const NOT_AVAILABLE: &str = "N/A";

/// Fields of one listing description, in screen order.
///
/// Ephemeral: built from the element description and dropped after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawListing {
    tokens: Vec<String>,
}

impl RawListing {
    /// Split a description on the screen's `", "` delimiter.
    ///
    /// Thousands separators inside a value (`$1,234`) carry no space and survive.
    /// With `drop_placeholders`, empty and `?` fields are removed.
    pub fn from_description(description: &str, drop_placeholders: bool) -> Self {
        let tokens = description
            .split(", ")
            .map(|t| t.trim().to_string())
            .filter(|t| !drop_placeholders || (!t.is_empty() && t != "?"))
            .collect();
        RawListing { tokens }
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawListing {
            tokens: tokens.into_iter().map(|t| t.into().trim().to_string()).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Tagged metrics that trail a listing in arbitrary order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingTag {
    Liquidity,
    Volume,
    MarketCap,
}

impl ListingTag {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "LIQ" => Some(ListingTag::Liquidity),
            "VOL" => Some(ListingTag::Volume),
            "MCAP" => Some(ListingTag::MarketCap),
            _ => None,
        }
    }
}

/// Structured view of one scraped listing.
///
/// Fields missing from the source are empty strings, never absent.
/// The name is the permanent identity of the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub name: String,
    pub time: String,
    pub price: String,
    /// Digit string counting zeros elided from a sub-cent price, or empty
    #[serde(default)]
    pub price_adjustment: String,
    #[serde(default)]
    pub change_indicator: String,
    #[serde(default)]
    pub change: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub liquidity: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub market_cap: String,
    pub analyzed_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Record carrying only defaults
    pub fn empty(analyzed_at: DateTime<Utc>) -> Self {
        TokenRecord {
            name: NOT_AVAILABLE.to_string(),
            time: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            price_adjustment: String::new(),
            change_indicator: String::new(),
            change: String::new(),
            project_name: String::new(),
            liquidity: String::new(),
            volume: String::new(),
            market_cap: String::new(),
            analyzed_at,
        }
    }

    pub fn set_tag(&mut self, tag: ListingTag, value: &str) {
        let slot = match tag {
            ListingTag::Liquidity => &mut self.liquidity,
            ListingTag::Volume => &mut self.volume,
            ListingTag::MarketCap => &mut self.market_cap,
        };
        *slot = value.to_string();
    }

    /// Elided leading zeros, when the adjustment field holds digits
    pub fn adjustment_zeros(&self) -> Option<u32> {
        if !self.price_adjustment.is_empty()
            && self.price_adjustment.chars().all(|c| c.is_ascii_digit())
        {
            self.price_adjustment.parse().ok()
        } else {
            None
        }
    }

    /// Displayed price with the adjustment applied
    pub fn normalized_price(&self) -> Price {
        Price::from_display(&self.price, self.adjustment_zeros())
    }

    pub fn liquidity_usd(&self) -> f64 {
        parse_magnitude(&self.liquidity)
    }

    pub fn volume_usd(&self) -> f64 {
        parse_magnitude(&self.volume)
    }

    pub fn market_cap_usd(&self) -> f64 {
        parse_magnitude(&self.market_cap)
    }
}

impl fmt::Display for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Token Name: {}", self.name)?;
        writeln!(
            f,
            "Analyzed Date: {}",
            self.analyzed_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Time: {}", self.time)?;
        writeln!(f, "Price: {}", self.price)?;
        writeln!(f, "Price Adjustment: {}", self.price_adjustment)?;
        writeln!(f, "Change Indicator: {}", self.change_indicator)?;
        writeln!(f, "Change: {}", self.change)?;
        writeln!(f, "Project Name: {}", self.project_name)?;
        writeln!(f, "Liquidity: {}", self.liquidity)?;
        writeln!(f, "Volume: {}", self.volume)?;
        write!(f, "Market Cap: {}", self.market_cap)
    }
}
