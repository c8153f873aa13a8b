//! Listing Scraper
//!
//! Reads the listing rows currently on screen and parses each into a
//! [`TokenRecord`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::entities::token_record::TokenRecord;
use crate::domain::repositories::screen_driver::{AutomationResult, ElementHandle, ScreenDriver};
use crate::domain::services::listing_parser::ListingParser;
use crate::task_runner::retry_transient;

/// Every element that carries an accessibility description
pub const LISTING_ROWS_XPATH: &str = "//android.view.ViewGroup[@content-desc]";

/// Section headers share the row locator and are never listings
pub const HEADER_KEYWORDS: [&str; 3] = ["Trending", "Moonshot", "Newest"];

pub const DESCRIPTION_ATTRIBUTE: &str = "content-desc";

/// A stale row is read once more before it is skipped
const ROW_READ_ATTEMPTS: u32 = 2;

/// A parsed listing and the row it came from
#[derive(Debug, Clone)]
pub struct ScrapedListing {
    pub element: ElementHandle,
    pub record: TokenRecord,
}

pub fn is_header(description: &str) -> bool {
    HEADER_KEYWORDS.iter().any(|k| description.contains(k))
}

pub struct ListingScraper {
    driver: Arc<dyn ScreenDriver>,
    parser: ListingParser,
    max_listings: usize,
    max_attempts: u32,
}

impl ListingScraper {
    pub fn new(
        driver: Arc<dyn ScreenDriver>,
        parser: ListingParser,
        max_listings: usize,
        max_attempts: u32,
    ) -> Self {
        Self {
            driver,
            parser,
            max_listings,
            max_attempts,
        }
    }

    pub fn driver(&self) -> &Arc<dyn ScreenDriver> {
        &self.driver
    }

    /// Scan the visible rows, retrying the whole scan while the query itself goes stale
    pub async fn scan(&self) -> AutomationResult<Vec<ScrapedListing>> {
        let listings =
            retry_transient("listing scan", self.max_attempts, || self.scan_once()).await?;
        info!("Scanned {} listings", listings.len());
        Ok(listings)
    }

    async fn scan_once(&self) -> AutomationResult<Vec<ScrapedListing>> {
        let elements = self.driver.find_elements(LISTING_ROWS_XPATH).await?;
        debug!("Found {} described elements", elements.len());

        let mut listings = Vec::new();
        for element in elements {
            let read = retry_transient("row description", ROW_READ_ATTEMPTS, || {
                self.driver.attribute(&element, DESCRIPTION_ATTRIBUTE)
            });
            let description = match read.await {
                Ok(Some(description)) => description,
                Ok(None) => continue,
                Err(e) if e.is_transient() => {
                    warn!("Row went stale while reading it, skipping: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if description.trim().is_empty() || is_header(&description) {
                continue;
            }

            let record = self.parser.parse_description(&description, Utc::now());
            listings.push(ScrapedListing { element, record });

            if listings.len() >= self.max_listings {
                break;
            }
        }

        Ok(listings)
    }
}
