//! Purchase Pipeline
//!
//! Opens each freshly scanned listing once, reads its chain and on-chain
//! identifiers from the detail page, and records a simulated purchase.

use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::listing_scraper::{ListingScraper, DESCRIPTION_ATTRIBUTE, LISTING_ROWS_XPATH};
use crate::domain::entities::simulated_purchase::{
    ExtractedHashes, ListingDetails, SimulatedPurchase,
};
use crate::domain::entities::token_record::TokenRecord;
use crate::domain::errors::PipelineError;
use crate::domain::repositories::screen_driver::{AutomationResult, ElementHandle, ScreenDriver};
use crate::domain::services::chain_resolver::ChainResolver;
use crate::domain::services::purchase_simulator::PurchaseSimulator;
use crate::persistence::purchase_ledger::PurchaseLedger;
use crate::persistence::StoreResult;

/// Clickable described elements on the detail page; one of them names the chain
pub const CHAIN_CANDIDATES_XPATH: &str =
    "//android.view.ViewGroup[@content-desc!='' and @clickable='true']";

/// Copy button that follows the `Pair` label
pub const PAIR_COPY_BUTTON_XPATH: &str = "//android.widget.TextView[@text=\"Pair\"]/following-sibling::android.view.ViewGroup//android.widget.TextView[@text=\"\"]";

/// Copy button that follows the token-name label
pub fn token_copy_button_xpath(token_name: &str) -> String {
    format!(
        "//android.widget.TextView[@text={}]/following-sibling::android.view.ViewGroup//android.widget.TextView[@text=\"\"]",
        xpath_literal(token_name)
    )
}

/// Quote `value` as an XPath 1.0 string literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Fractions of the window height used for vertical swipes
#[derive(Debug, Clone, Copy)]
struct SwipeSpan {
    from: f64,
    to: f64,
}

/// Scroll the listing screen without touching the bottom navigation bar
const LIST_SCROLL_DOWN: SwipeSpan = SwipeSpan { from: 0.5, to: 0.2 };
const LIST_SCROLL_UP: SwipeSpan = SwipeSpan { from: 0.2, to: 0.8 };
/// Reveal the address section of the detail page
const DETAIL_SCROLL_DOWN: SwipeSpan = SwipeSpan { from: 0.8, to: 0.2 };
const SWIPE_DURATION_MILLIS: u64 = 600;

/// Waits for the app between steps
#[derive(Debug, Clone)]
pub struct PurchaseTiming {
    pub detail_load: Duration,
    pub scroll_settle: Duration,
    pub copy_settle: Duration,
    pub back_settle: Duration,
}

impl Default for PurchaseTiming {
    fn default() -> Self {
        Self {
            detail_load: Duration::from_secs(5),
            scroll_settle: Duration::from_secs(2),
            copy_settle: Duration::from_secs(1),
            back_settle: Duration::from_secs(3),
        }
    }
}

impl PurchaseTiming {
    /// No waits, for scripted drivers
    pub fn immediate() -> Self {
        Self {
            detail_load: Duration::ZERO,
            scroll_settle: Duration::ZERO,
            copy_settle: Duration::ZERO,
            back_settle: Duration::ZERO,
        }
    }
}

/// Everything a purchase run recorded
#[derive(Debug, Clone, Default)]
pub struct PurchaseRun {
    pub details: Vec<ListingDetails>,
    pub purchases: Vec<SimulatedPurchase>,
}

pub struct PurchasePipeline {
    scraper: ListingScraper,
    resolver: ChainResolver,
    simulator: PurchaseSimulator,
    ledger: PurchaseLedger,
    timing: PurchaseTiming,
    /// Scroll attempts when looking for a row by name
    max_locate_scrolls: u32,
    /// Scroll-ups used to return to the top after a failed search
    max_top_scrolls: u32,
    seen: HashSet<String>,
    /// Everything recorded this session, as written to the ledger
    recorded: PurchaseRun,
}

impl PurchasePipeline {
    pub fn new(
        scraper: ListingScraper,
        resolver: ChainResolver,
        simulator: PurchaseSimulator,
        ledger: PurchaseLedger,
        timing: PurchaseTiming,
    ) -> Self {
        Self {
            scraper,
            resolver,
            simulator,
            ledger,
            timing,
            max_locate_scrolls: 5,
            max_top_scrolls: 10,
            seen: HashSet::new(),
            recorded: PurchaseRun::default(),
        }
    }

    fn driver(&self) -> &dyn ScreenDriver {
        self.scraper.driver().as_ref()
    }

    /// Scan once and record a purchase for every listing not yet handled this session.
    ///
    /// Returns this run's purchases. The ledger holds every purchase of the
    /// session: it is rewritten when the run recorded something, and also
    /// before a fatal automation error is propagated.
    pub async fn run(&mut self) -> Result<PurchaseRun, PipelineError> {
        let listings = self.scraper.scan().await?;
        let mut run = PurchaseRun::default();

        for listing in listings {
            let name = listing.record.name.clone();
            if !self.seen.insert(name.clone()) {
                debug!("Token '{}' already handled in this session", name);
                continue;
            }

            info!("Processing token: {}", name);
            match self.process(&listing.record).await {
                Ok(Some((details, purchase))) => {
                    info!(
                        "Simulated purchase for '{}': {} tokens at ${}",
                        purchase.token_name, purchase.tokens_purchased, purchase.purchase_price
                    );
                    run.details.push(details);
                    run.purchases.push(purchase);
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => {
                    error!("Fatal automation error while processing '{}': {}", name, e);
                    if let Err(store_error) = self.record(&run).await {
                        error!("Failed to flush purchases before exit: {}", store_error);
                    }
                    return Err(e.into());
                }
                Err(e) => warn!("Error processing token '{}': {}", name, e),
            }
        }

        if run.purchases.is_empty() {
            info!("No new listings to record, ledger left unchanged");
            return Ok(run);
        }
        self.record(&run).await?;
        Ok(run)
    }

    /// Add a run to the session ledger and rewrite both documents
    async fn record(&mut self, run: &PurchaseRun) -> StoreResult<()> {
        self.recorded.details.extend(run.details.iter().cloned());
        self.recorded.purchases.extend(run.purchases.iter().cloned());
        self.ledger
            .save(&self.recorded.details, &self.recorded.purchases)
            .await
    }

    async fn process(
        &self,
        record: &TokenRecord,
    ) -> AutomationResult<Option<(ListingDetails, SimulatedPurchase)>> {
        let Some(row) = self.locate(&record.name).await? else {
            warn!("Token '{}' not found after scrolling, skipping", record.name);
            self.scroll_to_top().await;
            return Ok(None);
        };

        self.driver().click(&row).await?;
        sleep(self.timing.detail_load).await;

        let blockchain_name = self.detect_chain_name().await?;
        let chain_id = self.resolver.resolve(&blockchain_name);
        if chain_id.is_empty() {
            warn!("Could not map blockchain name '{}' to a chain id", blockchain_name);
        } else {
            info!("Mapped blockchain name '{}' to chain id '{}'", blockchain_name, chain_id);
        }

        let hashes = self.copy_hashes(&record.name).await?;
        let purchase = self
            .simulator
            .simulate(record, &chain_id, &hashes, Utc::now());

        let details = ListingDetails {
            record: record.clone(),
            blockchain_name,
            chain_id,
            pair_hash1: purchase.pair_hash1.clone(),
            pair_hash2: purchase.pair_hash2.clone(),
        };

        self.driver().back().await?;
        sleep(self.timing.back_settle).await;

        Ok(Some((details, purchase)))
    }

    /// Find the listing row whose description mentions `name`, scrolling down between attempts
    async fn locate(&self, name: &str) -> AutomationResult<Option<ElementHandle>> {
        for attempt in 1..=self.max_locate_scrolls {
            for element in self.driver().find_elements(LISTING_ROWS_XPATH).await? {
                match self.driver().attribute(&element, DESCRIPTION_ATTRIBUTE).await {
                    Ok(Some(description)) if description.contains(name) => {
                        debug!("Token '{}' found on attempt {}", name, attempt);
                        return Ok(Some(element));
                    }
                    Ok(_) => {}
                    Err(e) if e.is_transient() => {
                        warn!("Stale row while searching for '{}': {}", name, e);
                    }
                    Err(e) => return Err(e),
                }
            }

            debug!("Token '{}' not visible, scrolling down (attempt {})", name, attempt);
            self.swipe_or_warn(LIST_SCROLL_DOWN).await?;
            sleep(self.timing.scroll_settle).await;
        }
        Ok(None)
    }

    async fn scroll_to_top(&self) {
        for _ in 0..self.max_top_scrolls {
            if let Err(e) = self.swipe(LIST_SCROLL_UP).await {
                warn!("Error while scrolling back to the top: {}", e);
                return;
            }
        }
    }

    /// First clickable description the resolver knows; empty when none does.
    ///
    /// Only a lost session is an error: the purchase is still recorded with an
    /// empty chain when the page cannot be read.
    async fn detect_chain_name(&self) -> AutomationResult<String> {
        let elements = match self.driver().find_elements(CHAIN_CANDIDATES_XPATH).await {
            Ok(elements) => elements,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Error reading blockchain name candidates: {}", e);
                return Ok(String::new());
            }
        };

        let mut descriptions = Vec::with_capacity(elements.len());
        for element in &elements {
            match self.driver().attribute(element, DESCRIPTION_ATTRIBUTE).await {
                Ok(Some(description)) => descriptions.push(description),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("Skipping unreadable chain candidate: {}", e),
            }
        }

        match self
            .resolver
            .find_chain_name(descriptions.iter().map(String::as_str))
        {
            Some(name) => {
                info!("Blockchain name found: '{}'", name);
                Ok(name.to_string())
            }
            None => {
                warn!("Blockchain name not found among {} candidates", descriptions.len());
                Ok(String::new())
            }
        }
    }

    /// Copy the pair and token addresses through the clipboard
    async fn copy_hashes(&self, token_name: &str) -> AutomationResult<ExtractedHashes> {
        self.swipe_or_warn(DETAIL_SCROLL_DOWN).await?;
        sleep(self.timing.scroll_settle).await;

        let pair = self.copy_via_clipboard(PAIR_COPY_BUTTON_XPATH, "pair").await?;
        let token = self
            .copy_via_clipboard(&token_copy_button_xpath(token_name), "token")
            .await?;

        Ok(ExtractedHashes { pair, token })
    }

    /// Click the first element matching `xpath` and read what it copied
    async fn copy_via_clipboard(
        &self,
        xpath: &str,
        label: &str,
    ) -> AutomationResult<Option<String>> {
        if let Err(e) = self.driver().set_clipboard_text("").await {
            if e.is_fatal() {
                return Err(e);
            }
            warn!("Error while clearing clipboard: {}", e);
        }

        let button = match self.driver().find_elements(xpath).await {
            Ok(buttons) => buttons.into_iter().next(),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Error locating {} copy button: {}", label, e);
                None
            }
        };
        let Some(button) = button else {
            warn!("{} copy button not found", label);
            return Ok(None);
        };

        let copied = async {
            self.driver().click(&button).await?;
            sleep(self.timing.copy_settle).await;
            self.driver().clipboard_text().await
        }
        .await;

        match copied {
            Ok(text) if !text.trim().is_empty() => {
                info!("{} hash retrieved from clipboard: {}", label, text.trim());
                Ok(Some(text.trim().to_string()))
            }
            Ok(_) => {
                warn!("Clipboard empty after copying the {} hash", label);
                Ok(None)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Error copying the {} hash: {}", label, e);
                Ok(None)
            }
        }
    }

    async fn swipe(&self, span: SwipeSpan) -> AutomationResult<()> {
        let window = self.driver().window_rect().await?;
        let x = window.width / 2;
        let from_y = (window.height as f64 * span.from) as i64;
        let to_y = (window.height as f64 * span.to) as i64;
        self.driver()
            .swipe((x, from_y), (x, to_y), SWIPE_DURATION_MILLIS)
            .await
    }

    /// Swipe, tolerating anything but a lost session
    async fn swipe_or_warn(&self, span: SwipeSpan) -> AutomationResult<()> {
        match self.swipe(span).await {
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Error during scrolling: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}
