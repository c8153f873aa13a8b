//! In-memory collaborators shared by the end-to-end tests
#![allow(dead_code)]

use async_trait::async_trait;
use dexscout::application::listing_scraper::LISTING_ROWS_XPATH;
use dexscout::application::purchase_pipeline::{
    token_copy_button_xpath, CHAIN_CANDIDATES_XPATH, PAIR_COPY_BUTTON_XPATH,
};
use dexscout::domain::entities::reconciliation_result::PairSnapshot;
use dexscout::domain::errors::{AutomationError, PriceApiError};
use dexscout::domain::repositories::price_source::{PriceResult, PriceSource};
use dexscout::domain::repositories::screen_driver::{
    AutomationResult, ElementHandle, Rect, ScreenDriver,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// What a listing's detail page shows
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    /// Descriptions of clickable elements, in document order
    pub chain_candidates: Vec<String>,
    pub pair_hash: Option<String>,
    pub token_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Listings,
    Detail(String),
}

#[derive(Debug)]
struct ScreenState {
    rows: Vec<String>,
    details: HashMap<String, DetailPage>,
    page: Page,
    clipboard: String,
    stale_scans: u32,
    stale_row_reads: HashMap<usize, u32>,
    lost_on_open: Option<String>,
    broken_chain_query: bool,
    session_lost: bool,
    scans: u32,
    swipes: u32,
    backs: u32,
}

/// Scripted screen: a listing page of described rows, each opening a detail page
pub struct MockScreen {
    state: Mutex<ScreenState>,
}

fn token_name_of(description: &str) -> String {
    description.split(", ").next().unwrap_or_default().to_string()
}

impl MockScreen {
    pub fn new(rows: &[&str]) -> Self {
        Self {
            state: Mutex::new(ScreenState {
                rows: rows.iter().map(|r| r.to_string()).collect(),
                details: HashMap::new(),
                page: Page::Listings,
                clipboard: String::new(),
                stale_scans: 0,
                stale_row_reads: HashMap::new(),
                lost_on_open: None,
                broken_chain_query: false,
                session_lost: false,
                scans: 0,
                swipes: 0,
                backs: 0,
            }),
        }
    }

    pub fn with_detail(self, token_name: &str, page: DetailPage) -> Self {
        self.state
            .lock()
            .unwrap()
            .details
            .insert(token_name.to_string(), page);
        self
    }

    /// The next `count` listing queries fail as stale
    pub fn with_stale_scans(self, count: u32) -> Self {
        self.state.lock().unwrap().stale_scans = count;
        self
    }

    /// Reading row `index` fails as stale `count` times
    pub fn with_stale_row(self, index: usize, count: u32) -> Self {
        self.state.lock().unwrap().stale_row_reads.insert(index, count);
        self
    }

    /// Opening this token's row kills the session
    pub fn losing_session_on(self, token_name: &str) -> Self {
        self.state.lock().unwrap().lost_on_open = Some(token_name.to_string());
        self
    }

    /// The chain candidate query on every detail page fails with a protocol error
    pub fn with_broken_chain_query(self) -> Self {
        self.state.lock().unwrap().broken_chain_query = true;
        self
    }

    pub fn set_rows(&self, rows: &[&str]) {
        self.state.lock().unwrap().rows = rows.iter().map(|r| r.to_string()).collect();
    }

    pub fn scans(&self) -> u32 {
        self.state.lock().unwrap().scans
    }

    pub fn backs(&self) -> u32 {
        self.state.lock().unwrap().backs
    }

    pub fn swipes(&self) -> u32 {
        self.state.lock().unwrap().swipes
    }

    pub fn on_listing_page(&self) -> bool {
        self.state.lock().unwrap().page == Page::Listings
    }
}

fn check_session(state: &ScreenState) -> AutomationResult<()> {
    if state.session_lost {
        Err(AutomationError::SessionLost("session terminated".into()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl ScreenDriver for MockScreen {
    async fn find_elements(&self, xpath: &str) -> AutomationResult<Vec<ElementHandle>> {
        let mut state = self.state.lock().unwrap();
        check_session(&state)?;

        let page = state.page.clone();
        match page {
            Page::Listings if xpath == LISTING_ROWS_XPATH => {
                state.scans += 1;
                if state.stale_scans > 0 {
                    state.stale_scans -= 1;
                    return Err(AutomationError::StaleElement("listing container".into()));
                }
                Ok((0..state.rows.len())
                    .map(|i| ElementHandle(format!("row-{}", i)))
                    .collect())
            }
            Page::Detail(name) => {
                let detail = state.details.get(&name).cloned().unwrap_or_default();
                if xpath == CHAIN_CANDIDATES_XPATH && state.broken_chain_query {
                    Err(AutomationError::Protocol("unknown server-side error".into()))
                } else if xpath == CHAIN_CANDIDATES_XPATH {
                    Ok((0..detail.chain_candidates.len())
                        .map(|i| ElementHandle(format!("chain-{}", i)))
                        .collect())
                } else if xpath == PAIR_COPY_BUTTON_XPATH {
                    Ok(detail
                        .pair_hash
                        .map(|_| vec![ElementHandle("pair-copy".into())])
                        .unwrap_or_default())
                } else if xpath == token_copy_button_xpath(&name) {
                    Ok(detail
                        .token_hash
                        .map(|_| vec![ElementHandle("token-copy".into())])
                        .unwrap_or_default())
                } else {
                    Ok(Vec::new())
                }
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> AutomationResult<Option<String>> {
        let mut state = self.state.lock().unwrap();
        check_session(&state)?;
        if name != "content-desc" {
            return Ok(None);
        }

        if let Some(index) = element.0.strip_prefix("row-").and_then(|i| i.parse::<usize>().ok()) {
            if let Some(remaining) = state.stale_row_reads.get_mut(&index) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(AutomationError::StaleElement(element.0.clone()));
                }
            }
            return Ok(state.rows.get(index).cloned());
        }

        if let Some(index) = element
            .0
            .strip_prefix("chain-")
            .and_then(|i| i.parse::<usize>().ok())
        {
            if let Page::Detail(token) = &state.page {
                return Ok(state
                    .details
                    .get(token)
                    .and_then(|d| d.chain_candidates.get(index).cloned()));
            }
        }
        Err(AutomationError::NoSuchElement(element.0.clone()))
    }

    async fn click(&self, element: &ElementHandle) -> AutomationResult<()> {
        let mut state = self.state.lock().unwrap();
        check_session(&state)?;

        if let Some(index) = element.0.strip_prefix("row-").and_then(|i| i.parse::<usize>().ok()) {
            let description = state
                .rows
                .get(index)
                .cloned()
                .ok_or_else(|| AutomationError::NoSuchElement(element.0.clone()))?;
            let token = token_name_of(&description);
            if state.lost_on_open.as_deref() == Some(token.as_str()) {
                state.session_lost = true;
                return Err(AutomationError::SessionLost("device disconnected".into()));
            }
            state.page = Page::Detail(token);
            return Ok(());
        }

        let Page::Detail(token) = state.page.clone() else {
            return Err(AutomationError::NoSuchElement(element.0.clone()));
        };
        let detail = state.details.get(&token).cloned().unwrap_or_default();
        match element.0.as_str() {
            "pair-copy" => state.clipboard = detail.pair_hash.unwrap_or_default(),
            "token-copy" => state.clipboard = detail.token_hash.unwrap_or_default(),
            _ => {}
        }
        Ok(())
    }

    async fn window_rect(&self) -> AutomationResult<Rect> {
        check_session(&self.state.lock().unwrap())?;
        Ok(Rect {
            x: 0,
            y: 0,
            width: 1080,
            height: 2400,
        })
    }

    async fn swipe(
        &self,
        _from: (i64, i64),
        _to: (i64, i64),
        _duration_millis: u64,
    ) -> AutomationResult<()> {
        let mut state = self.state.lock().unwrap();
        check_session(&state)?;
        state.swipes += 1;
        Ok(())
    }

    async fn clipboard_text(&self) -> AutomationResult<String> {
        let state = self.state.lock().unwrap();
        check_session(&state)?;
        Ok(state.clipboard.clone())
    }

    async fn set_clipboard_text(&self, text: &str) -> AutomationResult<()> {
        let mut state = self.state.lock().unwrap();
        check_session(&state)?;
        state.clipboard = text.to_string();
        Ok(())
    }

    async fn back(&self) -> AutomationResult<()> {
        let mut state = self.state.lock().unwrap();
        check_session(&state)?;
        state.page = Page::Listings;
        state.backs += 1;
        Ok(())
    }
}

/// Price source answering from a fixed table keyed by pair address
pub struct StaticPriceSource {
    quotes: HashMap<String, PriceResult<Option<PairSnapshot>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_price(mut self, pair: &str, price_usd: f64) -> Self {
        self.quotes.insert(
            pair.to_string(),
            Ok(Some(PairSnapshot {
                price_usd: Some(price_usd),
                liquidity_usd: 25_000.0,
                fdv: Some(1_000_000.0),
                volume_24h: 50_000.0,
                buys_24h: 300,
                sells_24h: 200,
            })),
        );
        self
    }

    pub fn with_response(
        mut self,
        pair: &str,
        response: PriceResult<Option<PairSnapshot>>,
    ) -> Self {
        self.quotes.insert(pair.to_string(), response);
        self
    }

    /// `(chain id, pair address)` of every lookup, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn pair_snapshot(
        &self,
        chain_id: &str,
        pair_address: &str,
    ) -> PriceResult<Option<PairSnapshot>> {
        self.calls
            .lock()
            .unwrap()
            .push((chain_id.to_string(), pair_address.to_string()));
        self.quotes
            .get(pair_address)
            .cloned()
            .unwrap_or_else(|| {
                Err(PriceApiError::Status {
                    status: 404,
                    body: "not found".into(),
                })
            })
    }
}
