use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::simulated_purchase::SimulatedPurchase;
use crate::domain::value_objects::pnl::PnL;

/// Live market data for one pair, as reported by the price API.
///
/// Missing numeric fields read as zero; a missing FDV stays absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairSnapshot {
    /// `None` when the API reported no usable price
    pub price_usd: Option<f64>,
    pub liquidity_usd: f64,
    pub fdv: Option<f64>,
    pub volume_24h: f64,
    pub buys_24h: u64,
    pub sells_24h: u64,
}

/// A simulated purchase valued at the current price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    #[serde(flatten)]
    pub purchase: SimulatedPurchase,
    pub current_price: f64,
    pub current_value: f64,
    pub profit_loss_amount: f64,
    pub profit_loss_percent: f64,
    pub liquidity_usd: f64,
    /// Fully diluted valuation; null when the API has none
    pub fdv: Option<f64>,
    pub volume_24h: f64,
    pub txns_24h: u64,
    pub buys_24h: u64,
    pub sells_24h: u64,
    pub last_updated: DateTime<Utc>,
}

impl ReconciliationResult {
    pub fn new(
        purchase: SimulatedPurchase,
        current_price: f64,
        snapshot: &PairSnapshot,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let current_value = purchase.tokens_purchased * current_price;
        let pnl = PnL::compute(current_value, purchase.purchase_amount_usd);

        ReconciliationResult {
            purchase,
            current_price,
            current_value,
            profit_loss_amount: pnl.amount(),
            profit_loss_percent: pnl.percent(),
            liquidity_usd: snapshot.liquidity_usd,
            fdv: snapshot.fdv,
            volume_24h: snapshot.volume_24h,
            txns_24h: snapshot.buys_24h + snapshot.sells_24h,
            buys_24h: snapshot.buys_24h,
            sells_24h: snapshot.sells_24h,
            last_updated,
        }
    }

    pub fn pnl(&self) -> PnL {
        PnL::compute(self.current_value, self.purchase.purchase_amount_usd)
    }
}

impl fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Results for token '{}' ---", self.purchase.token_name)?;
        writeln!(
            f,
            "Purchased on: {}",
            self.purchase.purchase_date.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Purchase price: ${}", self.purchase.purchase_price)?;
        writeln!(f, "Current price: ${}", self.current_price)?;
        writeln!(f, "Amount invested: ${}", self.purchase.purchase_amount_usd)?;
        writeln!(f, "Current value: ${:.4}", self.current_value)?;
        writeln!(f, "{}", self.pnl())?;
        writeln!(f, "Liquidity (USD): ${}", self.liquidity_usd)?;
        match self.fdv {
            Some(fdv) => writeln!(f, "Market Cap (FDV): {}", fdv)?,
            None => writeln!(f, "Market Cap (FDV): N/A")?,
        }
        writeln!(f, "Volume 24h: ${}", self.volume_24h)?;
        write!(
            f,
            "Transactions 24h: {} (buys: {}, sells: {})",
            self.txns_24h, self.buys_24h, self.sells_24h
        )
    }
}

/// Why a purchase was left out of a reconciliation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    MissingChainId,
    MissingPairHash,
    ApiError(String),
    PairNotFound,
    PriceUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingChainId => write!(f, "missing chain id"),
            SkipReason::MissingPairHash => write!(f, "missing pair hash"),
            SkipReason::ApiError(msg) => write!(f, "price API error: {}", msg),
            SkipReason::PairNotFound => write!(f, "pair not found"),
            SkipReason::PriceUnavailable => write!(f, "current price unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPurchase {
    pub token_name: String,
    pub reason: SkipReason,
}

/// Totals across every reconciled purchase of a batch
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_invested: f64,
    pub total_current_value: f64,
    pub reconciled: usize,
    pub skipped: usize,
}

impl PortfolioSummary {
    pub fn record(&mut self, result: &ReconciliationResult) {
        self.total_invested += result.purchase.purchase_amount_usd;
        self.total_current_value += result.current_value;
        self.reconciled += 1;
    }

    pub fn pnl(&self) -> PnL {
        PnL::compute(self.total_current_value, self.total_invested)
    }

    pub fn total_profit_loss(&self) -> f64 {
        self.pnl().amount()
    }

    pub fn total_profit_loss_percent(&self) -> f64 {
        self.pnl().percent()
    }
}

impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Totals ===")?;
        writeln!(f, "Total invested: ${}", self.total_invested)?;
        writeln!(f, "Total current value: ${:.4}", self.total_current_value)?;
        writeln!(f, "Total {}", self.pnl())?;
        write!(
            f,
            "Reconciled: {}, skipped: {}",
            self.reconciled, self.skipped
        )
    }
}

/// Output of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconciliationBatch {
    pub results: Vec<ReconciliationResult>,
    pub skipped: Vec<SkippedPurchase>,
    pub summary: PortfolioSummary,
}
