use crate::domain::entities::reconciliation_result::PairSnapshot;
use crate::domain::errors::PriceApiError;
use crate::domain::repositories::price_source::{PriceResult, PriceSource};
use crate::rate_limit::{self, RateLimiterConfig, SharedRateLimiter};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// DexScreener public API endpoint
pub const DEXSCREENER_API_BASE: &str = "https://api.dexscreener.com";

/// DexScreener client configuration
#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    pub api_base: String,
    pub timeout: Duration,
    pub requests_per_minute: u32,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            api_base: DEXSCREENER_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            requests_per_minute: 60,
        }
    }
}

/// Response of `GET /latest/dex/pairs/{chainId}/{pairAddress}`
#[derive(Debug, Deserialize)]
pub struct PairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<RawPair>>,
    #[serde(default)]
    pub pair: Option<RawPair>,
}

impl PairsResponse {
    /// First reported pair, from `pairs` or the singular `pair` field
    pub fn first_pair(self) -> Option<RawPair> {
        self.pairs
            .and_then(|pairs| pairs.into_iter().next())
            .or(self.pair)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPair {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub pair_address: Option<String>,
    /// Sent as a decimal string; may be missing for brand new pairs
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<RawLiquidity>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub volume: Option<RawVolume>,
    #[serde(default)]
    pub txns: Option<RawTxnWindows>,
}

#[derive(Debug, Deserialize)]
pub struct RawLiquidity {
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawVolume {
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawTxnWindows {
    #[serde(default)]
    pub h24: Option<RawTxnCounts>,
}

#[derive(Debug, Deserialize)]
pub struct RawTxnCounts {
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub buys: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub sells: Option<u64>,
}

/// Read a JSON number or numeric string; `""`, `"N/A"`, null and
/// non-finite values read as absent.
fn lenient_number(value: Option<Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("N/A") {
                None
            } else {
                s.replace(',', "").parse::<f64>().ok()
            }
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;
    Ok(lenient_number(value))
}

fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;
    Ok(lenient_number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64))
}

impl RawPair {
    pub fn into_snapshot(self) -> PairSnapshot {
        let txns = self.txns.and_then(|t| t.h24);

        PairSnapshot {
            price_usd: self.price_usd,
            liquidity_usd: self.liquidity.and_then(|l| l.usd).unwrap_or(0.0),
            fdv: self.fdv,
            volume_24h: self.volume.and_then(|v| v.h24).unwrap_or(0.0),
            buys_24h: txns.as_ref().and_then(|t| t.buys).unwrap_or(0),
            sells_24h: txns.as_ref().and_then(|t| t.sells).unwrap_or(0),
        }
    }
}

/// Decode a pair lookup body
pub fn parse_pair_response(body: &str) -> PriceResult<Option<PairSnapshot>> {
    let response: PairsResponse =
        serde_json::from_str(body).map_err(|e| PriceApiError::Decode(e.to_string()))?;
    Ok(response.first_pair().map(RawPair::into_snapshot))
}

/// DexScreener price client
pub struct DexScreenerClient {
    client: Client,
    base_url: Url,
    limiter: SharedRateLimiter,
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig) -> PriceResult<Self> {
        let base_url = Url::parse(&config.api_base)
            .map_err(|e| PriceApiError::InvalidUrl(format!("{}: {}", config.api_base, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PriceApiError::InvalidUrl(config.api_base));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PriceApiError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            limiter: rate_limit::create_rate_limiter(RateLimiterConfig {
                requests_per_minute: config.requests_per_minute,
            }),
        })
    }

    /// `{base}/latest/dex/pairs/{chain_id}/{pair_address}` with escaped segments
    pub fn pair_url(&self, chain_id: &str, pair_address: &str) -> PriceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PriceApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["latest", "dex", "pairs", chain_id, pair_address]);
        Ok(url)
    }
}

#[async_trait]
impl PriceSource for DexScreenerClient {
    fn name(&self) -> &str {
        "DexScreener"
    }

    async fn pair_snapshot(
        &self,
        chain_id: &str,
        pair_address: &str,
    ) -> PriceResult<Option<PairSnapshot>> {
        let url = self.pair_url(chain_id, pair_address)?;

        rate_limit::acquire(&self.limiter).await;
        debug!("Fetching pair {} on {}", pair_address, chain_id);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PriceApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_pair_response(&body)
    }
}
