use crate::domain::services::listing_parser::{AdjustmentPolicy, ParserConfig};
use std::path::PathBuf;
use std::str::FromStr;

/// Which pipeline the binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Poll the listing screen and record new tokens
    Monitor,
    /// Open every listing once and record a simulated purchase
    Purchase,
    /// Value the recorded purchases against live prices
    Reconcile,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monitor" => Ok(RunMode::Monitor),
            "purchase" => Ok(RunMode::Purchase),
            "reconcile" => Ok(RunMode::Reconcile),
            other => Err(format!("unknown run mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            RunMode::Monitor => "monitor",
            RunMode::Purchase => "purchase",
            RunMode::Reconcile => "reconcile",
        };
        write!(f, "{}", name)
    }
}

/// Runtime configuration for the scout pipelines
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub run_mode: RunMode,

    // Automation session
    pub appium_url: String,
    pub device_name: String,
    pub app_package: String,
    pub app_activity: String,
    pub app_load_wait_seconds: u64, // Pause after the session opens before the first scan

    // Stores
    pub tokens_store_path: PathBuf,
    pub purchases_path: PathBuf,
    pub listing_details_path: PathBuf,
    pub results_path: PathBuf,

    // Scanning
    pub poll_interval_seconds: u64,
    pub max_listings_per_scan: usize,
    pub min_liquidity_usd: f64,
    pub max_extraction_attempts: u32, // Retries of a stale listing query
    pub max_consecutive_failures: u32,
    pub parser: ParserConfig,

    // Purchases
    pub purchase_amount_usd: f64,

    // Price API
    pub price_api_base_url: String,
    pub price_api_timeout_milliseconds: u64,
    pub price_api_requests_per_minute: u32,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        ScoutConfig {
            run_mode: RunMode::Monitor,

            appium_url: "http://127.0.0.1:4723".to_string(),
            device_name: "4672d93b".to_string(),
            app_package: "com.dexscreener".to_string(),
            app_activity: "com.dexscreener.MainActivity".to_string(),
            app_load_wait_seconds: 10,

            tokens_store_path: PathBuf::from("tokens_data.json"),
            purchases_path: PathBuf::from("simulated_purchases.json"),
            listing_details_path: PathBuf::from("pair_hash.json"),
            results_path: PathBuf::from("purchase_results.json"),

            poll_interval_seconds: 2,
            max_listings_per_scan: 8,
            min_liquidity_usd: 1.0,
            max_extraction_attempts: 3,
            max_consecutive_failures: 5,
            parser: ParserConfig::default(),

            purchase_amount_usd: 1.0,

            price_api_base_url: "https://api.dexscreener.com".to_string(),
            price_api_timeout_milliseconds: 10000, // 10 second timeout
            price_api_requests_per_minute: 60,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ScoutConfig {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; rejected values keep the default
    pub fn from_lookup<F>(lookup: F) -> ScoutConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ScoutConfig::default();

        if let Some(mode) = lookup("RUN_MODE") {
            match mode.parse::<RunMode>() {
                Ok(value) => config.run_mode = value,
                Err(e) => {
                    tracing::warn!("Invalid RUN_MODE: {}, using default: {}", e, config.run_mode);
                }
            }
        }

        if let Some(url) = lookup("APPIUM_URL") {
            if !url.trim().is_empty() {
                config.appium_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(device) = lookup("DEVICE_NAME") {
            if !device.trim().is_empty() {
                config.device_name = device.trim().to_string();
            }
        }

        if let Some(package) = lookup("APP_PACKAGE") {
            if !package.trim().is_empty() {
                config.app_package = package.trim().to_string();
            }
        }

        if let Some(activity) = lookup("APP_ACTIVITY") {
            if !activity.trim().is_empty() {
                config.app_activity = activity.trim().to_string();
            }
        }

        if let Some(wait) = lookup("APP_LOAD_WAIT_SECONDS") {
            if let Ok(value) = wait.parse::<u64>() {
                if value <= 120 {
                    config.app_load_wait_seconds = value;
                }
            }
        }

        if let Some(path) = lookup("TOKENS_STORE_PATH") {
            if !path.trim().is_empty() {
                config.tokens_store_path = PathBuf::from(path.trim());
            }
        }

        if let Some(path) = lookup("PURCHASES_PATH") {
            if !path.trim().is_empty() {
                config.purchases_path = PathBuf::from(path.trim());
            }
        }

        if let Some(path) = lookup("LISTING_DETAILS_PATH") {
            if !path.trim().is_empty() {
                config.listing_details_path = PathBuf::from(path.trim());
            }
        }

        if let Some(path) = lookup("RESULTS_PATH") {
            if !path.trim().is_empty() {
                config.results_path = PathBuf::from(path.trim());
            }
        }

        if let Some(interval) = lookup("POLL_INTERVAL_SECONDS") {
            match interval.parse::<u64>() {
                Ok(value) if (1..=300).contains(&value) => {
                    config.poll_interval_seconds = value;
                }
                Ok(value) => {
                    tracing::warn!(
                        "Invalid POLL_INTERVAL_SECONDS value: {} (must be between 1 and 300), using default: {}",
                        value, config.poll_interval_seconds
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse POLL_INTERVAL_SECONDS '{}': {}, using default: {}",
                        interval,
                        e,
                        config.poll_interval_seconds
                    );
                }
            }
        }

        if let Some(max) = lookup("MAX_LISTINGS_PER_SCAN") {
            if let Ok(value) = max.parse::<usize>() {
                if (1..=50).contains(&value) {
                    config.max_listings_per_scan = value;
                }
            }
        }

        if let Some(floor) = lookup("MIN_LIQUIDITY_USD") {
            match floor.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => {
                    config.min_liquidity_usd = value;
                }
                _ => {
                    tracing::warn!(
                        "Invalid MIN_LIQUIDITY_USD '{}', using default: {}",
                        floor,
                        config.min_liquidity_usd
                    );
                }
            }
        }

        if let Some(attempts) = lookup("MAX_EXTRACTION_ATTEMPTS") {
            if let Ok(value) = attempts.parse::<u32>() {
                if (1..=10).contains(&value) {
                    config.max_extraction_attempts = value;
                }
            }
        }

        if let Some(failures) = lookup("MAX_CONSECUTIVE_FAILURES") {
            if let Ok(value) = failures.parse::<u32>() {
                if (1..=100).contains(&value) {
                    config.max_consecutive_failures = value;
                }
            }
        }

        if let Some(drop) = lookup("PARSER_DROP_PLACEHOLDERS") {
            config.parser.drop_placeholders = drop.to_lowercase() == "true" || drop == "1";
        }

        if let Some(policy) = lookup("PRICE_ADJUSTMENT_POLICY") {
            match policy.trim().to_lowercase().as_str() {
                "positional" => config.parser.adjustment = AdjustmentPolicy::Positional,
                "ignored" => config.parser.adjustment = AdjustmentPolicy::Ignored,
                other => {
                    tracing::warn!(
                        "Invalid PRICE_ADJUSTMENT_POLICY '{}' (expected positional or ignored), using default: {:?}",
                        other, config.parser.adjustment
                    );
                }
            }
        }

        if let Some(amount) = lookup("PURCHASE_AMOUNT_USD") {
            if let Ok(value) = amount.parse::<f64>() {
                if value.is_finite() && value > 0.0 {
                    config.purchase_amount_usd = value;
                }
            }
        }

        if let Some(url) = lookup("PRICE_API_BASE_URL") {
            if !url.trim().is_empty() {
                config.price_api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(timeout) = lookup("PRICE_API_TIMEOUT_MILLISECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                if (1000..=60000).contains(&value) {
                    config.price_api_timeout_milliseconds = value;
                }
            }
        }

        if let Some(rpm) = lookup("PRICE_API_REQUESTS_PER_MINUTE") {
            if let Ok(value) = rpm.parse::<u32>() {
                if (1..=300).contains(&value) {
                    config.price_api_requests_per_minute = value;
                }
            }
        }

        config
    }
}
