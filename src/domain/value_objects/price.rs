use tracing::{debug, warn};

/// Non-negative USD price
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err("Price must be finite".to_string());
        }
        if value >= 0.0 {
            Ok(Price(value))
        } else {
            Err("Price must be non-negative".to_string())
        }
    }

    pub fn zero() -> Self {
        Price(0.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn multiply(&self, factor: f64) -> Result<Price, String> {
        if !factor.is_finite() {
            return Err("Factor must be finite".to_string());
        }
        Price::new(self.0 * factor)
    }

    /// Read a price as displayed by the listing screen.
    ///
    /// `$` and thousands separators are stripped. `adjustment` is the count of
    /// leading zeros the screen elided from a sub-cent price; when present the
    /// parsed value is scaled by `10^(2 - k)`. Empty or unreadable text is zero.
    pub fn from_display(raw: &str, adjustment: Option<u32>) -> Price {
        let cleaned = raw.replace(['$', ','], "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Price::zero();
        }

        let parsed = match cleaned.parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                debug!("Unreadable price '{}', using 0", raw);
                return Price::zero();
            }
        };

        let scaled = match adjustment {
            Some(zeros) => {
                let exponent = 2 - zeros.min(i32::MAX as u32) as i32;
                parsed * 10f64.powi(exponent)
            }
            None => parsed,
        };

        Price::new(scaled).unwrap_or_else(|e| {
            warn!("Discarding displayed price '{}': {}", raw, e);
            Price::zero()
        })
    }

    /// Units bought for `amount_usd`; zero when the price is not positive
    pub fn units_for(&self, amount_usd: f64) -> f64 {
        if self.0 > 0.0 {
            amount_usd / self.0
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}
