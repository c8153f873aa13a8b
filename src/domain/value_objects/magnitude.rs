//! Human-formatted dollar magnitudes ("$12.3K", "<$1", "$2M").

use tracing::warn;

/// Parse a displayed magnitude into a plain number.
///
/// Empty input and anything below the display threshold (`<$1`) read as zero.
/// Only the first of `K`, `M`, `B` found is applied. Unparseable input is
/// logged and reads as zero. The result is always finite and never negative.
pub fn parse_magnitude(raw: &str) -> f64 {
    let text = raw.trim().to_uppercase();
    if text.is_empty() || text.contains('<') {
        return 0.0;
    }

    let mut text = text.replace(['$', ','], "");
    let mut multiplier = 1.0;
    for (suffix, factor) in [('K', 1_000.0), ('M', 1_000_000.0), ('B', 1_000_000_000.0)] {
        if text.contains(suffix) {
            multiplier = factor;
            text = text.replace(suffix, "");
            break;
        }
    }

    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => (value * multiplier).max(0.0),
        _ => {
            warn!("Could not parse magnitude value: '{}'", raw);
            0.0
        }
    }
}
