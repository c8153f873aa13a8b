/// Profit and loss of a position against the amount invested
///
/// Unlike Price, the amount can be negative to represent losses.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PnL {
    amount: f64,
    percent: f64,
}

impl PnL {
    /// Compute PnL of a position now worth `current_value` after investing `invested`.
    ///
    /// The percentage is zero when nothing was invested.
    pub fn compute(current_value: f64, invested: f64) -> Self {
        let amount = current_value - invested;
        let percent = if invested != 0.0 {
            amount / invested * 100.0
        } else {
            0.0
        };
        PnL { amount, percent }
    }

    pub fn zero() -> Self {
        PnL {
            amount: 0.0,
            percent: 0.0,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn is_profit(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.amount < 0.0
    }
}

impl std::fmt::Display for PnL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.amount >= 0.0 {
            write!(f, "Gain: +${:.4} (+{:.2}%)", self.amount, self.percent)
        } else {
            write!(f, "Loss: -${:.4} ({:.2}%)", self.amount.abs(), self.percent)
        }
    }
}
