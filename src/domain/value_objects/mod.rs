pub mod magnitude;
pub mod pnl;
pub mod price;
