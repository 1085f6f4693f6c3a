//! Trend and flip-margin calculations.
//!
//! Pure functions over GP amounts:
//! - Trend classification of a price against its 24h average
//! - Margin percentage between a buy and a sell quote
//! - Grand Exchange tax (1% of the sell price, truncated)
//! - Expected profit after tax

use serde::{Deserialize, Serialize};

use crate::types::Trend;

/// Percentage move away from the 24h average that counts as a trend
pub const TREND_THRESHOLD_PCT: f64 = 2.0;

/// Grand Exchange tax in basis points of the sell price
pub const GE_TAX_BPS: i64 = 100;

/// Classify `price` against `avg_24h`.
///
/// FLAT when there is no average to compare against.
pub fn trend(price: i64, avg_24h: i64) -> Trend {
    if avg_24h == 0 {
        return Trend::Flat;
    }

    let diff_pct = (price - avg_24h) as f64 / avg_24h as f64 * 100.0;

    if diff_pct > TREND_THRESHOLD_PCT {
        Trend::Up
    } else if diff_pct < -TREND_THRESHOLD_PCT {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// Profit margin in percent of the buy price. Zero when `buy` is zero.
pub fn margin(buy: i64, sell: i64) -> f64 {
    if buy == 0 {
        return 0.0;
    }
    (sell - buy) as f64 / buy as f64 * 100.0
}

/// GE tax on a sale. Integer division truncates, so 999 gp pays 9 gp.
pub fn tax(sell: i64) -> i64 {
    sell * GE_TAX_BPS / 10_000
}

/// Profit of buying at `buy` and selling at `sell`, net of tax.
pub fn expected_profit(buy: i64, sell: i64) -> i64 {
    sell - buy - tax(sell)
}

/// Flip economics for one buy/sell pair
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlipMetrics {
    pub margin_pct: f64,
    pub tax: i64,
    pub expected_profit: i64,
}

pub fn flip_metrics(buy: i64, sell: i64) -> FlipMetrics {
    FlipMetrics {
        margin_pct: margin(buy, sell),
        tax: tax(sell),
        expected_profit: expected_profit(buy, sell),
    }
}
