use crate::models::{OrderSide, PriceLevels};
use crate::{BotError, Result};

/// Compute entry and take-profit levels from the current price.
///
/// `entry = price * (1 - discount/100)`, `take_profit = price * (1 + tp/100)`.
/// Both sides use the same formulas, so a Sell's take-profit sits above the
/// current price.
pub fn plan(
    side: OrderSide,
    current_price: f64,
    entry_discount_percent: f64,
    take_profit_percent: f64,
) -> Result<PriceLevels> {
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(BotError::InvalidPrice {
            price: current_price,
        });
    }

    let levels = PriceLevels {
        entry_price: current_price * (1.0 - entry_discount_percent / 100.0),
        take_profit: current_price * (1.0 + take_profit_percent / 100.0),
    };

    tracing::debug!(
        side = %side,
        current_price,
        entry = levels.entry_price,
        tp = levels.take_profit,
        "Planned price levels"
    );

    Ok(levels)
}

/// Planner bound to the configured percentages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePlanner {
    pub entry_discount_percent: f64,
    pub take_profit_percent: f64,
}

impl PricePlanner {
    pub fn new(entry_discount_percent: f64, take_profit_percent: f64) -> Self {
        Self {
            entry_discount_percent,
            take_profit_percent,
        }
    }

    pub fn plan(&self, side: OrderSide, current_price: f64) -> Result<PriceLevels> {
        plan(
            side,
            current_price,
            self.entry_discount_percent,
            self.take_profit_percent,
        )
    }
}

impl Default for PricePlanner {
    fn default() -> Self {
        Self::new(2.0, 10.0)
    }
}
