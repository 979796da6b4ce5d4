//! Daily OHLCV bar representation.

use chrono::NaiveDate;

/// Fractional digits kept on every price.
pub const PRICE_DECIMALS: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Round a price to [`PRICE_DECIMALS`] fractional digits.
pub fn round_price(value: f64) -> f64 {
    let scale = 10f64.powi(PRICE_DECIMALS);
    (value * scale).round() / scale
}

impl Bar {
    /// Build a bar with rounded prices, rejecting negative or non-finite
    /// prices and any violation of `low <= open, close <= high`.
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, String> {
        let bar = Bar {
            date,
            open: round_price(open),
            high: round_price(high),
            low: round_price(low),
            close: round_price(close),
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative price, got {}", name, value));
            }
        }
        if self.low > self.high {
            return Err(format!("low {} above high {}", self.low, self.high));
        }
        if self.open < self.low || self.open > self.high {
            return Err(format!(
                "open {} outside low/high range [{}, {}]",
                self.open, self.low, self.high
            ));
        }
        if self.close < self.low || self.close > self.high {
            return Err(format!(
                "close {} outside low/high range [{}, {}]",
                self.close, self.low, self.high
            ));
        }
        Ok(())
    }
}
