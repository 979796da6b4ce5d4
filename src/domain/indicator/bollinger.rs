//! Bollinger Bands over close prices.
//!
//! Middle is the SMA over `period` bars; upper and lower sit `multiplier`
//! population standard deviations (divide by N) either side of it.
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_bollinger(bars: &[Bar], period: usize, stddev_mult_x100: u32) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let value = if valid {
                bands(&bars[i + 1 - period..=i], mult)
            } else {
                IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                }
            };
            IndicatorPoint {
                date: bar.date,
                valid,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

fn bands(window: &[Bar], mult: f64) -> IndicatorValue {
    let n = window.len() as f64;
    let middle = window.iter().map(|b| b.close).sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|b| (b.close - middle).powi(2))
        .sum::<f64>()
        / n;
    let spread = mult * variance.sqrt();

    IndicatorValue::Bollinger {
        upper: middle + spread,
        middle,
        lower: middle - spread,
    }
}
