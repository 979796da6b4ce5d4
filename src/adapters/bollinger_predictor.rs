//! Reference predictor: Bollinger band reversion with an SMA trend filter.
//!
//! Buys when the last close drops below the lower band while the band
//! middle sits above the long SMA, sells when it rises above the upper band
//! while the middle sits below the long SMA, and takes no action otherwise.
//! Snapshots shorter than the trend period get no action.

use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::prediction::{AnalysisContext, Stance};
use crate::ports::predictor_port::PredictorPort;

#[derive(Debug, Clone)]
pub struct BollingerPredictor {
    pub trend_period: usize,
    pub band_period: usize,
    pub stddev_mult_x100: u32,
}

impl Default for BollingerPredictor {
    fn default() -> Self {
        Self {
            trend_period: 200,
            band_period: 20,
            stddev_mult_x100: 200,
        }
    }
}

impl BollingerPredictor {
    fn trend(&self) -> IndicatorType {
        IndicatorType::Sma(self.trend_period)
    }

    fn bands(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.band_period,
            stddev_mult_x100: self.stddev_mult_x100,
        }
    }
}

impl PredictorPort for BollingerPredictor {
    fn analyze(&self, context: &mut AnalysisContext) {
        let bars = context.snapshot.bars();
        let sma = calculate_sma(bars, self.trend_period);
        let bands = calculate_bollinger(bars, self.band_period, self.stddev_mult_x100);
        context.studies.insert(self.trend(), sma);
        context.studies.insert(self.bands(), bands);
    }

    fn predict(&self, context: &AnalysisContext) -> Stance {
        let Some(last) = context.snapshot.bars().last() else {
            return Stance::None;
        };
        if context.snapshot.len() < self.trend_period {
            return Stance::None;
        }

        let trend = match context
            .study(&self.trend())
            .and_then(|s| s.latest_valid())
            .map(|p| &p.value)
        {
            Some(IndicatorValue::Simple(v)) => *v,
            _ => return Stance::None,
        };
        let (upper, middle, lower) = match context
            .study(&self.bands())
            .and_then(|s| s.latest_valid())
            .map(|p| &p.value)
        {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) => (*upper, *middle, *lower),
            _ => return Stance::None,
        };

        if last.close < lower && middle > trend {
            Stance::Buy
        } else if last.close > upper && middle < trend {
            Stance::Sell
        } else {
            Stance::None
        }
    }
}
