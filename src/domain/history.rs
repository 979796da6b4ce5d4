//! Chronologically ordered price history.
//!
//! A [`HistoryStore`] is built once from raw input rows, sorted ascending by
//! date with no duplicate dates. After loading it is read-only; the only
//! ways to obtain a modifiable store are [`crate::domain::snapshot::truncate`]
//! and `Clone`, both of which produce an independent owned copy.

use crate::domain::error::TimeMachineError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

/// Expected field order of an input row.
pub const FIELDS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// One unparsed input row, with the source line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawBar {
    pub fn new<S: Into<String>>(line: usize, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            line,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStore {
    bars: Vec<Bar>,
}

impl HistoryStore {
    /// Parse, sort and deduplicate-check input rows.
    ///
    /// Any bad row aborts the whole load; history is never silently
    /// truncated.
    pub fn load<I>(rows: I) -> Result<Self, TimeMachineError>
    where
        I: IntoIterator<Item = RawBar>,
    {
        let mut parsed = Vec::new();
        for raw in rows {
            let bar = parse_row(&raw)?;
            parsed.push((raw.line, bar));
        }
        Self::from_lined_bars(parsed)
    }

    /// Build a store from already-parsed bars in any order.
    ///
    /// Positions in `bars` stand in for line numbers in error messages.
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self, TimeMachineError> {
        let mut lined = Vec::with_capacity(bars.len());
        for (i, bar) in bars.into_iter().enumerate() {
            bar.validate()
                .map_err(|reason| TimeMachineError::malformed(i + 1, reason))?;
            lined.push((i + 1, bar));
        }
        Self::from_lined_bars(lined)
    }

    fn from_lined_bars(mut lined: Vec<(usize, Bar)>) -> Result<Self, TimeMachineError> {
        lined.sort_by_key(|(_, bar)| bar.date);

        if let Some(pair) = lined.windows(2).find(|w| w[0].1.date == w[1].1.date) {
            let (first_line, ref bar) = pair[0];
            let (dup_line, _) = pair[1];
            let line = first_line.max(dup_line);
            return Err(TimeMachineError::malformed(
                line,
                format!(
                    "duplicate date {} (also at line {})",
                    bar.date,
                    first_line.min(dup_line)
                ),
            ));
        }

        Ok(Self {
            bars: lined.into_iter().map(|(_, bar)| bar).collect(),
        })
    }

    pub(crate) fn from_sorted_unchecked(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar_at(&self, index: usize) -> Result<&Bar, TimeMachineError> {
        self.bars.get(index).ok_or(TimeMachineError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    /// Bars `[0, index]`, inclusive of `index`.
    pub fn slice_through(&self, index: usize) -> Result<&[Bar], TimeMachineError> {
        if index >= self.bars.len() {
            return Err(TimeMachineError::IndexOutOfRange {
                index,
                len: self.bars.len(),
            });
        }
        Ok(&self.bars[..=index])
    }

    /// Bars `[start, start + count)`, clipped to the end of history.
    pub fn window(&self, start: usize, count: usize) -> &[Bar] {
        let start = start.min(self.bars.len());
        let end = start.saturating_add(count).min(self.bars.len());
        &self.bars[start..end]
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Append a bar dated strictly after the current last bar.
    pub fn append(&mut self, bar: Bar) -> Result<(), TimeMachineError> {
        let line = self.bars.len() + 1;
        bar.validate()
            .map_err(|reason| TimeMachineError::malformed(line, reason))?;
        if let Some(last) = self.last_date() {
            if bar.date <= last {
                return Err(TimeMachineError::malformed(
                    line,
                    format!("date {} is not after last bar {}", bar.date, last),
                ));
            }
        }
        self.bars.push(bar);
        Ok(())
    }
}

fn parse_row(raw: &RawBar) -> Result<Bar, TimeMachineError> {
    if raw.fields.len() < FIELDS.len() {
        return Err(TimeMachineError::malformed(
            raw.line,
            format!(
                "expected {} fields, got {}",
                FIELDS.len(),
                raw.fields.len()
            ),
        ));
    }

    let date_str = raw.fields[0].trim();
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        TimeMachineError::malformed(raw.line, format!("invalid date {:?}: {}", date_str, e))
    })?;

    let open = parse_price(raw, 1)?;
    let high = parse_price(raw, 2)?;
    let low = parse_price(raw, 3)?;
    let close = parse_price(raw, 4)?;

    let volume_str = raw.fields[5].trim();
    let volume: u64 = volume_str.parse().map_err(|e| {
        TimeMachineError::malformed(
            raw.line,
            format!("invalid volume value {:?}: {}", volume_str, e),
        )
    })?;

    Bar::new(date, open, high, low, close, volume)
        .map_err(|reason| TimeMachineError::malformed(raw.line, format!("{}: {}", date, reason)))
}

fn parse_price(raw: &RawBar, column: usize) -> Result<f64, TimeMachineError> {
    let text = raw.fields[column].trim();
    text.parse::<f64>().map_err(|e| {
        TimeMachineError::malformed(
            raw.line,
            format!("invalid {} value {:?}: {}", FIELDS[column], text, e),
        )
    })
}
