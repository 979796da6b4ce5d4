//! Calendar date to history position lookup.
//!
//! Lookups are recomputed against the store on every call, so they always
//! reflect its current contents.

use crate::domain::error::TimeMachineError;
use crate::domain::history::HistoryStore;
use chrono::NaiveDate;

/// Position of the first bar dated on or after `date`.
///
/// Returns `store.len()` when `date` is after every bar. That value is a
/// sentinel meaning "no data", not a valid bar index.
pub fn index_of(store: &HistoryStore, date: NaiveDate) -> usize {
    store.bars().partition_point(|bar| bar.date < date)
}

/// Position of the first bar dated strictly after `date`.
pub fn index_after(store: &HistoryStore, date: NaiveDate) -> usize {
    store.bars().partition_point(|bar| bar.date <= date)
}

/// [`index_of`] that turns the end-of-history sentinel into
/// [`TimeMachineError::DateNotFound`].
pub fn resolve(store: &HistoryStore, date: NaiveDate) -> Result<usize, TimeMachineError> {
    let index = index_of(store, date);
    if index == store.len() {
        return Err(TimeMachineError::DateNotFound { date });
    }
    Ok(index)
}

/// Resolve a `(year, month, day)` triple to the first bar on or after it.
pub fn jump_to(
    store: &HistoryStore,
    year: i32,
    month: u32,
    day: u32,
) -> Result<usize, TimeMachineError> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(TimeMachineError::InvalidDate { year, month, day })?;
    resolve(store, date)
}
