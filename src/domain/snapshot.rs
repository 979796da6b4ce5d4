//! Point-in-time snapshots of a history.
//!
//! A snapshot built at index `i` holds bars `[0, i]` and nothing else. It is
//! an owned copy: nothing dated after `store.bar_at(i).date` is reachable
//! from it, and changes to either store are invisible to the other.

use crate::domain::error::TimeMachineError;
use crate::domain::history::HistoryStore;

/// Copy bars `[0, index]` into a new, independent store.
pub fn truncate(store: &HistoryStore, index: usize) -> Result<HistoryStore, TimeMachineError> {
    let visible = store.slice_through(index)?;
    Ok(HistoryStore::from_sorted_unchecked(visible.to_vec()))
}
