//! Per-item exclusive locks for the commit path.
//!
//! "Check sufficient balance" and "append + deduct" must not be separated by
//! a window in which another commit passes the same check against a stale
//! balance. Each item gets one lock; a commit takes every lock of its item
//! set, in sorted id order, and holds them across check-then-append. Commits
//! over disjoint item sets run fully in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use paintstock_core::{DomainError, DomainResult};
use paintstock_inventory::ItemId;

/// Lock table handing out one `Arc<Mutex<()>>` per item.
#[derive(Debug, Default)]
pub struct ItemLocks {
    inner: Mutex<HashMap<ItemId, Arc<Mutex<()>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handles for an item set, sorted and deduplicated.
    ///
    /// Sorted acquisition order is what makes overlapping commits
    /// deadlock-free; callers must lock the handles in the returned order.
    pub fn handles(&self, items: &[ItemId]) -> DomainResult<Vec<Arc<Mutex<()>>>> {
        let mut ids: Vec<ItemId> = items.to_vec();
        ids.sort();
        ids.dedup();

        let mut table = self
            .inner
            .lock()
            .map_err(|_| DomainError::storage("item lock table poisoned"))?;

        Ok(ids
            .into_iter()
            .map(|id| Arc::clone(table.entry(id).or_default()))
            .collect())
    }
}

/// Lock a set of handles in order, surfacing poisoning as a storage failure.
pub(crate) fn lock_all(handles: &[Arc<Mutex<()>>]) -> DomainResult<Vec<MutexGuard<'_, ()>>> {
    handles
        .iter()
        .map(|handle| {
            handle
                .lock()
                .map_err(|_| DomainError::storage("item lock poisoned"))
        })
        .collect()
}
