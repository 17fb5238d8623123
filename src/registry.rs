//! Process-wide named slots for values that must exist exactly once.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{Result, SyncError};

type Slot = Arc<dyn Any + Send + Sync>;

static SLOTS: OnceLock<Mutex<HashMap<&'static str, Slot>>> = OnceLock::new();

/// Returns the value stored under `key`, creating it with `init` on first
/// use. Every caller asking for the same key gets the same `Arc`.
pub fn global_slot<T, F>(key: &'static str, init: F) -> Result<Arc<T>>
where
    T: Any + Send + Sync,
    F: FnOnce() -> T,
{
    let mut slots = SLOTS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let slot = slots
        .entry(key)
        .or_insert_with(|| {
            log::debug!("Creating global slot {}", key);
            let slot: Slot = Arc::new(init());
            slot
        })
        .clone();

    slot.downcast::<T>().map_err(|_| SyncError::SlotType(key))
}
