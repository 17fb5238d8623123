//! Shared collapsed/expanded state of the TOC panel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::registry;

const STORE_KEY: &str = "tocview.toc-collapsed";

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct State {
    value: bool,
    // Values written but not yet delivered, oldest first.
    pending: VecDeque<bool>,
    delivering: bool,
}

/// Observable boolean: is the TOC panel collapsed?
///
/// Notifications are delivered one at a time in the order the values were
/// written, so the last value a listener sees always matches [`get`].
///
/// [`get`]: CollapseStore::get
pub struct CollapseStore {
    state: Mutex<State>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl CollapseStore {
    pub fn new(collapsed: bool) -> Self {
        Self {
            state: Mutex::new(State {
                value: collapsed,
                ..State::default()
            }),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// The one store shared by every part of the process.
    pub fn shared() -> Arc<Self> {
        match registry::global_slot(STORE_KEY, || Self::new(false)) {
            Ok(store) => store,
            Err(e) => {
                log::error!("{}; using a private collapse store", e);
                Arc::new(Self::new(false))
            }
        }
    }

    pub fn get(&self) -> bool {
        self.lock_state().value
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Updates the value and notifies subscribers if it changed.
    ///
    /// If another `set` is already delivering, the new value is queued and
    /// that call delivers it. Listeners run without any lock held, so they
    /// may read or write the store.
    pub fn set(&self, collapsed: bool) {
        {
            let mut state = self.lock_state();
            if state.value == collapsed {
                return;
            }
            state.value = collapsed;
            state.pending.push_back(collapsed);
            if state.delivering {
                return;
            }
            state.delivering = true;
        }

        loop {
            let next = {
                let mut state = self.lock_state();
                match state.pending.pop_front() {
                    Some(value) => value,
                    None => {
                        state.delivering = false;
                        return;
                    }
                }
            };
            log::debug!("TOC panel collapsed: {}", next);

            let listeners: Vec<Listener> = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            for listener in listeners {
                listener(next);
            }
        }
    }

    pub fn toggle(&self) {
        self.set(!self.get());
    }

    /// Calls `listener` with the current value now and on every change
    /// until the returned subscription is dropped.
    pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::clone(&listener)));
        listener(self.get());

        Subscription {
            store: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn view(self: &Arc<Self>) -> CollapseView {
        CollapseView(Arc::clone(self))
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<CollapseStore>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.id);
        }
    }
}

/// Read-only access to the collapse state.
#[derive(Clone)]
pub struct CollapseView(Arc<CollapseStore>);

impl CollapseView {
    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.0.subscribe(listener)
    }
}
