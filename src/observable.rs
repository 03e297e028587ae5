//! Shared values that notify registered listeners when they change
//!
//! Listeners run synchronously on the thread that calls [`Observable::set`],
//! after the new value is in place, so a listener reading the observable
//! sees the value it is being told about.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: RwLock<T>,
    listeners: RwLock<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
}

// A panicking listener must not take the value down with it.
fn read<L>(lock: &RwLock<L>) -> RwLockReadGuard<'_, L> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<L>(lock: &RwLock<L>) -> RwLockWriteGuard<'_, L> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle to a shared value
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(value),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn get(&self) -> T {
        read(&self.shared.value).clone()
    }

    /// Replaces the value and notifies every listener.
    pub fn set(&self, value: T) {
        *write(&self.shared.value) = value.clone();
        self.notify(&value);
    }

    /// Derives the next value from the current one; returns it.
    pub fn update<F: FnOnce(&T) -> T>(&self, f: F) -> T {
        let next = {
            let mut guard = write(&self.shared.value);
            let next = f(&guard);
            *guard = next.clone();
            next
        };
        self.notify(&next);
        next
    }

    fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = read(&self.shared.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    /// Registers a listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        write(&self.shared.listeners).push((id, Arc::new(listener)));

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    write(&shared.listeners).retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn listener_count(&self) -> usize {
        read(&self.shared.listeners).len()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
