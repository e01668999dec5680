use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Shared value that notifies subscribers when it changes.
///
/// Clones share the same value and subscriber list.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    value: RwLock<T>,
    listeners: Mutex<Listeners<T>>,
}

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: Send + Sync> Detach for Inner<T> {
    fn detach(&self, id: u64) {
        self.listeners.lock().entries.retain(|(entry, _)| *entry != id);
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                listeners: Mutex::new(Listeners {
                    next_id: 0,
                    entries: Vec::new(),
                }),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Stores `value` and notifies subscribers. Returns `false` without
    /// notifying anyone when the value is unchanged.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        // Listeners run outside the lock so they may (un)subscribe or read.
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&value);
        }
        true
    }

    /// Registers `listener` for future changes. The listener stays attached
    /// until the returned handle is dropped or unsubscribed.
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut listeners = self.inner.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let registry: Weak<dyn Detach> = weak;
        Subscription {
            id,
            registry: Some(registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().entries.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.read())
            .field("subscribers", &self.inner.listeners.lock().entries.len())
            .finish()
    }
}

/// Handle keeping a listener attached to an [`Observable`].
pub struct Subscription {
    id: u64,
    registry: Option<Weak<dyn Detach>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.detach(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}
