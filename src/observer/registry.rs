use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::hooks::guarded;

use super::subscription::{Subscription, SubscriptionId};
use super::transition::Transition;

type Callback<S> = Arc<dyn Fn(Transition, &S) + Send + Sync>;

struct Registry<S> {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback<S>)>,
}

/// Change notification for one optimistic instance.
///
/// Many readers, one mutator: callbacks are registered by consumers and
/// invoked by the owning cell or collection after every state transition, in
/// registration order. Callbacks run outside the state lock, so they may read
/// the instance they observe. Cloning shares the same registry.
///
/// The state passed to a callback is the view right after its transition.
/// When confirmations settle on several threads at once, callbacks for
/// different transitions can interleave, so an older view may arrive after
/// a newer one. Callbacks that need the latest state should read it from the
/// instance rather than keep the view they were handed.
pub struct Observers<S> {
    registry: Arc<Mutex<Registry<S>>>,
}

impl<S> Clone for Observers<S> {
    fn clone(&self) -> Self {
        Observers {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: 'static> Default for Observers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Observers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.lock().callbacks.len())
            .finish()
    }
}

impl<S: 'static> Observers<S> {
    pub fn new() -> Self {
        Observers {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Register a callback. Dropping the returned guard unregisters it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Transition, &S) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.lock();
            let id = SubscriptionId(registry.next_id);
            registry.next_id += 1;
            registry.callbacks.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<Registry<S>>> = Arc::downgrade(&self.registry);
        Subscription::new(id, move || {
            if let Some(registry) = weak.upgrade() {
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                registry.callbacks.retain(|(existing, _)| *existing != id);
            }
        })
    }

    /// Unregister by id. Returns false if no such callback was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        let before = registry.callbacks.len();
        registry.callbacks.retain(|(existing, _)| *existing != id);
        registry.callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback with the new state.
    pub(crate) fn notify(&self, transition: Transition, state: &S) {
        let callbacks: Vec<Callback<S>> = self
            .lock()
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            guarded("observer", || callback(transition, state));
        }
    }
}

impl<S> Observers<S> {
    fn lock(&self) -> MutexGuard<'_, Registry<S>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
