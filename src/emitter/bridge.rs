use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use event_emitter_rs::EventEmitter;
use serde::Serialize;
use tracing::warn;

use crate::observer::{Observers, Subscription, Transition};

/// Re-emits optimistic state changes on an [`EventEmitter`].
///
/// Each transition becomes an event named `"{prefix}.{transition}"` (for
/// example `tasks.rolled_back`) whose payload is the state serialized to
/// JSON. Listeners run on the emitter's own threads, so they see events
/// asynchronously.
///
/// ```ignore
/// let bridge = EmitterBridge::new("tasks");
/// bridge.on(Transition::RolledBack, |payload| show_toast(&payload));
/// let _sub = bridge.attach(tasks.observers());
/// ```
#[derive(Clone)]
pub struct EmitterBridge {
    prefix: String,
    emitter: Arc<Mutex<EventEmitter>>,
}

impl EmitterBridge {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_emitter(prefix, EventEmitter::new())
    }

    /// Bridge onto an existing emitter, keeping its listeners.
    pub fn with_emitter(prefix: impl Into<String>, emitter: EventEmitter) -> Self {
        EmitterBridge {
            prefix: prefix.into(),
            emitter: Arc::new(Mutex::new(emitter)),
        }
    }

    pub fn event_name(&self, transition: Transition) -> String {
        format!("{}.{}", self.prefix, transition)
    }

    /// Register a listener for one kind of transition.
    pub fn on<F>(&self, transition: Transition, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let event = self.event_name(transition);
        self.lock().on(&event, listener);
    }

    /// Emit a payload for `transition` right away.
    pub fn emit(&self, transition: Transition, payload: impl Into<String>) {
        let event = self.event_name(transition);
        self.lock().emit(&event, payload.into());
    }

    /// Forward every transition of `observers` to the emitter.
    ///
    /// Dropping the returned subscription stops forwarding.
    pub fn attach<S>(&self, observers: &Observers<S>) -> Subscription
    where
        S: Serialize + 'static,
    {
        let bridge = self.clone();
        observers.subscribe(move |transition, state: &S| match serde_json::to_string(state) {
            Ok(payload) => bridge.emit(transition, payload),
            Err(err) => warn!(event = %bridge.event_name(transition), error = %err, "state not serializable; event dropped"),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EventEmitter> {
        self.emitter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
