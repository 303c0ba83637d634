use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use crate::confirm::Confirmation;
use crate::error::{BoxError, MutationError};
use crate::hooks::Hooks;
use crate::observer::{Observers, Subscription, Transition};
use crate::snapshot::{Ledger, OpId, RollbackPolicy, Ticket};

use super::builder::CellBuilder;
use super::state::OptimisticState;

struct CellState<T> {
    initial: T,
    data: T,
    /// Last authoritative value. Only read under `RollbackPolicy::Isolated`.
    confirmed: T,
    /// Update that produced `confirmed`. A later confirmation of an older
    /// update does not overwrite it.
    confirmed_by: Option<OpId>,
    /// Pre-mutation value captured by the most recent `update`.
    previous: Option<T>,
    /// In-flight speculative values, oldest first.
    ledger: Ledger<T>,
    error: Option<MutationError>,
}

impl<T: Clone> CellState<T> {
    fn view(&self) -> OptimisticState<T> {
        OptimisticState {
            data: self.data.clone(),
            is_optimistic: !self.ledger.is_empty(),
            error: self.error.clone(),
        }
    }

    /// Newest pending speculation, unless a newer update is already
    /// confirmed.
    fn replay(&self) -> T {
        match self.ledger.last() {
            Some((id, value)) if self.confirmed_by.map_or(true, |by| id > by) => value.clone(),
            _ => self.confirmed.clone(),
        }
    }

    fn confirm(&mut self, id: OpId, value: T) {
        if self.confirmed_by.map_or(true, |by| id > by) {
            self.confirmed = value;
            self.confirmed_by = Some(id);
        }
    }

    fn adopt(&mut self, value: T) {
        self.data = value.clone();
        self.confirmed = value;
        self.confirmed_by = None;
        self.previous = None;
        self.error = None;
        self.ledger.rebase();
    }
}

pub(super) struct Shared<T> {
    state: Mutex<CellState<T>>,
    observers: Observers<OptimisticState<T>>,
    hooks: Hooks<OptimisticState<T>>,
    policy: RollbackPolicy,
}

/// One value with optimistic updates.
///
/// `update` shows the speculative value immediately and reconciles when the
/// confirm function settles. Cloning hands out another handle to the same
/// cell. When every handle is gone, confirmations that are still running
/// settle without touching anything.
pub struct OptimisticCell<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for OptimisticCell<T> {
    fn clone(&self) -> Self {
        OptimisticCell {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> OptimisticCell<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(initial: T) -> Self {
        Self::builder(initial).build()
    }

    pub fn builder(initial: T) -> CellBuilder<T> {
        CellBuilder::new(initial)
    }

    pub(super) fn from_parts(
        initial: T,
        policy: RollbackPolicy,
        hooks: Hooks<OptimisticState<T>>,
    ) -> Self {
        let state = CellState {
            data: initial.clone(),
            confirmed: initial.clone(),
            initial,
            confirmed_by: None,
            previous: None,
            ledger: Ledger::new(),
            error: None,
        };
        OptimisticCell {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                observers: Observers::new(),
                hooks,
                policy,
            }),
        }
    }

    /// Apply `value` now and confirm it with `confirm`.
    ///
    /// The speculative value is visible before this returns. The returned
    /// confirmation resolves to the authoritative value, or `None` if the
    /// confirm function failed (the cell then holds the value from before
    /// the call and `error()` says why).
    pub fn update<F, Fut, E>(&self, value: T, confirm: F) -> Confirmation<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let ticket = {
            let mut state = self.shared.lock();
            let ticket = state.ledger.push(value.clone());
            let previous = std::mem::replace(&mut state.data, value);
            state.previous = Some(previous);
            state.error = None;
            debug!(op = %ticket.id, in_flight = state.ledger.len(), "speculative value applied");
            self.shared.announce(state, Transition::Speculative);
            ticket
        };

        let pending = confirm();
        let shared = Arc::downgrade(&self.shared);
        Box::pin(async move {
            let outcome = pending.await.map_err(MutationError::from_confirm);
            Shared::settle(&shared, ticket, outcome)
        })
    }

    /// Go back to the construction-time value and drop all pending work.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        let initial = state.initial.clone();
        state.adopt(initial);
        debug!("cell reset to initial value");
        self.shared.announce(state, Transition::Reset);
    }

    /// Adopt `value` as authoritative, discarding pending work.
    pub fn set(&self, value: T) {
        let mut state = self.shared.lock();
        state.adopt(value);
        debug!("cell replaced with authoritative value");
        self.shared.announce(state, Transition::Replaced);
    }

    pub fn data(&self) -> T {
        self.shared.lock().data.clone()
    }

    pub fn is_optimistic(&self) -> bool {
        !self.shared.lock().ledger.is_empty()
    }

    pub fn error(&self) -> Option<MutationError> {
        self.shared.lock().error.clone()
    }

    pub fn state(&self) -> OptimisticState<T> {
        self.shared.lock().view()
    }

    /// Number of updates still waiting for their confirmation.
    pub fn in_flight(&self) -> usize {
        self.shared.lock().ledger.len()
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.shared.policy
    }

    pub fn observers(&self) -> &Observers<OptimisticState<T>> {
        &self.shared.observers
    }

    /// Register `callback` for every transition. See [`Observers`] for
    /// ordering across concurrent settlements.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Transition, &OptimisticState<T>) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(callback)
    }
}

impl<T> Shared<T>
where
    T: Clone + Send + 'static,
{
    fn lock(&self) -> MutexGuard<'_, CellState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release the lock, then tell observers and hooks.
    fn announce(&self, state: MutexGuard<'_, CellState<T>>, transition: Transition) {
        if self.observers.is_empty() && self.hooks.is_empty() {
            return;
        }
        let view = state.view();
        drop(state);

        self.observers.notify(transition, &view);
        match (transition, &view.error) {
            (Transition::Confirmed, _) => self.hooks.success(&view),
            (Transition::RolledBack, Some(err)) => self.hooks.failure(err, &view),
            _ => {}
        }
    }

    fn settle(
        shared: &Weak<Self>,
        ticket: Ticket,
        outcome: Result<T, MutationError>,
    ) -> Option<T> {
        let Some(shared) = shared.upgrade() else {
            debug!(op = %ticket.id, "cell dropped before confirmation settled");
            return outcome.ok();
        };

        let mut state = shared.lock();
        if !state.ledger.is_current(&ticket) {
            debug!(op = %ticket.id, "confirmation settled after the cell was replaced; ignored");
            return outcome.ok();
        }

        match outcome {
            Ok(confirmed) => {
                state.ledger.settle(&ticket);
                state.data = match shared.policy {
                    RollbackPolicy::Latest => confirmed.clone(),
                    RollbackPolicy::Isolated => {
                        state.confirm(ticket.id, confirmed.clone());
                        state.replay()
                    }
                };
                state.error = None;
                debug!(op = %ticket.id, in_flight = state.ledger.len(), "confirmed");
                shared.announce(state, Transition::Confirmed);
                Some(confirmed)
            }
            Err(err) => {
                match shared.policy {
                    RollbackPolicy::Latest => {
                        if let Some(previous) = state.previous.clone() {
                            state.data = previous;
                        }
                        state.ledger.abandon_all();
                    }
                    RollbackPolicy::Isolated => {
                        state.ledger.settle(&ticket);
                        state.data = state.replay();
                    }
                }
                state.error = Some(err.clone());
                warn!(op = %ticket.id, error = %err, "confirmation failed; rolled back");
                shared.announce(state, Transition::RolledBack);
                None
            }
        }
    }
}
