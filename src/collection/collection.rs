use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use crate::confirm::{settled, Confirmation};
use crate::entity::{position, Keyed, Patch};
use crate::error::{BoxError, MutationError};
use crate::hooks::Hooks;
use crate::observer::{Observers, Subscription, Transition};
use crate::snapshot::{Ledger, OpId, RollbackPolicy, Ticket};

use super::builder::CollectionBuilder;
use super::list::OptimisticList;
use super::pending::PendingOp;

struct CollectionState<T: Keyed> {
    items: Vec<T>,
    /// Authoritative items. Only maintained under `RollbackPolicy::Isolated`.
    confirmed: Vec<T>,
    /// Per key, the operation whose confirmation is in `confirmed`. Pending
    /// operations on that key that started earlier no longer apply.
    confirmed_by: HashMap<T::Key, OpId>,
    /// Items as they were before the most recent mutation started.
    previous: Option<Vec<T>>,
    optimistic_ids: HashSet<T::Key>,
    ledger: Ledger<PendingOp<T>>,
    error: Option<MutationError>,
}

impl<T> CollectionState<T>
where
    T: Keyed + Clone + 'static,
{
    fn view(&self) -> OptimisticList<T> {
        OptimisticList {
            items: self.items.clone(),
            optimistic_ids: self.optimistic_ids.clone(),
            is_optimistic: !self.optimistic_ids.is_empty(),
            error: self.error.clone(),
        }
    }

    /// Rebuild the visible items from the confirmed items and the ledger.
    fn replay(&mut self) {
        let mut items = self.confirmed.clone();
        for (id, op) in self.ledger.entries() {
            if self.confirmed_by.get(op.key()).map_or(true, |by| id > *by) {
                op.apply(&mut items);
            }
        }
        self.items = items;
        self.optimistic_ids = self.ledger.iter().map(|op| op.key().clone()).collect();

        let pending = &self.optimistic_ids;
        self.confirmed_by.retain(|key, _| pending.contains(key));
    }

    /// Capture the snapshot, record `op` and apply it to the visible items.
    fn speculate(&mut self, op: PendingOp<T>) -> Ticket {
        let key = op.key().clone();
        self.previous = Some(self.items.clone());
        op.apply(&mut self.items);
        self.optimistic_ids.insert(key);
        self.error = None;
        self.ledger.push(op)
    }

    fn merge(&mut self, policy: RollbackPolicy, ticket: &Ticket, key: &T::Key, confirmed: Option<T>) {
        match policy {
            RollbackPolicy::Latest => {
                self.ledger.settle(ticket);
                if let Some(item) = confirmed {
                    if let Some(index) = position(&self.items, key) {
                        self.items[index] = item;
                    }
                }
                self.optimistic_ids.remove(key);
            }
            RollbackPolicy::Isolated => {
                self.ledger.settle(ticket);
                let newest = self.confirmed_by.get(key).map_or(true, |by| ticket.id > *by);
                if newest {
                    self.confirmed_by.insert(key.clone(), ticket.id);
                    match (confirmed, position(&self.confirmed, key)) {
                        (Some(item), Some(index)) => self.confirmed[index] = item,
                        // not confirmed yet, e.g. an update that overtook its add
                        (Some(item), None) => {
                            let at = position(&self.items, key)
                                .unwrap_or(0)
                                .min(self.confirmed.len());
                            self.confirmed.insert(at, item);
                        }
                        (None, _) => self.confirmed.retain(|item| item.key() != key),
                    }
                }
                self.replay();
            }
        }
        self.error = None;
    }

    fn roll_back(&mut self, policy: RollbackPolicy, ticket: &Ticket, err: MutationError) {
        match policy {
            RollbackPolicy::Latest => {
                if let Some(previous) = self.previous.clone() {
                    self.items = previous;
                }
                self.optimistic_ids.clear();
                self.ledger.abandon_all();
            }
            RollbackPolicy::Isolated => {
                self.ledger.settle(ticket);
                self.replay();
            }
        }
        self.error = Some(err);
    }
}

pub(super) struct Shared<T: Keyed> {
    state: Mutex<CollectionState<T>>,
    observers: Observers<OptimisticList<T>>,
    hooks: Hooks<OptimisticList<T>>,
    policy: RollbackPolicy,
}

/// An ordered, keyed list with optimistic add, update and remove.
///
/// Each mutation is visible as soon as the call returns. Its confirmation
/// either merges the authoritative item or rolls the list back. Cloning hands
/// out another handle to the same collection.
pub struct OptimisticCollection<T: Keyed> {
    shared: Arc<Shared<T>>,
}

impl<T: Keyed> Clone for OptimisticCollection<T> {
    fn clone(&self) -> Self {
        OptimisticCollection {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> OptimisticCollection<T>
where
    T: Keyed + Clone + Send + 'static,
{
    pub fn new(items: Vec<T>) -> Self {
        Self::builder(items).build()
    }

    pub fn builder(items: Vec<T>) -> CollectionBuilder<T> {
        CollectionBuilder::new(items)
    }

    pub(super) fn from_parts(
        items: Vec<T>,
        policy: RollbackPolicy,
        hooks: Hooks<OptimisticList<T>>,
    ) -> Self {
        warn_on_duplicate_keys(&items);
        let state = CollectionState {
            confirmed: items.clone(),
            confirmed_by: HashMap::new(),
            items,
            previous: None,
            optimistic_ids: HashSet::new(),
            ledger: Ledger::new(),
            error: None,
        };
        OptimisticCollection {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                observers: Observers::new(),
                hooks,
                policy,
            }),
        }
    }

    /// Prepend `item` now and confirm it with `confirm`.
    ///
    /// Resolves to the authoritative item, or `None` if the confirm function
    /// failed or an item with the same key is already in the list (the
    /// confirm function is not called in that case).
    pub fn add_item<F, Fut, E>(&self, item: T, confirm: F) -> Confirmation<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let key = item.key().clone();
        let state = self.shared.lock();
        if position(&state.items, &key).is_some() {
            self.shared
                .refuse(state, MutationError::DuplicateKey(format!("{:?}", key)));
            return settled(None);
        }
        self.start(state, PendingOp::Add(item), key, confirm)
    }

    /// Merge `patch` into the item with `key` now and confirm it with
    /// `confirm`.
    ///
    /// Resolves to the authoritative item, or `None` on failure or when no
    /// item has `key`.
    pub fn update_item<P, F, Fut, E>(
        &self,
        key: &T::Key,
        patch: P,
        confirm: F,
    ) -> Confirmation<Option<T>>
    where
        P: Patch<T>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let state = self.shared.lock();
        if position(&state.items, key).is_none() {
            self.shared
                .refuse(state, MutationError::UnknownKey(format!("{:?}", key)));
            return settled(None);
        }
        let op = PendingOp::Update(key.clone(), Arc::new(patch));
        self.start(state, op, key.clone(), confirm)
    }

    /// Take the item with `key` out of the list now and confirm the removal
    /// with `confirm`. Whatever the confirm function returns is ignored.
    ///
    /// Resolves to true once the removal is confirmed.
    pub fn remove_item<F, Fut, R, E>(&self, key: &T::Key, confirm: F) -> Confirmation<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: 'static,
        E: Into<BoxError> + 'static,
    {
        let mut state = self.shared.lock();
        if position(&state.items, key).is_none() {
            self.shared
                .refuse(state, MutationError::UnknownKey(format!("{:?}", key)));
            return settled(false);
        }

        let ticket = state.speculate(PendingOp::Remove(key.clone()));
        debug!(op = %ticket.id, kind = "remove", key = ?key, "speculative change applied");
        self.shared.announce(state, Transition::Speculative);

        let pending = confirm();
        let shared = Arc::downgrade(&self.shared);
        let key = key.clone();
        Box::pin(async move {
            let outcome = pending.await.map(|_| None).map_err(MutationError::from_confirm);
            Shared::settle(&shared, ticket, &key, outcome)
        })
    }

    /// Adopt `items` as authoritative.
    ///
    /// Clears every optimistic marker and snapshot. Confirmations still in
    /// flight settle without changing the list.
    pub fn set_items(&self, items: Vec<T>) {
        warn_on_duplicate_keys(&items);
        let mut state = self.shared.lock();
        state.items = items.clone();
        state.confirmed = items;
        state.confirmed_by.clear();
        state.previous = None;
        state.optimistic_ids.clear();
        state.ledger.rebase();
        state.error = None;
        debug!(len = state.items.len(), "items replaced with authoritative list");
        self.shared.announce(state, Transition::Replaced);
    }

    pub fn items(&self) -> Vec<T> {
        self.shared.lock().items.clone()
    }

    pub fn get(&self, key: &T::Key) -> Option<T> {
        let state = self.shared.lock();
        position(&state.items, key).map(|index| state.items[index].clone())
    }

    pub fn optimistic_ids(&self) -> HashSet<T::Key> {
        self.shared.lock().optimistic_ids.clone()
    }

    pub fn is_optimistic(&self) -> bool {
        !self.shared.lock().optimistic_ids.is_empty()
    }

    /// True if the item with `key` carries an unconfirmed mutation.
    pub fn is_pending(&self, key: &T::Key) -> bool {
        self.shared.lock().optimistic_ids.contains(key)
    }

    pub fn error(&self) -> Option<MutationError> {
        self.shared.lock().error.clone()
    }

    pub fn state(&self) -> OptimisticList<T> {
        self.shared.lock().view()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.shared.policy
    }

    pub fn observers(&self) -> &Observers<OptimisticList<T>> {
        &self.shared.observers
    }

    /// Register `callback` for every transition. See [`Observers`] for
    /// ordering across concurrent settlements.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Transition, &OptimisticList<T>) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(callback)
    }

    fn start<F, Fut, E>(
        &self,
        mut state: MutexGuard<'_, CollectionState<T>>,
        op: PendingOp<T>,
        key: T::Key,
        confirm: F,
    ) -> Confirmation<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let kind = op.name();
        let ticket = state.speculate(op);
        debug!(op = %ticket.id, kind, key = ?key, "speculative change applied");
        self.shared.announce(state, Transition::Speculative);

        let pending = confirm();
        let shared = Arc::downgrade(&self.shared);
        Box::pin(async move {
            let outcome = pending.await.map_err(MutationError::from_confirm);
            let confirmed = outcome.as_ref().ok().cloned();
            Shared::settle(&shared, ticket, &key, outcome.map(Some));
            confirmed
        })
    }
}

impl<T> Shared<T>
where
    T: Keyed + Clone + Send + 'static,
{
    fn lock(&self) -> MutexGuard<'_, CollectionState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release the lock, then tell observers and hooks.
    fn announce(&self, state: MutexGuard<'_, CollectionState<T>>, transition: Transition) {
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

    /// Report a caller mistake without touching the items.
    ///
    /// The error is only kept in state while nothing is in flight, so a
    /// visible error still means no change is pending.
    fn refuse(&self, mut state: MutexGuard<'_, CollectionState<T>>, err: MutationError) {
        let in_flight = state.optimistic_ids.len();
        warn!(error = %err, in_flight, "optimistic mutation refused");
        if in_flight == 0 {
            state.error = Some(err.clone());
        }
        if self.observers.is_empty() && self.hooks.is_empty() {
            return;
        }
        let view = state.view();
        drop(state);

        self.observers.notify(Transition::Refused, &view);
        self.hooks.failure(&err, &view);
    }

    /// Apply a settled confirmation. Returns true if it succeeded.
    fn settle(
        shared: &Weak<Self>,
        ticket: Ticket,
        key: &T::Key,
        outcome: Result<Option<T>, MutationError>,
    ) -> bool {
        let Some(shared) = shared.upgrade() else {
            debug!(op = %ticket.id, "collection dropped before confirmation settled");
            return outcome.is_ok();
        };

        let mut state = shared.lock();
        if !state.ledger.is_current(&ticket) {
            debug!(op = %ticket.id, "confirmation settled after the items were replaced; ignored");
            return outcome.is_ok();
        }

        match outcome {
            Ok(confirmed) => {
                state.merge(shared.policy, &ticket, key, confirmed);
                debug!(op = %ticket.id, key = ?key, pending = state.optimistic_ids.len(), "confirmed");
                shared.announce(state, Transition::Confirmed);
                true
            }
            Err(err) => {
                warn!(op = %ticket.id, key = ?key, error = %err, "confirmation failed; rolled back");
                state.roll_back(shared.policy, &ticket, err);
                shared.announce(state, Transition::RolledBack);
                false
            }
        }
    }
}

fn warn_on_duplicate_keys<T: Keyed>(items: &[T]) {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.key()) {
            warn!(key = ?item.key(), "duplicate key in collection items");
        }
    }
}
