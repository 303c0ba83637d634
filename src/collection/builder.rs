use std::sync::Arc;

use crate::entity::Keyed;
use crate::error::MutationError;
use crate::hooks::Hooks;
use crate::snapshot::{OptimisticConfig, RollbackPolicy};

use super::collection::OptimisticCollection;
use super::list::OptimisticList;

/// Configures an [`OptimisticCollection`] before it is created.
pub struct CollectionBuilder<T: Keyed> {
    items: Vec<T>,
    config: OptimisticConfig,
    hooks: Hooks<OptimisticList<T>>,
}

impl<T> CollectionBuilder<T>
where
    T: Keyed + Clone + Send + 'static,
{
    pub fn new(items: Vec<T>) -> Self {
        CollectionBuilder {
            items,
            config: OptimisticConfig::default(),
            hooks: Hooks::default(),
        }
    }

    pub fn config(mut self, config: OptimisticConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rollback(mut self, policy: RollbackPolicy) -> Self {
        self.config.rollback = policy;
        self
    }

    /// Called with the list after each confirmation.
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&OptimisticList<T>) + Send + Sync + 'static,
    {
        self.hooks.on_success = Some(Arc::new(hook));
        self
    }

    /// Called with the error and the rolled-back list after each failure or
    /// refused call.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MutationError, &OptimisticList<T>) + Send + Sync + 'static,
    {
        self.hooks.on_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> OptimisticCollection<T> {
        OptimisticCollection::from_parts(self.items, self.config.rollback, self.hooks)
    }
}
