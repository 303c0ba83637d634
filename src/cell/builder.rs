use std::sync::Arc;

use crate::error::MutationError;
use crate::hooks::Hooks;
use crate::snapshot::{OptimisticConfig, RollbackPolicy};

use super::cell::OptimisticCell;
use super::state::OptimisticState;

/// Configures an [`OptimisticCell`] before it is created.
pub struct CellBuilder<T> {
    initial: T,
    config: OptimisticConfig,
    hooks: Hooks<OptimisticState<T>>,
}

impl<T> CellBuilder<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(initial: T) -> Self {
        CellBuilder {
            initial,
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

    /// Called with the new state after each confirmation.
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&OptimisticState<T>) + Send + Sync + 'static,
    {
        self.hooks.on_success = Some(Arc::new(hook));
        self
    }

    /// Called with the error and the rolled-back state after each failure.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MutationError, &OptimisticState<T>) + Send + Sync + 'static,
    {
        self.hooks.on_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> OptimisticCell<T> {
        OptimisticCell::from_parts(self.initial, self.config.rollback, self.hooks)
    }
}
