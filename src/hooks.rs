//! Success and error hooks, and the panic guard shared with observers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use crate::error::MutationError;

/// Called with the confirmed state after a confirmation was merged.
pub(crate) type SuccessHook<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Called with the error and the rolled-back state after a failure.
pub(crate) type ErrorHook<S> = Arc<dyn Fn(&MutationError, &S) + Send + Sync>;

/// Hooks supplied at construction time. Purely observational.
pub struct Hooks<S: ?Sized> {
    pub(crate) on_success: Option<SuccessHook<S>>,
    pub(crate) on_error: Option<ErrorHook<S>>,
}

impl<S: ?Sized> Default for Hooks<S> {
    fn default() -> Self {
        Hooks {
            on_success: None,
            on_error: None,
        }
    }
}

impl<S: ?Sized> Clone for Hooks<S> {
    fn clone(&self) -> Self {
        Hooks {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<S: ?Sized> Hooks<S> {
    pub(crate) fn success(&self, state: &S) {
        if let Some(hook) = &self.on_success {
            guarded("on_success", || hook(state));
        }
    }

    pub(crate) fn failure(&self, err: &MutationError, state: &S) {
        if let Some(hook) = &self.on_error {
            guarded("on_error", || hook(err, state));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.on_success.is_none() && self.on_error.is_none()
    }
}

/// Run a caller-supplied callback, containing any panic it raises.
///
/// Returns false if the callback panicked.
pub(crate) fn guarded<F: FnOnce()>(callback: &'static str, f: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(callback, panic = %message, "callback panicked; state is unaffected");
            false
        }
    }
}
