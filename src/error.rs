use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Boxed error accepted from confirm functions.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Why an optimistic mutation did not stick.
///
/// Cloneable so the most recent failure can be kept in state views that are
/// handed out to observers and hooks.
#[derive(Debug, Clone, Error)]
pub enum MutationError {
    /// The confirm function failed. The speculative change was rolled back.
    #[error("confirmation rejected: {0}")]
    Rejected(#[source] Arc<dyn Error + Send + Sync>),
    /// The confirm function did not settle within the given limit.
    #[error("confirmation timed out after {0:?}")]
    TimedOut(Duration),
    /// Update or remove targeted a key that is not in the collection.
    #[error("no item with key {0}")]
    UnknownKey(String),
    /// Add used a key that is already in the collection.
    #[error("an item with key {0} already exists")]
    DuplicateKey(String),
}

impl MutationError {
    /// Convert a confirm function's error.
    ///
    /// Errors that already are a `MutationError` (for example from
    /// [`crate::timeout::within`]) are kept as they are.
    pub fn from_confirm<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        match err.into().downcast::<MutationError>() {
            Ok(typed) => *typed,
            Err(other) => MutationError::Rejected(Arc::from(other)),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, MutationError::Rejected(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, MutationError::TimedOut(_))
    }

    /// True for errors caused by calling the collection with a bad key.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            MutationError::UnknownKey(_) | MutationError::DuplicateKey(_)
        )
    }
}

/// Serializes an optional error as its display string.
pub(crate) fn serialize_message<S>(
    error: &Option<MutationError>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    error
        .as_ref()
        .map(ToString::to_string)
        .serialize(serializer)
}
