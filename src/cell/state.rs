use serde::Serialize;

use crate::error::{serialize_message, MutationError};

/// What consumers of a cell read.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimisticState<T> {
    /// The visible value, speculative or confirmed.
    pub data: T,
    /// True while a mutation is waiting for its confirmation.
    pub is_optimistic: bool,
    /// Most recent confirmation failure.
    #[serde(serialize_with = "serialize_message")]
    pub error: Option<MutationError>,
}

impl<T> OptimisticState<T> {
    pub fn is_confirmed(&self) -> bool {
        !self.is_optimistic
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
