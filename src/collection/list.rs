use std::collections::HashSet;

use serde::Serialize;

use crate::entity::{position, Keyed};
use crate::error::{serialize_message, MutationError};

/// What consumers of a collection read.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(serialize = "T: Serialize, T::Key: Serialize"))]
pub struct OptimisticList<T: Keyed> {
    /// Visible items in display order.
    pub items: Vec<T>,
    /// Keys of items added, updated or removed but not confirmed yet.
    pub optimistic_ids: HashSet<T::Key>,
    pub is_optimistic: bool,
    #[serde(serialize_with = "serialize_message")]
    pub error: Option<MutationError>,
}

impl<T: Keyed> OptimisticList<T> {
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        position(&self.items, key).map(|index| &self.items[index])
    }

    /// True if the item with `key` carries an unconfirmed mutation.
    pub fn is_pending(&self, key: &T::Key) -> bool {
        self.optimistic_ids.contains(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
