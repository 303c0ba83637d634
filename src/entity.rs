use std::fmt;
use std::hash::Hash;

/// An entity with a stable identity.
///
/// The collection uses the key to find the item an operation targets and to
/// track which items carry an unconfirmed mutation. Keys must be unique
/// within one collection.
pub trait Keyed {
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn key(&self) -> &Self::Key;
}

/// A partial update merged into an entity in place.
///
/// Closures `Fn(&mut T)` are patches, so most call sites pass one directly:
///
/// ```ignore
/// tasks.update_item(&id, |task: &mut Task| task.title = "Renamed".into(), confirm);
/// ```
///
/// Patches are shared (`Send + Sync`) because the isolated rollback policy
/// re-applies pending patches whenever it rebuilds the visible list.
pub trait Patch<T>: Send + Sync + 'static {
    fn apply(&self, target: &mut T);
}

impl<T, F> Patch<T> for F
where
    F: Fn(&mut T) + Send + Sync + 'static,
{
    fn apply(&self, target: &mut T) {
        self(target)
    }
}

/// Position of the item with `key`, if any.
pub(crate) fn position<T: Keyed>(items: &[T], key: &T::Key) -> Option<usize> {
    items.iter().position(|item| item.key() == key)
}
