use std::sync::Arc;

use crate::entity::{position, Keyed, Patch};

/// A speculative change recorded in the collection's ledger.
pub(crate) enum PendingOp<T: Keyed> {
    Add(T),
    Update(T::Key, Arc<dyn Patch<T>>),
    Remove(T::Key),
}

impl<T> PendingOp<T>
where
    T: Keyed + Clone + 'static,
{
    pub(crate) fn key(&self) -> &T::Key {
        match self {
            PendingOp::Add(item) => item.key(),
            PendingOp::Update(key, _) | PendingOp::Remove(key) => key,
        }
    }

    /// Apply this change to `items`. Changes whose target is gone are
    /// skipped.
    pub(crate) fn apply(&self, items: &mut Vec<T>) {
        match self {
            PendingOp::Add(item) => {
                if position(items, item.key()).is_none() {
                    items.insert(0, item.clone());
                }
            }
            PendingOp::Update(key, patch) => {
                if let Some(index) = position(items, key) {
                    patch.apply(&mut items[index]);
                }
            }
            PendingOp::Remove(key) => items.retain(|item| item.key() != key),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            PendingOp::Add(_) => "add",
            PendingOp::Update(..) => "update",
            PendingOp::Remove(_) => "remove",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: &'static str,
        n: i32,
    }

    impl Keyed for Row {
        type Key = &'static str;

        fn key(&self) -> &&'static str {
            &self.id
        }
    }

    fn rows() -> Vec<Row> {
        vec![Row { id: "a", n: 1 }, Row { id: "b", n: 2 }]
    }

    #[test]
    fn add_prepends_once() {
        let mut items = rows();
        let op = PendingOp::Add(Row { id: "c", n: 3 });
        op.apply(&mut items);
        op.apply(&mut items);
        assert_eq!(items.iter().map(|r| r.id).collect::<Vec<_>>(), vec!["c", "a", "b"]);
        assert_eq!(op.key(), &"c");
    }

    #[test]
    fn update_patches_in_place() {
        let mut items = rows();
        let op: PendingOp<Row> = PendingOp::Update("b", Arc::new(|row: &mut Row| row.n *= 10));
        op.apply(&mut items);
        assert_eq!(items[1], Row { id: "b", n: 20 });
    }

    #[test]
    fn update_of_missing_item_is_skipped() {
        let mut items = rows();
        let op: PendingOp<Row> = PendingOp::Update("z", Arc::new(|row: &mut Row| row.n = 0));
        op.apply(&mut items);
        assert_eq!(items, rows());
    }

    #[test]
    fn remove_filters() {
        let mut items = rows();
        PendingOp::Remove("a").apply(&mut items);
        assert_eq!(items, vec![Row { id: "b", n: 2 }]);
    }
}
