use std::cmp::Ordering;

use crate::model::entry::Entry;
use crate::model::group::Group;

/// Items that can be placed in a user-chosen order.
pub trait Sortable: Clone {
    fn id(&self) -> &str;
    fn sort_order(&self) -> Option<i64>;
    fn set_sort_order(&mut self, order: i64);
    fn created_at(&self) -> i64;
}

impl Sortable for Entry {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_order(&self) -> Option<i64> {
        self.sort_order
    }

    fn set_sort_order(&mut self, order: i64) {
        self.sort_order = Some(order);
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl Sortable for Group {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_order(&self) -> Option<i64> {
        Some(self.sort_order)
    }

    fn set_sort_order(&mut self, order: i64) {
        self.sort_order = order;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// The ordering predicate: explicit `sort_order` ascending, then items without
/// one, which order among themselves by `created_at`.
pub fn compare<T: Sortable>(a: &T, b: &T) -> Ordering {
    match (a.sort_order(), b.sort_order()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at().cmp(&b.created_at()),
    }
}

/// A list of items presented in their user-chosen order.
#[derive(Debug, Clone, Default)]
pub struct OrderedCollection<T> {
    items: Vec<T>,
}

impl<T: Sortable> OrderedCollection<T> {
    pub fn new(items: Vec<T>) -> Self {
        OrderedCollection { items }
    }

    /// Items in the order they were supplied
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items sorted by [`compare`]. The sort is stable, so equal keys keep
    /// their input order.
    pub fn sorted(&self) -> Vec<T> {
        sorted(&self.items)
    }

    /// Copy of `new_order` with `sort_order` rewritten to `0..len-1`.
    pub fn reindexed(new_order: &[T]) -> Vec<T> {
        reindexed(new_order)
    }
}

/// Sorted copy of `items`; see [`OrderedCollection::sorted`].
pub fn sorted<T: Sortable>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort_by(compare);
    out
}

/// Copy of `new_order` with dense zero-based `sort_order` values.
pub fn reindexed<T: Sortable>(new_order: &[T]) -> Vec<T> {
    new_order
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut item = item.clone();
            item.set_sort_order(index as i64);
            item
        })
        .collect()
}

/// Remove the element at `from` and reinsert it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Move `dragged_id` to the position currently held by `target_id`.
///
/// Returns `None` when either id is absent from `order` or both are the same
/// item, i.e. when the drop would not change anything.
pub fn move_to_target<T: Sortable>(order: &[T], dragged_id: &str, target_id: &str) -> Option<Vec<T>> {
    let from = order.iter().position(|item| item.id() == dragged_id)?;
    let to = order.iter().position(|item| item.id() == target_id)?;
    if from == to {
        return None;
    }
    let mut moved = order.to_vec();
    array_move(&mut moved, from, to);
    Some(moved)
}

/// True when the items carry exactly the orders `0..len-1` in sequence.
pub fn is_dense<T: Sortable>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.sort_order() == Some(index as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, sort_order: Option<i64>, created_at: i64) -> Entry {
        let mut e = Entry::new(id, id, created_at);
        e.sort_order = sort_order;
        e
    }

    fn ids<T: Sortable>(items: &[T]) -> Vec<&str> {
        items.iter().map(|i| i.id()).collect()
    }

    #[test]
    fn ordered_items_come_before_unordered() {
        let items = vec![
            entry("late", None, 1),
            entry("second", Some(1), 50),
            entry("first", Some(0), 99),
        ];
        let sorted = OrderedCollection::new(items).sorted();
        assert_eq!(ids(&sorted), vec!["first", "second", "late"]);
    }

    #[test]
    fn unordered_items_sort_by_creation_time() {
        let items = vec![entry("c", None, 30), entry("a", None, 10), entry("b", None, 20)];
        assert_eq!(ids(&sorted(&items)), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let items = vec![
            entry("x", Some(2), 5),
            entry("y", Some(2), 1),
            entry("p", None, 7),
            entry("q", None, 7),
        ];
        assert_eq!(ids(&sorted(&items)), vec!["x", "y", "p", "q"]);
    }

    #[test]
    fn sorted_does_not_mutate_input() {
        let collection = OrderedCollection::new(vec![entry("b", Some(1), 0), entry("a", Some(0), 0)]);
        let _ = collection.sorted();
        assert_eq!(ids(collection.items()), vec!["b", "a"]);
    }

    #[test]
    fn reindexed_is_dense_and_leaves_input_alone() {
        let input = vec![entry("a", Some(7), 0), entry("b", None, 0), entry("c", Some(7), 0)];
        let out = OrderedCollection::reindexed(&input);
        assert!(is_dense(&out));
        assert_eq!(
            out.iter().map(|e| e.sort_order).collect::<Vec<_>>(),
            vec![Some(0), Some(1), Some(2)]
        );
        assert_eq!(input[0].sort_order, Some(7));
        assert_eq!(input[1].sort_order, None);
    }

    #[test]
    fn array_move_forward_and_backward() {
        let mut v = vec![1, 2, 3, 4];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec![2, 3, 1, 4]);
        array_move(&mut v, 3, 0);
        assert_eq!(v, vec![4, 2, 3, 1]);
    }

    #[test]
    fn array_move_out_of_range_is_ignored() {
        let mut v = vec![1, 2];
        array_move(&mut v, 0, 5);
        assert_eq!(v, vec![1, 2]);
    }

    #[test]
    fn move_to_target_takes_target_position() {
        let order = vec![entry("1", Some(0), 0), entry("2", Some(1), 0), entry("3", Some(2), 0)];
        let moved = move_to_target(&order, "3", "1").unwrap();
        assert_eq!(ids(&moved), vec!["3", "1", "2"]);
        let moved = move_to_target(&order, "1", "3").unwrap();
        assert_eq!(ids(&moved), vec!["2", "3", "1"]);
    }

    #[test]
    fn move_to_target_rejects_self_and_unknown() {
        let order = vec![entry("1", Some(0), 0), entry("2", Some(1), 0)];
        assert!(move_to_target(&order, "1", "1").is_none());
        assert!(move_to_target(&order, "1", "9").is_none());
        assert!(move_to_target(&order, "9", "1").is_none());
    }

    #[test]
    fn groups_sort_by_their_order() {
        let groups = vec![Group::new("b", "B", 1, 0), Group::new("a", "A", 0, 5)];
        assert_eq!(ids(&sorted(&groups)), vec!["a", "b"]);
    }
}
