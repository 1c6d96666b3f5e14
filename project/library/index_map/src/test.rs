use crate::{Index, IndexMap};

crate::index!(struct Slot);

#[test]
fn insert_returns_consecutive_indices() {
    let mut map = IndexMap::<Slot, &str>::new();

    let first = map.insert("alpha");
    let second = map.insert("beta");

    assert_eq!(first.value(), 0);
    assert_eq!(second.value(), 1);
    assert_eq!(map[second], "beta");
    assert_eq!(map.last_index(), Some(second));
}

#[test]
fn insert_with_sees_own_index() {
    let mut map = IndexMap::<Slot, usize>::new();
    map.insert(7);

    let index = map.insert_with(|index| index.value() * 10);

    assert_eq!(map[index], 10);
}

#[test]
fn iteration_pairs_values_with_indices() {
    let map: IndexMap<Slot, char> = "xyz".chars().collect();

    let pairs: Vec<_> = map.iter().map(|(index, &value)| (index.value(), value)).collect();

    assert_eq!(pairs, vec![(0, 'x'), (1, 'y'), (2, 'z')]);
}

#[test]
fn empty_map_has_no_last_index() {
    let map = IndexMap::<Slot, ()>::new();

    assert!(map.is_empty());
    assert_eq!(map.last_index(), None);
    assert!(map.get(Slot::new(0)).is_none());
}
