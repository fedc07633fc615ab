use super::*;

#[test]
fn removed_handles_stay_dead_after_slot_reuse() {
    let mut arena = Arena::new();
    let a = arena.insert("a");
    assert_eq!(arena.remove(a), Some("a"));

    let b = arena.insert("b");
    assert!(!arena.contains(a));
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.get(b), Some(&"b"));
    assert_eq!(arena.remove(a), None);
    assert_eq!(arena.len(), 1);
}

#[test]
fn iteration_follows_insertion_order_not_slot_order() {
    let mut arena = Arena::new();
    let first = arena.insert(1);
    let _second = arena.insert(2);
    arena.remove(first);
    let _third = arena.insert(3); // lands in slot 0

    let values: Vec<i32> = arena.iter_ordered().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![2, 3]);
}

#[test]
fn sequence_numbers_increase_monotonically() {
    let mut arena = Arena::new();
    let a = arena.insert(());
    let b = arena.insert(());
    assert!(arena.seq(a).unwrap() < arena.seq(b).unwrap());
    arena.remove(a);
    assert!(!arena.is_empty());
    arena.remove(b);
    assert!(arena.is_empty());
}
