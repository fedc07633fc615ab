use super::*;
use std::cell::Cell;

use crate::foundation::error::ChoreoError;

fn collect<T: Clone + 'static>(emitter: &Emitter<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = emitter
        .subscribe(move |v: &T| sink.borrow_mut().push(v.clone()))
        .unwrap();
    (seen, sub)
}

#[test]
fn map_and_filter_compose_without_touching_the_parent() {
    let source = EventSource::<i32>::new();
    let base = source.emitter();
    let doubled_odd = base.filter(|v| v % 2 == 1).map(|v| v * 2);

    let (raw, _raw_sub) = collect(&base);
    let (derived, _derived_sub) = collect(&doubled_odd);
    for v in 1..=5 {
        source.emit(&v).unwrap();
    }

    assert_eq!(*raw.borrow(), vec![1, 2, 3, 4, 5]);
    assert_eq!(*derived.borrow(), vec![2, 6, 10]);
}

#[test]
fn unsubscribe_detaches_only_that_listener() {
    let source = EventSource::<i32>::new();
    let emitter = source.emitter().map(|v| *v);
    let (a, sub_a) = collect(&emitter);
    let (b, _sub_b) = collect(&emitter);
    assert_eq!(source.listener_count(), 2);

    source.emit(&1).unwrap();
    sub_a.unsubscribe();
    source.emit(&2).unwrap();

    assert_eq!(*a.borrow(), vec![1]);
    assert_eq!(*b.borrow(), vec![1, 2]);
    assert_eq!(source.listener_count(), 1);
}

#[test]
fn dedupe_drops_consecutive_repeats() {
    let source = EventSource::<i32>::new();
    let (out, _sub) = collect(&source.emitter().dedupe());
    let input = [1, 1, 2, 2, 2, 3, 1, 1, 4];
    for v in input {
        source.emit(&v).unwrap();
    }

    let mut expected: Vec<i32> = input.to_vec();
    expected.dedup();
    assert_eq!(*out.borrow(), expected);
    assert!(out.borrow().windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn dedupe_by_uses_the_supplied_comparator() {
    let source = EventSource::<f64>::new();
    let (out, _sub) = collect(&source.emitter().dedupe_by(|a, b| (a - b).abs() < 0.5));
    for v in [0.0, 0.2, 0.4, 1.0, 1.3, 3.0] {
        source.emit(&v).unwrap();
    }
    assert_eq!(*out.borrow(), vec![0.0, 1.0, 3.0]);
}

#[test]
fn dedupe_cursor_is_shared_between_subscribers() {
    let source = EventSource::<i32>::new();
    let deduped = source.emitter().dedupe();
    let (a, _sa) = collect(&deduped);
    let (b, _sb) = collect(&deduped);
    assert_eq!(source.listener_count(), 1);

    for v in [5, 5, 6] {
        source.emit(&v).unwrap();
    }
    assert_eq!(*a.borrow(), vec![5, 6]);
    assert_eq!(*b.borrow(), vec![5, 6]);
}

#[test]
fn tap_runs_once_per_emission_and_subscribes_lazily() {
    let source = EventSource::<i32>::new();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let tapped = source.emitter().tap(move |_| counter.set(counter.get() + 1));

    source.emit(&0).unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(source.listener_count(), 0);

    let (_a, sub_a) = collect(&tapped);
    let (_b, sub_b) = collect(&tapped);
    let (_c, sub_c) = collect(&tapped);
    assert_eq!(source.listener_count(), 1);

    source.emit(&1).unwrap();
    source.emit(&2).unwrap();
    assert_eq!(calls.get(), 2);

    sub_a.unsubscribe();
    sub_b.unsubscribe();
    assert_eq!(source.listener_count(), 1);
    sub_c.unsubscribe();
    assert_eq!(source.listener_count(), 0);

    source.emit(&3).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn fork_passes_self_and_returns_it() {
    let source = EventSource::<i32>::new();
    let branch_seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&branch_seen);
    let mut branch_sub = None;

    let main = source.emitter().fork(|e| {
        let sink = Rc::clone(&sink);
        branch_sub = Some(e.subscribe(move |v| sink.borrow_mut().push(*v)).unwrap());
    });
    let (main_seen, _sub) = collect(&main);

    source.emit(&7).unwrap();
    assert_eq!(*branch_seen.borrow(), vec![7]);
    assert_eq!(*main_seen.borrow(), vec![7]);
    assert!(branch_sub.is_some());
}

#[test]
fn handler_error_stops_the_dispatch() {
    let source = EventSource::<i32>::new();
    let emitter = source.emitter();
    let _failing = emitter
        .try_subscribe(|_| Err(ChoreoError::validation("nope")))
        .unwrap();
    let (after, _sub) = collect(&emitter);

    let err = source.emit(&1).unwrap_err();
    assert!(matches!(err, ChoreoError::Validation(_)));
    assert!(after.borrow().is_empty());
}

#[test]
fn listener_removed_mid_dispatch_is_skipped() {
    let source = EventSource::<i32>::new();
    let emitter = source.emitter();
    let victim_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&victim_slot);

    let _killer = emitter
        .subscribe(move |_| {
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        })
        .unwrap();
    let (victim_seen, victim_sub) = collect(&emitter);
    *victim_slot.borrow_mut() = Some(victim_sub);

    source.emit(&1).unwrap();
    assert!(victim_seen.borrow().is_empty());
    assert_eq!(source.listener_count(), 1);
}
