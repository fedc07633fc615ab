use super::*;
use std::cell::Cell;

#[test]
fn tick_forwards_elapsed_time_in_registration_order() {
    let clock = Clock::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = Rc::clone(&log);
    clock.register(move |dt| {
        l.borrow_mut().push(("a", dt));
        Ok(())
    });
    let l = Rc::clone(&log);
    clock.register(move |dt| {
        l.borrow_mut().push(("b", dt));
        Ok(())
    });

    clock.tick(16.0).unwrap();
    assert_eq!(*log.borrow(), vec![("a", 16.0), ("b", 16.0)]);
    assert_eq!(clock.elapsed_total(), 16.0);
}

#[test]
fn drivers_added_mid_tick_wait_for_the_next_tick() {
    let clock = Clock::new();
    let late_calls = Rc::new(Cell::new(0));

    let inner_clock = clock.clone();
    let calls = Rc::clone(&late_calls);
    let added = Rc::new(Cell::new(false));
    clock.register(move |_| {
        if !added.replace(true) {
            let calls = Rc::clone(&calls);
            inner_clock.register(move |_| {
                calls.set(calls.get() + 1);
                Ok(())
            });
        }
        Ok(())
    });

    clock.tick(1.0).unwrap();
    assert_eq!(late_calls.get(), 0);
    clock.tick(1.0).unwrap();
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn drivers_removed_mid_tick_are_skipped() {
    let clock = Clock::new();
    let victim_calls = Rc::new(Cell::new(0));
    let victim: Rc<Cell<Option<DriverId>>> = Rc::new(Cell::new(None));

    let inner_clock = clock.clone();
    let target = Rc::clone(&victim);
    clock.register(move |_| {
        if let Some(id) = target.get() {
            inner_clock.unregister(id);
        }
        Ok(())
    });
    let calls = Rc::clone(&victim_calls);
    let id = clock.register(move |_| {
        calls.set(calls.get() + 1);
        Ok(())
    });
    victim.set(Some(id));

    clock.tick(1.0).unwrap();
    assert_eq!(victim_calls.get(), 0);
    assert!(!clock.unregister(id));
    assert_eq!(clock.driver_count(), 1);
}

#[test]
fn invalid_ticks_are_rejected() {
    let clock = Clock::new();
    assert!(matches!(clock.tick(-1.0), Err(ChoreoError::Validation(_))));
    assert!(matches!(clock.tick(f64::NAN), Err(ChoreoError::Validation(_))));
    assert!(matches!(clock.run(0.0, 10.0), Err(ChoreoError::Validation(_))));
}

#[test]
fn run_stops_when_idle() {
    let clock = Clock::new();
    let remaining = Rc::new(Cell::new(3));
    let slot: Rc<Cell<Option<DriverId>>> = Rc::new(Cell::new(None));

    let inner_clock = clock.clone();
    let r = Rc::clone(&remaining);
    let s = Rc::clone(&slot);
    let id = clock.register(move |_| {
        r.set(r.get() - 1);
        if r.get() == 0 {
            if let Some(id) = s.get() {
                inner_clock.unregister(id);
            }
        }
        Ok(())
    });
    slot.set(Some(id));

    let consumed = clock.run(10.0, 1_000.0).unwrap();
    assert_eq!(consumed, 30.0);
    assert!(clock.is_idle());
}
