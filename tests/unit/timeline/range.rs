use super::*;
use std::cell::RefCell;

use crate::timeline::options::{EndAction, TimelineOpts};

fn record<T: Clone + 'static>(emitter: &Emitter<T>) -> Rc<RefCell<Vec<T>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    emitter
        .subscribe(move |v: &T| sink.borrow_mut().push(v.clone()))
        .unwrap();
    seen
}

fn span(range: &Range) -> (f64, f64) {
    (range.start_position(), range.duration())
}

#[test]
fn progress_tracks_the_playhead_and_clamps() {
    let timeline = Timeline::new();
    let range = timeline.range(200.0, 400.0);
    let seen = record(range.as_emitter());

    for to in [300.0, 500.0, 600.0, 900.0, 100.0] {
        timeline.seek(to).unwrap();
    }
    assert_eq!(*seen.borrow(), vec![0.25, 0.75, 1.0, 1.0, 0.0]);
    assert_eq!(range.progress_at(400.0), 0.5);
}

#[test]
fn subscribers_inside_the_range_catch_up() {
    let timeline = Timeline::new();
    timeline.seek(250.0).unwrap();

    let inside = record(timeline.range(200.0, 100.0).as_emitter());
    let outside = record(timeline.range(400.0, 100.0).as_emitter());
    assert_eq!(*inside.borrow(), vec![0.5]);
    assert!(outside.borrow().is_empty());
}

#[test]
fn catch_up_uses_the_folded_position_when_wrapping() {
    let timeline = Timeline::with_opts(TimelineOpts {
        at_end: EndAction::Wrap { at: 0.0 },
        ..TimelineOpts::default()
    })
    .unwrap();
    timeline.point(1000.0);
    timeline.seek(1250.0).unwrap();

    let seen = record(timeline.range(200.0, 100.0).as_emitter());
    assert_eq!(*seen.borrow(), vec![0.5]);
}

#[test]
fn failing_catch_up_leaves_nothing_registered() {
    let timeline = Timeline::new();
    let err = timeline
        .range(0.0, 100.0)
        .try_subscribe(|_| Err(anyhow::anyhow!("rejected").into()))
        .unwrap_err();
    assert!(matches!(err, ChoreoError::Other(_)));
    assert_eq!(timeline.live_range_count(), 0);
}

#[test]
fn zero_duration_ranges_reject_subscribers() {
    let timeline = Timeline::new();
    let err = timeline.range(10.0, 0.0).subscribe(|_| {}).unwrap_err();
    assert!(matches!(err, ChoreoError::Subscription(_)));
    assert_eq!(timeline.live_range_count(), 0);
}

#[test]
fn tween_scenarios() {
    let timeline = Timeline::new();
    let range = timeline.range(0.0, 1000.0);

    let numbers = record(&range.tween(0.0, 100.0).unwrap());
    let snapped = record(&range.snap(10).unwrap().tween(0.0, 100.0).unwrap());
    let arrays = record(&range.tween(vec![0.0, 10.0], vec![50.0, 100.0]).unwrap());

    timeline.seek(500.0).unwrap();
    assert_eq!(numbers.borrow().last(), Some(&50.0));
    assert_eq!(arrays.borrow().last(), Some(&vec![25.0, 55.0]));

    timeline.seek(480.0).unwrap();
    assert_eq!(snapped.borrow().last(), Some(&50.0));
    timeline.seek(840.0).unwrap();
    assert_eq!(snapped.borrow().last(), Some(&80.0));

    let mismatch = range.tween(vec![0.0, 10.0], vec![1.0, 2.0, 3.0]);
    assert!(matches!(mismatch, Err(ChoreoError::Tween(_))));
}

#[test]
fn repeat_scenario() {
    let timeline = Timeline::new();
    let seen = record(timeline.range(0.0, 100.0).repeat(2.0).as_emitter());
    seen.borrow_mut().clear();

    for to in [25.0, 49.999, 50.001, 75.0] {
        timeline.seek(to).unwrap();
    }
    let seen = seen.borrow();
    assert_eq!(seen[0], 0.5);
    assert!((seen[1] - 1.0).abs() < 1e-3);
    assert!(seen[2].abs() < 1e-3);
    assert_eq!(seen[3], 0.5);
}

#[test]
fn bisect_and_subdivide_tile_the_range() {
    let timeline = Timeline::new();
    let range = timeline.range(100.0, 200.0);

    let (left, right) = range.bisect();
    assert_eq!((span(&left), span(&right)), ((100.0, 100.0), (200.0, 100.0)));
    assert_eq!(left.end_position(), right.start_position());

    let (left, right) = range.bisect_at(500.0);
    assert_eq!((span(&left), span(&right)), ((100.0, 200.0), (300.0, 0.0)));

    let parts: Vec<_> = range.subdivide(4).iter().map(span).collect();
    assert_eq!(
        parts,
        vec![(100.0, 50.0), (150.0, 50.0), (200.0, 50.0), (250.0, 50.0)]
    );
}

#[test]
fn spread_excludes_the_bounds() {
    let timeline = Timeline::new();
    let positions: Vec<f64> = timeline
        .range(0.0, 100.0)
        .spread(3)
        .iter()
        .map(Point::position)
        .collect();
    assert_eq!(positions, vec![25.0, 50.0, 75.0]);
}

#[test]
fn shift_grow_and_scale() {
    let timeline = Timeline::new();
    let range = timeline.range(100.0, 100.0);

    assert_eq!(span(&range.shift(-50.0)), (50.0, 100.0));
    assert_eq!(span(&range.grow(20.0, 0.0)), (100.0, 120.0));
    assert_eq!(span(&range.grow(20.0, 0.5)), (90.0, 120.0));
    assert_eq!(span(&range.grow(20.0, 1.0)), (80.0, 120.0));
    assert_eq!(span(&range.grow(-300.0, 0.0)), (0.0, 0.0));

    assert_eq!(span(&range.scale(2.0, 0.0).unwrap()), (100.0, 200.0));
    assert_eq!(span(&range.scale(2.0, 0.5).unwrap()), (50.0, 200.0));
    assert!(matches!(range.scale(0.0, 0.0), Err(ChoreoError::Validation(_))));
    assert!(matches!(range.scale(-1.0, 0.0), Err(ChoreoError::Validation(_))));
}

#[test]
fn containment_is_end_exclusive_and_overlap_is_inclusive() {
    let timeline = Timeline::new();
    let range = timeline.range(0.0, 100.0);

    assert!(range.contains(&0.0));
    assert!(!range.contains(&100.0));
    assert!(range.contains(&timeline.point(99.0)));
    assert!(range.contains(&timeline.range(10.0, 50.0)));
    assert!(!range.contains(&timeline.range(50.0, 50.0)));

    assert!(range.overlaps(&timeline.range(100.0, 50.0)));
    assert!(range.overlaps(&timeline.range(-50.0, 50.0)));
    assert!(!range.overlaps(&timeline.range(101.0, 5.0)));
}

#[test]
fn boundary_points_sit_on_the_range_ends() {
    let timeline = Timeline::new();
    let range = timeline.range(40.0, 60.0);
    assert_eq!(range.start().position(), 40.0);
    assert_eq!(range.end().position(), 100.0);
    assert!(range.timeline().ptr_eq(&timeline));
}

#[test]
fn play_runs_the_range_from_its_start() {
    let timeline = Timeline::new();
    timeline.seek(500.0).unwrap();
    let range = timeline.range(100.0, 100.0);
    let seen = record(range.as_emitter());

    let done = range.play(Easer::Identity).unwrap();
    assert_eq!(timeline.current_time(), 100.0);
    timeline.clock().run(25.0, 1_000.0).unwrap();

    assert!(done.is_complete());
    assert_eq!(timeline.current_time(), 200.0);
    assert_eq!(*seen.borrow(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}
