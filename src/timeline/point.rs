use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::animation::ease::Easer;
use crate::emitter::completion::Completion;
use crate::emitter::core::{Emitter, ListenerSet, Subscription};
use crate::foundation::arena::SlotId;
use crate::foundation::error::ChoreoResult;
use crate::timeline::engine::Timeline;
use crate::timeline::range::Range;

/// Which way the playhead was moving when a point fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Toward larger positions.
    Forward,
    /// Toward smaller positions.
    Backward,
}

impl Direction {
    /// `1.0` going forward, `-1.0` going back.
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

/// Payload delivered to point subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PointEvent {
    /// Travel direction of the seek that crossed the point.
    pub direction: Direction,
}

struct Registration {
    listeners: Rc<ListenerSet<PointEvent>>,
    slot: Cell<Option<SlotId>>,
}

/// A zero-width instant on a timeline.
///
/// A forward seek fires the point when it reaches or passes the position; a backward seek
/// fires it when it departs from or passes it. Landing on a point from above does not fire
/// it.
///
/// The point only joins its timeline's dispatch while it has subscribers. It derefs to its
/// [`Emitter<PointEvent>`], so every emitter operator is available directly.
#[derive(Clone)]
pub struct Point {
    position: f64,
    timeline: Timeline,
    events: Emitter<PointEvent>,
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Point")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl Deref for Point {
    type Target = Emitter<PointEvent>;

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

impl Point {
    pub(crate) fn new(timeline: Timeline, position: f64) -> Self {
        let registration = Rc::new(Registration {
            listeners: Rc::new(ListenerSet::new()),
            slot: Cell::new(None),
        });

        let owner = timeline.clone();
        let gate = timeline.clone();
        let events = Emitter::new(move |handler| {
            let id = registration.listeners.add(handler);
            if registration.slot.get().is_none() {
                let slot = owner.register_point(position, Rc::clone(&registration.listeners));
                registration.slot.set(Some(slot));
            }

            let registration = Rc::clone(&registration);
            let owner = owner.clone();
            Ok(Subscription::new(move || {
                if registration.listeners.remove(id) && registration.listeners.is_empty() {
                    if let Some(slot) = registration.slot.take() {
                        owner.deregister_point(slot);
                    }
                }
            }))
        })
        .gated(move || gate.ensure_can_subscribe());

        Self {
            position,
            timeline,
            events,
        }
    }

    /// Position on the timeline.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Owning timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Fires only when crossed going forward.
    pub fn forward_only(&self) -> Emitter<()> {
        self.directional(Direction::Forward)
    }

    /// Fires only when crossed going backward.
    pub fn reverse_only(&self) -> Emitter<()> {
        self.directional(Direction::Backward)
    }

    fn directional(&self, direction: Direction) -> Emitter<()> {
        self.events
            .filter(move |event| event.direction == direction)
            .map(|_| ())
    }

    /// Subscribe with one callback per direction.
    pub fn apply_directional(
        &self,
        on_forward: impl Fn() + 'static,
        on_backward: impl Fn() + 'static,
    ) -> ChoreoResult<Subscription> {
        self.events.subscribe(move |event| match event.direction {
            Direction::Forward => on_forward(),
            Direction::Backward => on_backward(),
        })
    }

    /// Drop events repeating the previous direction.
    pub fn dedupe(&self) -> Emitter<PointEvent> {
        self.events.dedupe()
    }

    /// Resolve with the direction of the next crossing.
    ///
    /// The underlying subscription is released as soon as the point fires.
    pub fn promise(&self) -> ChoreoResult<Completion<Direction>> {
        let done = Completion::pending();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::default();

        let sub = {
            let done = done.clone();
            let slot = Rc::clone(&slot);
            self.events.subscribe(move |event| {
                let sub = slot.borrow_mut().take();
                if let Some(sub) = sub {
                    sub.unsubscribe();
                }
                done.resolve(event.direction);
            })?
        };
        *slot.borrow_mut() = Some(sub);
        Ok(done)
    }

    /// Range from this point with the given duration.
    pub fn range(&self, duration: f64) -> Range {
        self.timeline.range(self.position, duration)
    }

    /// Range from this point to `position`.
    pub fn to(&self, position: f64) -> Range {
        self.timeline.range(self.position, position - self.position)
    }

    /// Point `offset` away from this one.
    pub fn delta(&self, offset: f64) -> Point {
        self.timeline.point(self.position + offset)
    }

    /// Jump the timeline here.
    pub fn seek(&self) -> ChoreoResult<()> {
        self.timeline.seek(self.position)
    }

    /// Tween the timeline here.
    pub fn seek_smooth(
        &self,
        duration: f64,
        easer: impl Into<Easer>,
    ) -> ChoreoResult<Completion<()>> {
        self.timeline.seek_smooth(self.position, duration, easer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/point.rs"]
mod tests;
