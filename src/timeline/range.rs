use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::animation::ease::Easer;
use crate::emitter::completion::Completion;
use crate::emitter::core::{Emitter, Handler, ListenerSet, Subscription};
use crate::emitter::progress::ProgressEmitter;
use crate::foundation::arena::SlotId;
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::timeline::engine::Timeline;
use crate::timeline::point::Point;

/// `clamp((position - start) / duration, 0, 1)`.
pub(crate) fn progress_at(start: f64, duration: f64, position: f64) -> f64 {
    if duration <= 0.0 {
        return if position >= start { 1.0 } else { 0.0 };
    }
    ((position - start) / duration).clamp(0.0, 1.0)
}

/// Anything with a start and an end on a timeline.
pub trait TimeSpan {
    /// Inclusive start.
    fn span_start(&self) -> f64;
    /// End position.
    fn span_end(&self) -> f64;
}

impl TimeSpan for f64 {
    fn span_start(&self) -> f64 {
        *self
    }

    fn span_end(&self) -> f64 {
        *self
    }
}

impl TimeSpan for Point {
    fn span_start(&self) -> f64 {
        self.position()
    }

    fn span_end(&self) -> f64 {
        self.position()
    }
}

impl TimeSpan for Range {
    fn span_start(&self) -> f64 {
        self.start
    }

    fn span_end(&self) -> f64 {
        self.end_position()
    }
}

struct Registration {
    listeners: Rc<ListenerSet<f64>>,
    slot: Cell<Option<SlotId>>,
}

/// An interval on a timeline that emits normalized progress.
///
/// Every seek whose path touches `[start, end]` (boundaries included) emits
/// `clamp((to - start) / duration, 0, 1)`. A new subscriber whose timeline is already
/// inside the range gets the current progress immediately.
///
/// Derefs to its [`ProgressEmitter`]. The algebra methods (`bisect`, `shift`, `scale`, ...)
/// only compute new ranges on the same timeline; they never subscribe.
#[derive(Clone)]
pub struct Range {
    start: f64,
    duration: f64,
    timeline: Timeline,
    progress: ProgressEmitter,
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("start", &self.start)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl Deref for Range {
    type Target = ProgressEmitter;

    fn deref(&self) -> &Self::Target {
        &self.progress
    }
}

impl Range {
    pub(crate) fn new(timeline: Timeline, start: f64, duration: f64) -> Self {
        let registration = Rc::new(Registration {
            listeners: Rc::new(ListenerSet::new()),
            slot: Cell::new(None),
        });

        let owner = timeline.clone();
        let gate = timeline.clone();
        let emitter = Emitter::new(move |handler: Handler<f64>| {
            if duration == 0.0 {
                return Err(ChoreoError::subscription(
                    "cannot subscribe to a zero-duration range",
                ));
            }

            let id = registration.listeners.add(Rc::clone(&handler));
            if registration.slot.get().is_none() {
                let slot =
                    owner.register_range(start, duration, Rc::clone(&registration.listeners));
                registration.slot.set(Some(slot));
            }

            let detach = {
                let registration = Rc::clone(&registration);
                let owner = owner.clone();
                move || {
                    if registration.listeners.remove(id) && registration.listeners.is_empty() {
                        if let Some(slot) = registration.slot.take() {
                            owner.deregister_range(slot);
                        }
                    }
                }
            };

            let position = owner.effective_position();
            if position >= start && position <= start + duration {
                if let Err(e) = handler(&progress_at(start, duration, position)) {
                    detach();
                    return Err(e);
                }
            }
            Ok(Subscription::new(detach))
        })
        .gated(move || gate.ensure_can_subscribe());

        Self {
            start,
            duration,
            timeline,
            progress: emitter.into(),
        }
    }

    /// Borrow the progress emitter.
    pub fn progress(&self) -> &ProgressEmitter {
        &self.progress
    }

    /// Owning timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Start position.
    pub fn start_position(&self) -> f64 {
        self.start
    }

    /// End position.
    pub fn end_position(&self) -> f64 {
        self.start + self.duration
    }

    /// Length.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Point at the start.
    pub fn start(&self) -> Point {
        self.timeline.point(self.start)
    }

    /// Point at the end.
    pub fn end(&self) -> Point {
        self.timeline.point(self.end_position())
    }

    /// Progress this range would report at `position`.
    pub fn progress_at(&self, position: f64) -> f64 {
        progress_at(self.start, self.duration, position)
    }

    /// Split in half.
    pub fn bisect(&self) -> (Range, Range) {
        self.bisect_at(self.duration / 2.0)
    }

    /// Split `offset` after the start. The offset is clamped into the range.
    pub fn bisect_at(&self, offset: f64) -> (Range, Range) {
        let offset = offset.clamp(0.0, self.duration);
        (
            self.timeline.range(self.start, offset),
            self.timeline
                .range(self.start + offset, self.duration - offset),
        )
    }

    /// `n` equal, contiguous ranges covering this one.
    pub fn subdivide(&self, n: usize) -> Vec<Range> {
        let width = self.duration / n as f64;
        (0..n)
            .map(|i| self.timeline.range(self.start + width * i as f64, width))
            .collect()
    }

    /// `n` evenly spaced interior points, excluding start and end.
    pub fn spread(&self, n: usize) -> Vec<Point> {
        let step = self.duration / (n + 1) as f64;
        (1..=n)
            .map(|i| self.timeline.point(self.start + step * i as f64))
            .collect()
    }

    /// Same length, moved by `delta`.
    pub fn shift(&self, delta: f64) -> Range {
        self.timeline.range(self.start + delta, self.duration)
    }

    /// Lengthen by `delta`, keeping the position at fraction `anchor` fixed.
    ///
    /// A result with negative length collapses to an empty range at its midpoint.
    pub fn grow(&self, delta: f64, anchor: f64) -> Range {
        let start = self.start - delta * anchor;
        let duration = self.duration + delta;
        if duration < 0.0 {
            return self.timeline.range(start + duration / 2.0, 0.0);
        }
        self.timeline.range(start, duration)
    }

    /// Multiply the length by `factor`, pivoting at fraction `anchor`.
    pub fn scale(&self, factor: f64, anchor: f64) -> ChoreoResult<Range> {
        if factor.is_nan() || factor <= 0.0 {
            return Err(ChoreoError::validation("range scale factor must be positive"));
        }
        let pivot = self.start + self.duration * anchor;
        let start = pivot - (pivot - self.start) * factor;
        Ok(self.timeline.range(start, self.duration * factor))
    }

    /// Whether `other` lies inside this range. The end boundary is exclusive.
    pub fn contains(&self, other: &impl TimeSpan) -> bool {
        other.span_start() >= self.start && other.span_end() < self.end_position()
    }

    /// Whether the two ranges share any position, boundaries included.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end_position() && self.end_position() >= other.start
    }

    /// Jump to the start, then tween to the end over `duration` clock milliseconds.
    pub fn play(&self, easer: impl Into<Easer>) -> ChoreoResult<Completion<()>> {
        self.timeline.seek(self.start)?;
        self.timeline
            .seek_smooth(self.end_position(), self.duration, easer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/range.rs"]
mod tests;
