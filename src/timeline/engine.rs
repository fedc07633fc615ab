use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::{SmallVec, smallvec};

use crate::animation::ease::Easer;
use crate::emitter::completion::Completion;
use crate::emitter::core::ListenerSet;
use crate::emitter::tween::Tween;
use crate::foundation::arena::{Arena, SlotId};
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::timeline::clock::{Clock, DriverId};
use crate::timeline::options::{EndAction, TimelineOpts};
use crate::timeline::point::{Direction, Point, PointEvent};
use crate::timeline::range::{Range, progress_at};
use crate::timeline::tweener::Tweener;

struct PointRecord {
    position: f64,
    listeners: Rc<ListenerSet<PointEvent>>,
}

struct RangeRecord {
    start: f64,
    duration: f64,
    listeners: Rc<ListenerSet<f64>>,
}

impl RangeRecord {
    fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SortDirection {
    Unset,
    Forward,
    Backward,
}

impl From<Direction> for SortDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Self::Forward,
            Direction::Backward => Self::Backward,
        }
    }
}

/// One straight run of a seek. Wrapping seeks are split into two runs joined by a jump.
#[derive(Clone, Copy, Debug)]
struct Segment {
    from: f64,
    to: f64,
}

struct SmoothSeek {
    id: u64,
    target: f64,
    tweener: Tweener,
}

struct TimelineState {
    current_time: f64,
    end_position: f64,
    end_action: EndAction,
    time_scale: f64,

    points: Arena<PointRecord>,
    ranges: Arena<RangeRecord>,
    point_order: Vec<SlotId>,
    range_order: Vec<SlotId>,
    sort_direction: SortDirection,

    seeking: bool,
    driver: Option<DriverId>,
    smooth_seek: Option<SmoothSeek>,
    next_smooth_id: u64,
}

impl TimelineState {
    fn sort_for(&mut self, direction: Direction) {
        let wanted = SortDirection::from(direction);
        if self.sort_direction == wanted {
            return;
        }

        let Self {
            points,
            ranges,
            point_order,
            range_order,
            ..
        } = self;
        let (points, ranges) = (&*points, &*ranges);

        // Equal keys fall back to registration order in both directions.
        *point_order = points.iter_ordered().map(|(id, _)| id).collect();
        point_order.sort_by(|a, b| {
            let (pa, pb) = (point_key(points, *a), point_key(points, *b));
            match direction {
                Direction::Forward => pa.0.total_cmp(&pb.0),
                Direction::Backward => pb.0.total_cmp(&pa.0),
            }
            .then(pa.1.cmp(&pb.1))
        });

        *range_order = ranges.iter_ordered().map(|(id, _)| id).collect();
        range_order.sort_by(|a, b| {
            let (ra, rb) = (range_key(ranges, *a), range_key(ranges, *b));
            match direction {
                Direction::Forward => ra.1.total_cmp(&rb.1).then(ra.0.total_cmp(&rb.0)),
                Direction::Backward => rb.0.total_cmp(&ra.0).then(rb.1.total_cmp(&ra.1)),
            }
            .then(ra.2.cmp(&rb.2))
        });

        self.sort_direction = wanted;
    }

    fn plan_segments(&self, from: f64, to: f64) -> SmallVec<[Segment; 2]> {
        let EndAction::Wrap { at } = self.end_action else {
            return smallvec![Segment { from, to }];
        };
        let end = self.end_position;
        if end - at <= 0.0 {
            return smallvec![Segment { from, to }];
        }

        let wrapped_from = wrap_position(from, at, end);
        let wrapped_to = wrap_position(to, at, end);
        // A whole loop lands where it started but still passes every point once.
        let full_loop = (to - from).abs() >= end - at && wrapped_to == wrapped_from;
        if to > from && (wrapped_to < wrapped_from || full_loop) {
            smallvec![
                Segment {
                    from: wrapped_from,
                    to: end,
                },
                Segment {
                    from: at,
                    to: wrapped_to,
                },
            ]
        } else if to < from && (wrapped_to > wrapped_from || full_loop) {
            smallvec![
                Segment {
                    from: wrapped_from,
                    to: at,
                },
                Segment {
                    from: end,
                    to: wrapped_to,
                },
            ]
        } else {
            smallvec![Segment {
                from: wrapped_from,
                to: wrapped_to,
            }]
        }
    }

    fn effective_position(&self) -> f64 {
        match self.end_action {
            EndAction::Wrap { at } if self.end_position - at > 0.0 => {
                wrap_position(self.current_time, at, self.end_position)
            }
            _ => self.current_time,
        }
    }
}

fn point_key(points: &Arena<PointRecord>, id: SlotId) -> (f64, u64) {
    let position = points.get(id).map_or(f64::NAN, |p| p.position);
    (position, points.seq(id).unwrap_or(u64::MAX))
}

fn range_key(ranges: &Arena<RangeRecord>, id: SlotId) -> (f64, f64, u64) {
    let (start, end) = ranges.get(id).map_or((f64::NAN, f64::NAN), |r| (r.start, r.end()));
    (start, end, ranges.seq(id).unwrap_or(u64::MAX))
}

/// Fold a position above `end` back into `(at, end]`.
fn wrap_position(position: f64, at: f64, end: f64) -> f64 {
    if position <= end {
        return position;
    }
    let offset = (position - at) % (end - at);
    if offset == 0.0 { end } else { at + offset }
}

pub(crate) struct TimelineInner {
    state: RefCell<TimelineState>,
    clock: Clock,
}

impl Drop for TimelineInner {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().driver.take() {
            self.clock.unregister(id);
        }
    }
}

/// The seek engine: a playhead plus the points and ranges registered against it.
///
/// `Timeline` is a cheap, cloneable handle; clones share one playhead. Points and ranges
/// are created on demand with [`Timeline::point`] and [`Timeline::range`] and only take
/// part in seeks while something is subscribed to them.
///
/// Seeks are synchronous. Every crossed point and touched range fires on the caller's
/// stack, in a fixed order, before `seek` returns:
///
/// - forward seeks fire points in `(from, to]`, ascending; backward seeks fire points in
///   `(to, from]`, descending;
/// - before each point fires, the ranges between the previous stop and that point are
///   settled, so a point handler reading a range sees it consistent with the playhead;
/// - ranges fire in end-position order going forward and start-position order going back.
#[derive(Clone)]
pub struct Timeline {
    inner: Rc<TimelineInner>,
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Timeline")
            .field("current_time", &state.current_time)
            .field("end_position", &state.end_position)
            .field("end_action", &state.end_action)
            .field("points", &state.points.len())
            .field("ranges", &state.ranges.len())
            .field("playing", &state.driver.is_some())
            .finish()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// A paused timeline on its own private clock, pausing at its end.
    pub fn new() -> Self {
        Self::build(&Clock::new(), TimelineOpts::default())
    }

    /// A timeline on its own private clock.
    pub fn with_opts(opts: TimelineOpts) -> ChoreoResult<Self> {
        Self::with_clock(&Clock::new(), opts)
    }

    /// A timeline driven by a shared clock.
    pub fn with_clock(clock: &Clock, opts: TimelineOpts) -> ChoreoResult<Self> {
        opts.validate()?;
        Ok(Self::build(clock, opts))
    }

    fn build(clock: &Clock, opts: TimelineOpts) -> Self {
        let timeline = Self {
            inner: Rc::new(TimelineInner {
                state: RefCell::new(TimelineState {
                    current_time: 0.0,
                    end_position: 0.0,
                    end_action: opts.at_end,
                    time_scale: opts.time_scale,
                    points: Arena::new(),
                    ranges: Arena::new(),
                    point_order: Vec::new(),
                    range_order: Vec::new(),
                    sort_direction: SortDirection::Unset,
                    seeking: false,
                    driver: None,
                    smooth_seek: None,
                    next_smooth_id: 0,
                }),
                clock: clock.clone(),
            }),
        };
        if opts.autoplay {
            timeline.play();
        }
        timeline
    }

    fn from_weak(weak: &Weak<TimelineInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// `true` if both handles drive the same playhead.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The clock this timeline plays on.
    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    /// Playhead position.
    ///
    /// While a point handler runs this reports that point's position (folded into the loop
    /// for wrapping timelines); otherwise it is the raw position of the last seek.
    pub fn current_time(&self) -> f64 {
        self.inner.state.borrow().current_time
    }

    /// Largest position any point or range has been created at.
    pub fn end_position(&self) -> f64 {
        self.inner.state.borrow().end_position
    }

    /// Overshoot policy.
    pub fn end_action(&self) -> EndAction {
        self.inner.state.borrow().end_action
    }

    /// Multiplier applied to clock time while playing.
    pub fn time_scale(&self) -> f64 {
        self.inner.state.borrow().time_scale
    }

    /// Change the play speed. Negative values play backwards.
    pub fn set_time_scale(&self, time_scale: f64) -> ChoreoResult<()> {
        if !time_scale.is_finite() {
            return Err(ChoreoError::validation("time scale must be finite"));
        }
        self.inner.state.borrow_mut().time_scale = time_scale;
        Ok(())
    }

    /// Whether the timeline is registered on its clock.
    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().driver.is_some()
    }

    /// Whether a seek is dispatching right now.
    pub fn is_seeking(&self) -> bool {
        self.inner.state.borrow().seeking
    }

    /// Whether a smooth seek is in flight.
    pub fn is_smooth_seeking(&self) -> bool {
        self.inner.state.borrow().smooth_seek.is_some()
    }

    /// Number of points with at least one subscriber.
    pub fn live_point_count(&self) -> usize {
        self.inner.state.borrow().points.len()
    }

    /// Number of ranges with at least one subscriber.
    pub fn live_range_count(&self) -> usize {
        self.inner.state.borrow().ranges.len()
    }

    /// A point at `position`, extending the end position if needed.
    pub fn point(&self, position: f64) -> Point {
        self.extend_end(position);
        Point::new(self.clone(), position)
    }

    /// A range covering `[start, start + duration]`.
    ///
    /// A negative duration is normalized by moving the start left.
    pub fn range(&self, start: f64, duration: f64) -> Range {
        let (start, duration) = if duration < 0.0 {
            (start + duration, -duration)
        } else {
            (start, duration)
        };
        self.extend_end(start + duration);
        Range::new(self.clone(), start, duration)
    }

    /// Point at position 0.
    pub fn start(&self) -> Point {
        self.point(0.0)
    }

    /// Point at the current end position.
    pub fn end(&self) -> Point {
        self.point(self.end_position())
    }

    fn extend_end(&self, position: f64) {
        let mut state = self.inner.state.borrow_mut();
        if position > state.end_position {
            state.end_position = position;
        }
    }

    /// Jump the playhead to `to`, firing everything in between.
    ///
    /// Interrupts an in-flight smooth seek first (it completes at its own target). Fails
    /// with [`ChoreoError::Seek`] when called from inside a handler of this timeline. If a
    /// handler fails, the remaining handlers of this seek are skipped, the timeline stops
    /// playing and the handler's error is returned.
    pub fn seek(&self, to: f64) -> ChoreoResult<()> {
        self.ensure_not_seeking()?;
        self.complete_smooth_seek()?;
        self.seek_direct(to)
    }

    /// Tween the playhead to `to` over `duration` clock milliseconds.
    ///
    /// Any smooth seek already in flight is force-completed to its own target first, so its
    /// completion resolves before this one starts moving. A non-positive duration degrades
    /// to an instant seek.
    #[tracing::instrument(level = "debug", skip(self, easer))]
    pub fn seek_smooth(
        &self,
        to: f64,
        duration: f64,
        easer: impl Into<Easer>,
    ) -> ChoreoResult<Completion<()>> {
        let easer = easer.into();
        self.ensure_not_seeking()?;
        self.complete_smooth_seek()?;

        if duration.is_nan() || duration <= 0.0 {
            self.seek_direct(to)?;
            return Ok(Completion::ready(()));
        }

        let from = self.current_time();
        let tweener = Tweener::start(self.clock(), duration)?;

        let weak = Rc::downgrade(&self.inner);
        let _drive = tweener
            .progress()
            .try_subscribe(move |t| match Self::from_weak(&weak) {
                Some(timeline) => {
                    // The last step lands on `to` exactly, whatever the curve does at 1.
                    let position = if t >= 1.0 {
                        to
                    } else {
                        f64::tween(&from, &to, easer.apply(t))
                    };
                    timeline.seek_direct(position)
                }
                None => Ok(()),
            })?;

        let done = tweener.completion()?;
        let id = {
            let mut state = self.inner.state.borrow_mut();
            let id = state.next_smooth_id;
            state.next_smooth_id += 1;
            state.smooth_seek = Some(SmoothSeek {
                id,
                target: to,
                tweener,
            });
            id
        };

        let weak = Rc::downgrade(&self.inner);
        done.then(move |_| {
            if let Some(timeline) = Self::from_weak(&weak) {
                timeline.clear_smooth_seek(id);
            }
        });
        Ok(done)
    }

    fn complete_smooth_seek(&self) -> ChoreoResult<()> {
        let active = self.inner.state.borrow_mut().smooth_seek.take();
        if let Some(active) = active {
            tracing::debug!(
                target_position = active.target,
                "interrupting smooth seek; completing at its target"
            );
            active.tweener.finish()?;
        }
        Ok(())
    }

    fn clear_smooth_seek(&self, id: u64) {
        let finished = {
            let mut state = self.inner.state.borrow_mut();
            let current = state.smooth_seek.as_ref().is_some_and(|s| s.id == id);
            if current { state.smooth_seek.take() } else { None }
        };
        drop(finished);
    }

    /// Start advancing with clock ticks. No-op if already playing.
    pub fn play(&self) {
        if self.is_playing() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.clock.register(move |elapsed| match Self::from_weak(&weak) {
            Some(timeline) => {
                let delta = elapsed * timeline.time_scale();
                timeline.advance(delta)
            }
            None => Ok(()),
        });
        self.inner.state.borrow_mut().driver = Some(id);
        tracing::debug!(position = self.current_time(), "timeline playing");
    }

    /// Stop advancing with clock ticks.
    ///
    /// Smooth seeks and [`Range::play`] run on their own drivers and keep going.
    pub fn pause(&self) {
        let driver = self.inner.state.borrow_mut().driver.take();
        if let Some(id) = driver {
            self.inner.clock.unregister(id);
            tracing::debug!(position = self.current_time(), "timeline paused");
        }
    }

    /// Move the playhead by `delta`, applying the end action on overshoot.
    pub fn advance(&self, delta: f64) -> ChoreoResult<()> {
        if !delta.is_finite() {
            return Err(ChoreoError::validation("advance delta must be finite"));
        }
        let (current, end, action) = {
            let state = self.inner.state.borrow();
            (state.current_time, state.end_position, state.end_action)
        };

        let target = current + delta;
        if target <= end {
            return self.seek_direct(target);
        }

        match action {
            EndAction::Pause => {
                self.seek_direct(end)?;
                self.pause();
                Ok(())
            }
            EndAction::Continue | EndAction::Wrap { .. } => self.seek_direct(target),
            EndAction::Restart { at } => self.advance_restarting(delta, at, end),
        }
    }

    fn advance_restarting(&self, delta: f64, at: f64, end: f64) -> ChoreoResult<()> {
        if end - at <= 0.0 {
            tracing::debug!(at, end, "empty restart loop; pausing at end");
            self.seek_direct(end)?;
            self.pause();
            return Ok(());
        }

        let mut remaining = delta;
        loop {
            let current = self.current_time();
            if current + remaining <= end {
                return self.seek_direct(current + remaining);
            }
            remaining -= end - current;
            self.seek_direct(end)?;
            self.seek_direct(at)?;
        }
    }

    pub(crate) fn ensure_not_seeking(&self) -> ChoreoResult<()> {
        if self.is_seeking() {
            return Err(ChoreoError::seek(
                "cannot seek while the timeline is dispatching a seek",
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_can_subscribe(&self) -> ChoreoResult<()> {
        if self.is_seeking() {
            return Err(ChoreoError::subscription(
                "cannot subscribe while the timeline is dispatching a seek",
            ));
        }
        Ok(())
    }

    /// Playhead as points and ranges see it: folded into the loop for wrapping timelines.
    pub(crate) fn effective_position(&self) -> f64 {
        self.inner.state.borrow().effective_position()
    }

    pub(crate) fn register_point(
        &self,
        position: f64,
        listeners: Rc<ListenerSet<PointEvent>>,
    ) -> SlotId {
        let mut state = self.inner.state.borrow_mut();
        state.sort_direction = SortDirection::Unset;
        state.points.insert(PointRecord {
            position,
            listeners,
        })
    }

    pub(crate) fn deregister_point(&self, id: SlotId) {
        self.inner.state.borrow_mut().points.remove(id);
    }

    pub(crate) fn register_range(
        &self,
        start: f64,
        duration: f64,
        listeners: Rc<ListenerSet<f64>>,
    ) -> SlotId {
        let mut state = self.inner.state.borrow_mut();
        state.sort_direction = SortDirection::Unset;
        state.ranges.insert(RangeRecord {
            start,
            duration,
            listeners,
        })
    }

    pub(crate) fn deregister_range(&self, id: SlotId) {
        self.inner.state.borrow_mut().ranges.remove(id);
    }

    fn set_current_time(&self, position: f64) {
        self.inner.state.borrow_mut().current_time = position;
    }

    fn seek_direct(&self, to: f64) -> ChoreoResult<()> {
        let (direction, segments) = {
            let mut state = self.inner.state.borrow_mut();
            if state.seeking {
                return Err(ChoreoError::seek(
                    "cannot seek while the timeline is dispatching a seek",
                ));
            }
            let from = state.current_time;
            if to == from {
                return Ok(());
            }
            let direction = if to > from {
                Direction::Forward
            } else {
                Direction::Backward
            };
            state.sort_for(direction);
            state.seeking = true;
            (direction, state.plan_segments(from, to))
        };

        let guard = DispatchGuard {
            timeline: self,
            finished: false,
        };
        let event = PointEvent { direction };
        for segment in segments {
            self.set_current_time(segment.from);
            let mut settled = false;
            for (position, listeners) in self.crossed_points(segment, direction) {
                self.settle_ranges(position, settled)?;
                settled = true;
                self.set_current_time(position);
                listeners.emit(&event)?;
            }
            self.settle_ranges(segment.to, settled)?;
        }
        guard.finish(to);

        tracing::trace!(to, ?direction, "seek dispatched");
        Ok(())
    }

    fn crossed_points(
        &self,
        segment: Segment,
        direction: Direction,
    ) -> SmallVec<[(f64, Rc<ListenerSet<PointEvent>>); 8]> {
        let Segment { from, to } = segment;
        let state = self.inner.state.borrow();
        state
            .point_order
            .iter()
            .filter_map(|id| state.points.get(*id))
            .filter(|p| match direction {
                Direction::Forward => p.position > from && p.position <= to,
                Direction::Backward => p.position <= from && p.position > to,
            })
            .map(|p| (p.position, Rc::clone(&p.listeners)))
            .collect()
    }

    /// Emit progress at `to` to every range overlapping `[current, to]`.
    ///
    /// With `settled`, ranges already emitted at the current position are skipped when
    /// their progress would not change.
    fn settle_ranges(&self, to: f64, settled: bool) -> ChoreoResult<()> {
        let touched: SmallVec<[(f64, Rc<ListenerSet<f64>>); 8]> = {
            let state = self.inner.state.borrow();
            let current = state.current_time;
            let (lo, hi) = (current.min(to), current.max(to));
            state
                .range_order
                .iter()
                .filter_map(|id| state.ranges.get(*id))
                .filter(|r| r.end() >= lo && r.start <= hi)
                .filter_map(|r| {
                    let progress = progress_at(r.start, r.duration, to);
                    let repeat = settled
                        && r.start <= current
                        && current <= r.end()
                        && progress_at(r.start, r.duration, current) == progress;
                    (!repeat).then(|| (progress, Rc::clone(&r.listeners)))
                })
                .collect()
        };

        for (progress, listeners) in touched {
            listeners.emit(&progress)?;
        }
        Ok(())
    }
}

/// Clears the seeking flag when a dispatch ends. If the dispatch did not finish (a handler
/// returned an error or panicked), the timeline also stops playing.
struct DispatchGuard<'a> {
    timeline: &'a Timeline,
    finished: bool,
}

impl DispatchGuard<'_> {
    fn finish(mut self, to: f64) {
        self.finished = true;
        let mut state = self.timeline.inner.state.borrow_mut();
        state.seeking = false;
        state.current_time = to;
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Ok(mut state) = self.timeline.inner.state.try_borrow_mut() {
            state.seeking = false;
        }
        tracing::warn!("seek dispatch aborted by a handler; pausing timeline");
        self.timeline.pause();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/engine.rs"]
mod tests;
