use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::foundation::arena::{Arena, SlotId};
use crate::foundation::error::{ChoreoError, ChoreoResult};

type TickFn = Rc<dyn Fn(f64) -> ChoreoResult<()>>;

/// Handle to a driver registered on a [`Clock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DriverId(SlotId);

#[derive(Default)]
struct ClockState {
    drivers: Arena<TickFn>,
    elapsed_total: f64,
}

/// Shared tick source for playing timelines.
///
/// A clock does not own a timer. Whatever drives the application (a frame callback, a
/// fixed-step loop, a test) calls [`Clock::tick`] with the elapsed milliseconds, and the
/// clock forwards that to every registered driver: playing timelines, in-flight smooth
/// seeks and [`animate`](crate::animate) tweeners. Cloning a `Clock` yields another handle
/// to the same registry.
#[derive(Clone, Default)]
pub struct Clock {
    state: Rc<RefCell<ClockState>>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Clock")
            .field("drivers", &state.drivers.len())
            .field("elapsed_total", &state.elapsed_total)
            .finish()
    }
}

impl Clock {
    /// Create a clock with no drivers.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, tick: impl Fn(f64) -> ChoreoResult<()> + 'static) -> DriverId {
        DriverId(self.state.borrow_mut().drivers.insert(Rc::new(tick)))
    }

    pub(crate) fn unregister(&self, id: DriverId) -> bool {
        self.state.borrow_mut().drivers.remove(id.0).is_some()
    }

    /// Advance every registered driver by `elapsed_ms`.
    ///
    /// Drivers run in registration order. A driver registered during the tick first runs on
    /// the next one; a driver removed during the tick is skipped. The first driver error
    /// ends the tick and is returned.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn tick(&self, elapsed_ms: f64) -> ChoreoResult<()> {
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            return Err(ChoreoError::validation(
                "clock tick must be a finite, non-negative duration",
            ));
        }

        let snapshot: SmallVec<[(SlotId, TickFn); 4]> = {
            let mut state = self.state.borrow_mut();
            state.elapsed_total += elapsed_ms;
            state
                .drivers
                .iter_ordered()
                .map(|(id, tick)| (id, Rc::clone(tick)))
                .collect()
        };

        for (id, tick) in snapshot {
            let live = self.state.borrow().drivers.contains(id);
            if live {
                tick(elapsed_ms)?;
            }
        }
        Ok(())
    }

    /// Tick in `step_ms` increments until no drivers remain or `max_ms` has elapsed.
    ///
    /// Returns the time consumed.
    pub fn run(&self, step_ms: f64, max_ms: f64) -> ChoreoResult<f64> {
        if step_ms.is_nan() || step_ms <= 0.0 {
            return Err(ChoreoError::validation("clock step must be positive"));
        }
        let mut consumed = 0.0;
        while !self.is_idle() && consumed < max_ms {
            let step = step_ms.min(max_ms - consumed);
            self.tick(step)?;
            consumed += step;
        }
        Ok(consumed)
    }

    /// Number of registered drivers.
    pub fn driver_count(&self) -> usize {
        self.state.borrow().drivers.len()
    }

    /// `true` when nothing is registered.
    pub fn is_idle(&self) -> bool {
        self.state.borrow().drivers.is_empty()
    }

    /// Sum of all ticks so far.
    pub fn elapsed_total(&self) -> f64 {
        self.state.borrow().elapsed_total
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;
