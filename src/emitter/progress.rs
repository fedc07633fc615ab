use std::rc::Rc;

use crate::animation::ease::Easer;
use crate::emitter::core::{Emitter, Subscription};
use crate::emitter::tween::Tween;
use crate::foundation::error::{ChoreoError, ChoreoResult};

/// Emitter of normalized progress values.
///
/// Wraps an [`Emitter<f64>`] and adds progress-specific operators. Operators that keep the
/// output a progress value return another `ProgressEmitter`; the ones that change the output
/// type (`map`, `tween`, `sample`) return a plain [`Emitter`].
#[derive(Clone, Debug)]
pub struct ProgressEmitter {
    emitter: Emitter<f64>,
}

impl From<Emitter<f64>> for ProgressEmitter {
    fn from(emitter: Emitter<f64>) -> Self {
        Self { emitter }
    }
}

impl From<ProgressEmitter> for Emitter<f64> {
    fn from(progress: ProgressEmitter) -> Self {
        progress.emitter
    }
}

impl ProgressEmitter {
    /// Borrow the underlying emitter.
    pub fn as_emitter(&self) -> &Emitter<f64> {
        &self.emitter
    }

    /// Attach an infallible listener.
    pub fn subscribe(&self, handler: impl Fn(f64) + 'static) -> ChoreoResult<Subscription> {
        self.emitter.subscribe(move |v| handler(*v))
    }

    /// Attach a listener that may fail.
    pub fn try_subscribe(
        &self,
        handler: impl Fn(f64) -> ChoreoResult<()> + 'static,
    ) -> ChoreoResult<Subscription> {
        self.emitter.try_subscribe(move |v| handler(*v))
    }

    /// Forward `f(progress)`.
    pub fn map<U: 'static>(&self, f: impl Fn(f64) -> U + 'static) -> Emitter<U> {
        self.emitter.map(move |v| f(*v))
    }

    /// Forward only the progress values `pred` accepts.
    pub fn filter(&self, pred: impl Fn(f64) -> bool + 'static) -> Self {
        self.emitter.filter(move |v| pred(*v)).into()
    }

    /// Drop a value that is `==` to the previously forwarded one.
    pub fn dedupe(&self) -> Self {
        self.emitter.dedupe().into()
    }

    /// Side-effecting pass-through, see [`Emitter::tap`].
    pub fn tap(&self, cb: impl Fn(f64) + 'static) -> Self {
        self.emitter.tap(move |v| cb(*v)).into()
    }

    /// Hand `self` to `branch` and return it unchanged.
    pub fn fork(&self, branch: impl FnOnce(&Self)) -> Self {
        branch(self);
        self.clone()
    }

    /// Warp progress through `easer`.
    pub fn ease(&self, easer: impl Into<Easer>) -> Self {
        let easer = easer.into();
        self.map_progress(move |v| easer.apply(v))
    }

    /// Interpolate between `from` and `to`.
    ///
    /// Endpoint compatibility (e.g. equal array lengths) is checked here, not per emission.
    pub fn tween<T: Tween + 'static>(&self, from: T, to: T) -> ChoreoResult<Emitter<T>> {
        T::check_compatible(&from, &to)?;
        Ok(self.emitter.map(move |v| T::tween(&from, &to, *v)))
    }

    /// Interpolate with a caller-supplied `(from, to, progress) -> value` strategy.
    pub fn tween_with<T: 'static>(
        &self,
        from: T,
        to: T,
        interpolate: impl Fn(&T, &T, f64) -> T + 'static,
    ) -> Emitter<T> {
        self.emitter.map(move |v| interpolate(&from, &to, *v))
    }

    /// Quantize to the nearest of `steps + 1` evenly spaced levels in `[0, 1]`.
    pub fn snap(&self, steps: u32) -> ChoreoResult<Self> {
        if steps == 0 {
            return Err(ChoreoError::validation("snap steps must be a positive integer"));
        }
        let steps = f64::from(steps);
        Ok(self.map_progress(move |v| (v * steps).round() / steps))
    }

    /// `1.0` when progress is at or above `threshold`, else `0.0`.
    pub fn threshold(&self, threshold: f64) -> Self {
        self.map_progress(move |v| if v >= threshold { 1.0 } else { 0.0 })
    }

    /// Clamp progress into `[min, max]`.
    pub fn clamp(&self, min: f64, max: f64) -> Self {
        self.map_progress(move |v| v.max(min).min(max))
    }

    /// [`clamp`](Self::clamp) with the default bounds `[0, 1]`.
    pub fn clamp_unit(&self) -> Self {
        self.clamp(0.0, 1.0)
    }

    /// Repeating ramp: `(progress * count) mod 1`. Negative counts behave as zero.
    pub fn repeat(&self, count: f64) -> Self {
        let count = count.max(0.0);
        self.map_progress(move |v| (v * count) % 1.0)
    }

    /// Rotate progress by `delta`, wrapping into `[0, 1)`.
    pub fn offset(&self, delta: f64) -> Self {
        self.map_progress(move |v| (v + delta).rem_euclid(1.0))
    }

    /// Pick from `items` by progress: `items[floor(clamp(progress) * (len - 1))]`.
    pub fn sample<T: Clone + 'static>(&self, items: Vec<T>) -> ChoreoResult<Emitter<T>> {
        if items.is_empty() {
            return Err(ChoreoError::validation("cannot sample from an empty list"));
        }
        let items = Rc::new(items);
        let last = (items.len() - 1) as f64;
        Ok(self.emitter.map(move |v| {
            let idx = (v.clamp(0.0, 1.0) * last).floor() as usize;
            items[idx].clone()
        }))
    }

    fn map_progress(&self, f: impl Fn(f64) -> f64 + 'static) -> Self {
        self.emitter.map(move |v| f(*v)).into()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/emitter/progress.rs"]
mod tests;
