use std::time::{Duration, SystemTime};

use crate::foundation::error::{ChoreoError, ChoreoResult};

/// Values that can be interpolated by a progress signal.
///
/// This is the calling convention behind [`ProgressEmitter::tween`]: given the two
/// endpoints and a progress value (usually in `[0, 1]`, but eased progress may overshoot),
/// produce the in-between value. Implement it for your own types to make them tweenable.
///
/// [`ProgressEmitter::tween`]: crate::ProgressEmitter::tween
pub trait Tween: Clone {
    /// Interpolate from `from` to `to` at `progress`.
    fn tween(from: &Self, to: &Self, progress: f64) -> Self;

    /// Check, once and up front, that `from` and `to` can be interpolated.
    fn check_compatible(_from: &Self, _to: &Self) -> ChoreoResult<()> {
        Ok(())
    }
}

impl Tween for f64 {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        if progress == 1.0 {
            return *to;
        }
        from + (to - from) * progress
    }
}

impl Tween for f32 {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        if progress == 1.0 {
            return *to;
        }
        (*from as f64 + ((*to as f64 - *from as f64) * progress)) as f32
    }
}

impl<T: Tween> Tween for Vec<T> {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        from.iter()
            .zip(to)
            .map(|(a, b)| T::tween(a, b, progress))
            .collect()
    }

    fn check_compatible(from: &Self, to: &Self) -> ChoreoResult<()> {
        if from.len() != to.len() {
            return Err(ChoreoError::tween(format!(
                "cannot tween arrays of different lengths ({} vs {})",
                from.len(),
                to.len()
            )));
        }
        from.iter()
            .zip(to)
            .try_for_each(|(a, b)| T::check_compatible(a, b))
    }
}

impl<T: Tween, const N: usize> Tween for [T; N] {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        std::array::from_fn(|i| T::tween(&from[i], &to[i], progress))
    }

    fn check_compatible(from: &Self, to: &Self) -> ChoreoResult<()> {
        from.iter()
            .zip(to)
            .try_for_each(|(a, b)| T::check_compatible(a, b))
    }
}

impl Tween for kurbo::Vec2 {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        from.lerp(*to, progress)
    }
}

impl Tween for kurbo::Point {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        from.lerp(*to, progress)
    }
}

impl Tween for Duration {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        let secs = f64::tween(&from.as_secs_f64(), &to.as_secs_f64(), progress);
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl Tween for SystemTime {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        let span = match to.duration_since(*from) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => -e.duration().as_secs_f64(),
        };
        let offset = span * progress;
        let magnitude = Duration::try_from_secs_f64(offset.abs()).unwrap_or(Duration::ZERO);
        let moved = if offset >= 0.0 {
            from.checked_add(magnitude)
        } else {
            from.checked_sub(magnitude)
        };
        moved.unwrap_or(*from)
    }
}

/// Literal merge: the first `round(len * progress)` characters come from `to`, the rest
/// from `from`.
impl Tween for String {
    fn tween(from: &Self, to: &Self, progress: f64) -> Self {
        if progress <= 0.0 {
            return from.clone();
        }
        if progress >= 1.0 {
            return to.clone();
        }
        let from_chars: Vec<char> = from.chars().collect();
        let to_chars: Vec<char> = to.chars().collect();
        let len = from_chars.len().max(to_chars.len());
        let cut = ((len as f64) * progress).round() as usize;

        let head = to_chars.iter().take(cut);
        let tail = from_chars.iter().skip(cut);
        head.chain(tail).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/emitter/tween.rs"]
mod tests;
