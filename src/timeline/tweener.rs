use crate::emitter::completion::Completion;
use crate::emitter::progress::ProgressEmitter;
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::timeline::clock::Clock;
use crate::timeline::engine::Timeline;
use crate::timeline::options::{EndAction, TimelineOpts};
use crate::timeline::range::Range;

/// A throwaway child timeline that plays one `[0, duration]` range on a clock.
///
/// Smooth seeks and [`animate`] are both built on it. Whoever holds the tweener owns the
/// child timeline; dropping every handle stops it.
#[derive(Clone, Debug)]
pub(crate) struct Tweener {
    timeline: Timeline,
    range: Range,
}

impl Tweener {
    pub(crate) fn start(clock: &Clock, duration: f64) -> ChoreoResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ChoreoError::validation(
                "tween duration must be positive and finite",
            ));
        }
        let timeline = Timeline::with_clock(
            clock,
            TimelineOpts {
                autoplay: true,
                time_scale: 1.0,
                at_end: EndAction::Pause,
            },
        )?;
        let range = timeline.range(0.0, duration);
        Ok(Self { timeline, range })
    }

    pub(crate) fn progress(&self) -> ProgressEmitter {
        self.range.progress().clone()
    }

    /// Resolves when the child reaches its end point.
    pub(crate) fn completion(&self) -> ChoreoResult<Completion<()>> {
        let reached = self.range.end().promise()?;
        let done = Completion::pending();
        let resolve = done.clone();
        reached.then(move |_| {
            resolve.resolve(());
        });
        Ok(done)
    }

    /// Stop the clock driver and jump straight to the end.
    pub(crate) fn finish(&self) -> ChoreoResult<()> {
        self.timeline.pause();
        self.timeline.seek(self.range.end_position())
    }
}

/// Progress emitter that runs from 0 to 1 over `duration` milliseconds of `clock` time.
///
/// The animation starts immediately and keeps itself alive until it completes, so dropping
/// the returned emitter (after subscribing) does not stop it.
///
/// ```
/// use choreo::{Clock, animate};
///
/// let clock = Clock::new();
/// let fade = animate(&clock, 200.0).unwrap();
/// let opacity = fade.tween(0.0, 1.0).unwrap();
/// let _sub = opacity.subscribe(|o| println!("opacity {o}")).unwrap();
/// clock.run(16.0, 1_000.0).unwrap();
/// ```
pub fn animate(clock: &Clock, duration: f64) -> ChoreoResult<ProgressEmitter> {
    let tweener = Tweener::start(clock, duration)?;
    let progress = tweener.progress();
    let keepalive = tweener.clone();
    tweener.completion()?.then(move |_| drop(keepalive));
    Ok(progress)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/tweener.rs"]
mod tests;
