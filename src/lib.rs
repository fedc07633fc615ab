//! Choreo is a seekable choreography engine.
//!
//! A [`Timeline`] is a single scalar playhead. [`Point`]s fire directional events when a seek
//! crosses them and [`Range`]s emit normalized progress while a seek moves through them.
//! Both are push-based [`Emitter`]s, so progress can be eased, snapped, and tweened into
//! concrete values before it reaches a handler:
//!
//! ```
//! use choreo::{Ease, Timeline};
//! use std::{cell::Cell, rc::Rc};
//!
//! let timeline = Timeline::new();
//! let width = Rc::new(Cell::new(0.0));
//! let sink = Rc::clone(&width);
//! let _sub = timeline
//!     .range(0.0, 1000.0)
//!     .ease(Ease::Linear)
//!     .tween(0.0, 100.0)
//!     .unwrap()
//!     .subscribe(move |w| sink.set(*w))
//!     .unwrap();
//!
//! timeline.seek(500.0).unwrap();
//! assert_eq!(width.get(), 50.0);
//! ```
//!
//! Everything is single-threaded and synchronous: a seek dispatches every crossed point and
//! touched range on the caller's stack before returning. Time only moves on its own through
//! a [`Clock`], which the host ticks from its frame loop.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod emitter;
pub(crate) mod timeline;

pub use crate::foundation::error::{ChoreoError, ChoreoResult};

pub use crate::animation::ease::{Ease, Easer};
pub use crate::emitter::completion::Completion;
pub use crate::emitter::core::{Emitter, EventSource, Handler, Subscription};
pub use crate::emitter::progress::ProgressEmitter;
pub use crate::emitter::tween::Tween;
pub use crate::timeline::clock::Clock;
pub use crate::timeline::engine::Timeline;
pub use crate::timeline::options::{EndAction, TimelineOpts};
pub use crate::timeline::point::{Direction, Point, PointEvent};
pub use crate::timeline::range::{Range, TimeSpan};
pub use crate::timeline::tweener::animate;
