pub(crate) mod completion;
pub(crate) mod core;
pub(crate) mod progress;
pub(crate) mod tween;
