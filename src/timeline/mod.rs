pub(crate) mod clock;
pub(crate) mod engine;
pub(crate) mod options;
pub(crate) mod point;
pub(crate) mod range;
pub(crate) mod tweener;
