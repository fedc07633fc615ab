/// Convenience result type used across choreo.
pub type ChoreoResult<T> = Result<T, ChoreoError>;

/// Top-level error taxonomy used by timeline and emitter APIs.
///
/// Every variant except [`ChoreoError::Other`] is a contract violation: the caller
/// passed something the engine refuses to work with, or called an operation in a state
/// that forbids it. None of them are retried internally.
#[derive(thiserror::Error, Debug)]
pub enum ChoreoError {
    /// Invalid user-provided arguments or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// A seek was requested while the timeline was already dispatching one.
    #[error("seek error: {0}")]
    Seek(String),

    /// A subscription could not be attached.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// Tween endpoints cannot be interpolated against each other.
    #[error("tween error: {0}")]
    Tween(String),

    /// Errors when serializing or deserializing options.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Failure raised by a user handler or a lower-level dependency.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChoreoError {
    /// Build a [`ChoreoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ChoreoError::Seek`] value.
    pub fn seek(msg: impl Into<String>) -> Self {
        Self::Seek(msg.into())
    }

    /// Build a [`ChoreoError::Subscription`] value.
    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::Subscription(msg.into())
    }

    /// Build a [`ChoreoError::Tween`] value.
    pub fn tween(msg: impl Into<String>) -> Self {
        Self::Tween(msg.into())
    }

    /// Build a [`ChoreoError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
