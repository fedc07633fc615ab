use crate::foundation::error::{ChoreoError, ChoreoResult};

/// What a playing timeline does when an advance would carry it past its end position.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "EndActionDef", into = "EndActionDef")]
pub enum EndAction {
    /// Seek to the end and stop playing.
    #[default]
    Pause,
    /// Keep going past the end.
    Continue,
    /// Seek to the end, rewind to `at`, and keep consuming the remaining time.
    Restart {
        /// Loop start position.
        at: f64,
    },
    /// Let the playhead run on while points and ranges see it folded into `[at, end]`.
    Wrap {
        /// Loop start position.
        at: f64,
    },
}

impl EndAction {
    fn validate(self) -> ChoreoResult<()> {
        match self {
            Self::Restart { at } | Self::Wrap { at } if !at.is_finite() => Err(
                ChoreoError::validation("end action loop position must be finite"),
            ),
            _ => Ok(()),
        }
    }
}

/// Serialized shape: `"pause" | "continue" | "restart" | "wrap" | {"restartAt": n} | {"wrapAt": n}`.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum EndActionDef {
    Named(String),
    #[serde(rename_all = "camelCase")]
    RestartAt {
        restart_at: f64,
    },
    #[serde(rename_all = "camelCase")]
    WrapAt {
        wrap_at: f64,
    },
}

impl TryFrom<EndActionDef> for EndAction {
    type Error = ChoreoError;

    fn try_from(def: EndActionDef) -> Result<Self, Self::Error> {
        match def {
            EndActionDef::Named(name) => match name.as_str() {
                "pause" => Ok(Self::Pause),
                "continue" => Ok(Self::Continue),
                "restart" => Ok(Self::Restart { at: 0.0 }),
                "wrap" => Ok(Self::Wrap { at: 0.0 }),
                other => Err(ChoreoError::validation(format!(
                    "unknown end action {other:?}"
                ))),
            },
            EndActionDef::RestartAt { restart_at } => Ok(Self::Restart { at: restart_at }),
            EndActionDef::WrapAt { wrap_at } => Ok(Self::Wrap { at: wrap_at }),
        }
    }
}

impl From<EndAction> for EndActionDef {
    fn from(action: EndAction) -> Self {
        match action {
            EndAction::Pause => Self::Named("pause".to_owned()),
            EndAction::Continue => Self::Named("continue".to_owned()),
            EndAction::Restart { at } => Self::RestartAt { restart_at: at },
            EndAction::Wrap { at } => Self::WrapAt { wrap_at: at },
        }
    }
}

/// Construction-time timeline configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TimelineOpts {
    /// Start playing as soon as the timeline is built.
    pub autoplay: bool,
    /// Multiplier applied to elapsed clock time while playing.
    pub time_scale: f64,
    /// Overshoot policy, fixed for the timeline's lifetime.
    pub at_end: EndAction,
}

impl Default for TimelineOpts {
    fn default() -> Self {
        Self {
            autoplay: false,
            time_scale: 1.0,
            at_end: EndAction::Pause,
        }
    }
}

impl TimelineOpts {
    /// Parse and validate options from JSON.
    pub fn from_json(s: &str) -> ChoreoResult<Self> {
        let opts: Self = serde_json::from_str(s).map_err(|e| ChoreoError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject non-finite numbers.
    pub fn validate(&self) -> ChoreoResult<()> {
        if !self.time_scale.is_finite() {
            return Err(ChoreoError::validation("time scale must be finite"));
        }
        self.at_end.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/options.rs"]
mod tests;
