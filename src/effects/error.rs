//! Errors raised by handlers and by the side-effect runtime.

use crate::core::SideEffectKind;
use std::error::Error as StdError;
use thiserror::Error;

/// Opaque failure returned by a handler.
///
/// Any error type converts into it with [`HandlerError::new`]; plain
/// messages go through [`HandlerError::msg`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(Box<dyn StdError + Send + Sync>);

impl HandlerError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        HandlerError(error.into())
    }

    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError(message.into().into())
    }

    /// The wrapped error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// Result type returned by handlers.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Fatal failures of a running machine.
///
/// Every variant aborts the whole machine; there is no per-side-effect
/// isolation. Cancellation is never reported through this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("predicate of {kind} side effect panicked on state '{state}': {message}")]
    PredicateFailed {
        kind: SideEffectKind,
        state: String,
        message: String,
    },

    #[error("{kind} handler failed: {source}")]
    HandlerFailed {
        kind: SideEffectKind,
        #[source]
        source: HandlerError,
    },

    #[error("{kind} side effect panicked: {message}")]
    Panicked {
        kind: SideEffectKind,
        message: String,
    },

    #[error("state machine is no longer running")]
    MachineStopped,

    #[error("state machine task failed: {0}")]
    TaskFailed(String),
}

impl EngineError {
    pub(crate) fn handler(kind: SideEffectKind, source: HandlerError) -> Self {
        EngineError::HandlerFailed { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_wraps_std_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = HandlerError::new(io);
        assert_eq!(err.to_string(), "disk gone");
        assert!(err.inner().downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn engine_error_names_the_side_effect() {
        let err = EngineError::handler(SideEffectKind::OnAction, HandlerError::msg("boom"));
        assert_eq!(err.to_string(), "on-action handler failed: boom");
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn predicate_failure_message() {
        let err = EngineError::PredicateFailed {
            kind: SideEffectKind::OnEnter,
            state: "Loading".into(),
            message: "bad".into(),
        };
        assert_eq!(
            err.to_string(),
            "predicate of on-enter side effect panicked on state 'Loading': bad"
        );
    }
}
