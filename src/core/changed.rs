//! State change requests produced by handlers.

use super::state::State;
use std::fmt;

/// A handler's result: either no change, or a proposed new state.
///
/// Side effects never write state. They return a `ChangedState` and the
/// orchestrator applies it at a single serialization point.
pub enum ChangedState<S: State> {
    /// Leave the state as it is.
    Unchanged,

    /// Replace the state wholesale.
    Override(S),

    /// Derive the next state from whatever state is current when the
    /// change is applied.
    Mutate(Box<dyn FnOnce(&S) -> S + Send>),
}

impl<S: State> ChangedState<S> {
    /// Build a `Mutate` change from a closure.
    pub fn mutate<F>(reducer: F) -> Self
    where
        F: FnOnce(&S) -> S + Send + 'static,
    {
        ChangedState::Mutate(Box::new(reducer))
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, ChangedState::Unchanged)
    }

    /// Apply the change to `current`.
    ///
    /// Returns `None` when the change is a no-op.
    pub fn apply(self, current: &S) -> Option<S> {
        match self {
            ChangedState::Unchanged => None,
            ChangedState::Override(next) => Some(next),
            ChangedState::Mutate(reducer) => Some(reducer(current)),
        }
    }
}

impl<S: State> fmt::Debug for ChangedState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangedState::Unchanged => f.write_str("Unchanged"),
            ChangedState::Override(state) => f.debug_tuple("Override").field(state).finish(),
            ChangedState::Mutate(_) => f.write_str("Mutate(..)"),
        }
    }
}
