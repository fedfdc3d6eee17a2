//! Capability-restricted views of the state handed to handlers.
//!
//! Both views hold the state observed when the invocation started. They are
//! not refreshed while the handler runs.

use super::changed::ChangedState;
use super::state::State;

/// Read-write accessor given to state-changing handlers.
///
/// Besides reading the snapshot it can build the [`ChangedState`] the
/// handler returns.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot<S: State> {
    state: S,
}

impl<S: State> StateSnapshot<S> {
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// The state at invocation start.
    pub fn snapshot(&self) -> &S {
        &self.state
    }

    pub fn into_inner(self) -> S {
        self.state
    }

    /// Replace the state wholesale.
    pub fn override_state(&self, next: S) -> ChangedState<S> {
        ChangedState::Override(next)
    }

    /// Derive the next state from the state current at application time.
    pub fn mutate<F>(&self, reducer: F) -> ChangedState<S>
    where
        F: FnOnce(&S) -> S + Send + 'static,
    {
        ChangedState::mutate(reducer)
    }

    pub fn no_change(&self) -> ChangedState<S> {
        ChangedState::Unchanged
    }

    /// Downgrade to the read-only view.
    pub fn read_only(self) -> ReadOnlyState<S> {
        ReadOnlyState { state: self.state }
    }
}

/// Read-only accessor given to effect handlers.
///
/// It has no way to produce a [`ChangedState`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReadOnlyState<S: State> {
    state: S,
}

impl<S: State> ReadOnlyState<S> {
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// The state at invocation start.
    pub fn snapshot(&self) -> &S {
        &self.state
    }

    pub fn into_inner(self) -> S {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Form {
        Editing { text: String },
        Submitted,
    }

    impl State for Form {
        fn name(&self) -> &str {
            match self {
                Self::Editing { .. } => "Editing",
                Self::Submitted => "Submitted",
            }
        }
    }

    #[test]
    fn snapshot_exposes_initial_value() {
        let accessor = StateSnapshot::new(Form::Editing {
            text: "draft".into(),
        });
        assert_eq!(
            accessor.snapshot(),
            &Form::Editing {
                text: "draft".into()
            }
        );
    }

    #[test]
    fn read_write_accessor_builds_changes() {
        let accessor = StateSnapshot::new(Form::Editing { text: "a".into() });

        let replaced = accessor.override_state(Form::Submitted);
        assert_eq!(replaced.apply(accessor.snapshot()), Some(Form::Submitted));

        let appended = accessor.mutate(|s| match s {
            Form::Editing { text } => Form::Editing {
                text: format!("{text}b"),
            },
            other => other.clone(),
        });
        assert_eq!(
            appended.apply(accessor.snapshot()),
            Some(Form::Editing { text: "ab".into() })
        );

        assert!(accessor.no_change().is_unchanged());
    }

    #[test]
    fn read_only_keeps_the_same_snapshot() {
        let accessor = StateSnapshot::new(Form::Submitted);
        let read_only = accessor.clone().read_only();
        assert_eq!(read_only.snapshot(), accessor.snapshot());
        assert_eq!(read_only.into_inner(), Form::Submitted);
    }
}
