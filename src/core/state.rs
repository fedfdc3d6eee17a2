//! State and Action traits for state machine values.
//!
//! States are immutable snapshots that are superseded wholesale on every
//! transition. Actions are the inputs dispatched into a running machine.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure - no side effects. States represent immutable
/// values that describe the current position in a state machine. Side
/// effects only ever read a state; they propose replacements through
/// [`ChangedState`](super::ChangedState).
///
/// # Required Traits
///
/// - `Clone`: snapshots are handed to every live side effect
/// - `PartialEq`: the orchestrator skips republishing identical states
/// - `Debug`: states must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: recorded history is serializable
///
/// # Example
///
/// ```rust
/// use flowscope::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Screen {
///     Loading,
///     Content { items: Vec<String> },
///     Error,
/// }
///
/// impl State for Screen {
///     fn name(&self) -> &str {
///         match self {
///             Self::Loading => "Loading",
///             Self::Content { .. } => "Content",
///             Self::Error => "Error",
///         }
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Error)
///     }
/// }
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

/// Marker trait for the action sum type of a machine.
///
/// Actions are plain enums; side effects select the variants they care
/// about with a projection closure (`Fn(&A) -> Option<T>`), so no runtime
/// type tokens are involved.
pub trait Action: Clone + Debug + Send + Sync + 'static {}

impl<T> Action for T where T: Clone + Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Loading,
        Content { page: u32 },
        Failed,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Loading => "Loading",
                Self::Content { .. } => "Content",
                Self::Failed => "Failed",
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Failed)
        }

        fn is_error(&self) -> bool {
            matches!(self, Self::Failed)
        }
    }

    fn assert_action<A: Action>(_action: &A) {}

    #[test]
    fn state_name_ignores_payload() {
        assert_eq!(TestState::Content { page: 1 }.name(), "Content");
        assert_eq!(TestState::Content { page: 7 }.name(), "Content");
        assert_eq!(TestState::Loading.name(), "Loading");
    }

    #[test]
    fn final_and_error_flags() {
        assert!(!TestState::Loading.is_final());
        assert!(TestState::Failed.is_final());
        assert!(TestState::Failed.is_error());
        assert!(!TestState::Content { page: 0 }.is_error());
    }

    #[test]
    fn plain_enums_are_actions() {
        #[derive(Clone, Debug)]
        enum Input {
            Refresh,
        }
        assert_action(&Input::Refresh);
        assert_action(&42u8);
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState::Content { page: 3 };
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
