//! Predicates that define activation windows.
//!
//! A predicate is a pure boolean function over the state. A side effect's
//! activation window is open for exactly as long as its predicate holds.

use super::state::State;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// A predicate panicked while being evaluated.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("predicate panicked on state '{state}': {message}")]
pub struct PredicatePanic {
    pub state: String,
    pub message: String,
}

/// Pure predicate that decides whether an activation window is open.
///
/// Predicates are cheap to clone (the closure is shared) so the same
/// predicate can back several registrations.
///
/// # Example
///
/// ```rust
/// use flowscope::core::{Predicate, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door {
///     Open,
///     Closed,
///     Locked,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Locked => "Locked",
///         }
///     }
/// }
///
/// let shut = Predicate::new(|s: &Door| !matches!(s, Door::Open));
/// let unlocked = Predicate::new(|s: &Door| !matches!(s, Door::Locked));
/// let closed = shut.and(&unlocked);
///
/// assert!(closed.check(&Door::Closed));
/// assert!(!closed.check(&Door::Locked));
/// assert!(!closed.check(&Door::Open));
/// ```
pub struct Predicate<S: State> {
    check: Arc<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S: State> Predicate<S> {
    /// Create a predicate from a pure function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Predicate {
            check: Arc::new(predicate),
        }
    }

    /// A predicate that holds for every state.
    pub fn always() -> Self {
        Predicate::new(|_| true)
    }

    /// Evaluate the predicate.
    pub fn check(&self, state: &S) -> bool {
        (self.check)(state)
    }

    /// Evaluate the predicate, trapping a panic as an error.
    ///
    /// The orchestrator uses this so a broken predicate becomes a fatal
    /// machine error instead of tearing down the runtime thread.
    pub fn evaluate(&self, state: &S) -> Result<bool, PredicatePanic> {
        catch_unwind(AssertUnwindSafe(|| (self.check)(state))).map_err(|payload| PredicatePanic {
            state: state.name().to_string(),
            message: panic_message(payload.as_ref()),
        })
    }

    /// Both predicates hold.
    pub fn and(&self, other: &Predicate<S>) -> Predicate<S> {
        let left = Arc::clone(&self.check);
        let right = Arc::clone(&other.check);
        Predicate::new(move |s| left(s) && right(s))
    }

    /// Either predicate holds.
    pub fn or(&self, other: &Predicate<S>) -> Predicate<S> {
        let left = Arc::clone(&self.check);
        let right = Arc::clone(&other.check);
        Predicate::new(move |s| left(s) || right(s))
    }

    /// The predicate does not hold.
    pub fn not(&self) -> Predicate<S> {
        let inner = Arc::clone(&self.check);
        Predicate::new(move |s| !inner(s))
    }
}

impl<S: State> Clone for Predicate<S> {
    fn clone(&self) -> Self {
        Predicate {
            check: Arc::clone(&self.check),
        }
    }
}

impl<S: State> fmt::Debug for Predicate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Loading { attempt: u32 },
        Ready,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Loading { .. } => "Loading",
                Self::Ready => "Ready",
            }
        }
    }

    #[test]
    fn predicate_matches_region() {
        let loading = Predicate::new(|s: &TestState| matches!(s, TestState::Loading { .. }));

        assert!(loading.check(&TestState::Loading { attempt: 1 }));
        assert!(loading.check(&TestState::Loading { attempt: 2 }));
        assert!(!loading.check(&TestState::Idle));
    }

    #[test]
    fn always_holds() {
        let always = Predicate::always();
        assert!(always.check(&TestState::Idle));
        assert!(always.check(&TestState::Ready));
    }

    #[test]
    fn combinators_compose() {
        let loading = Predicate::new(|s: &TestState| matches!(s, TestState::Loading { .. }));
        let retried =
            Predicate::new(|s: &TestState| matches!(s, TestState::Loading { attempt } if *attempt > 1));

        let first_attempt = loading.and(&retried.not());
        assert!(first_attempt.check(&TestState::Loading { attempt: 1 }));
        assert!(!first_attempt.check(&TestState::Loading { attempt: 3 }));

        let busy_or_ready = loading.or(&Predicate::new(|s| matches!(s, TestState::Ready)));
        assert!(busy_or_ready.check(&TestState::Ready));
        assert!(!busy_or_ready.check(&TestState::Idle));
    }

    #[test]
    fn clones_share_the_function() {
        let ready = Predicate::new(|s: &TestState| matches!(s, TestState::Ready));
        let copy = ready.clone();
        assert_eq!(ready.check(&TestState::Ready), copy.check(&TestState::Ready));
    }

    #[test]
    fn evaluate_traps_panics() {
        let broken = Predicate::new(|s: &TestState| match s {
            TestState::Ready => panic!("unexpected state"),
            _ => true,
        });

        assert_eq!(broken.evaluate(&TestState::Idle), Ok(true));

        let err = broken.evaluate(&TestState::Ready).unwrap_err();
        assert_eq!(err.state, "Ready");
        assert_eq!(err.message, "unexpected state");
    }
}
