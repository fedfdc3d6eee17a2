//! Core value types of the side-effect engine.
//!
//! This module contains the pure pieces that the runtime is built from:
//! - State and action traits
//! - Predicates that define activation windows
//! - Execution policies
//! - `ChangedState` results and the accessors handlers receive
//! - History of applied transitions
//!
//! Nothing in this module spawns tasks or performs I/O.

mod accessor;
mod changed;
mod guard;
mod history;
mod policy;
mod state;

pub use accessor::{ReadOnlyState, StateSnapshot};
pub use changed::ChangedState;
pub use guard::{Predicate, PredicatePanic};
pub(crate) use guard::panic_message;
pub use history::{StateHistory, StateTransition};
pub use policy::{ExecutionPolicy, SideEffectKind};
pub use state::{Action, State};
