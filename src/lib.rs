//! Flowscope: predicate-scoped side effects for reactive state machines
//!
//! A side effect is a unit of asynchronous work (handle an action, react to
//! entering a state, or consume a stream) whose lifetime is bounded by an
//! *activation window*: the span of time during which a predicate over the
//! machine's state holds. Flowscope starts side effects when their window
//! opens, cancels them when it closes, and resolves concurrent triggers
//! with an execution policy.
//!
//! # Core Concepts
//!
//! - **State**: immutable snapshots via the [`State`] trait
//! - **Predicates**: pure functions that define activation windows
//! - **Side effects**: on-action, on-enter and collect-while, each with an
//!   effect-only form that cannot change state
//! - **Execution policies**: cancel-previous or ordered handling of
//!   concurrent triggers
//! - **Identity scopes**: restart nested side effects when a derived key
//!   changes
//!
//! Handlers never write state. They return a [`ChangedState`] which the
//! orchestrator applies at a single serialization point.
//!
//! # Example
//!
//! ```rust
//! use flowscope::builder::ScopeBuilder;
//! use flowscope::core::{ExecutionPolicy, State};
//! use flowscope::machine::StateMachine;
//! use flowscope::state_enum;
//! use futures::stream;
//!
//! state_enum! {
//!     enum Counter {
//!         Counting,
//!         Done,
//!     }
//!     final: [Done]
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let side_effects = ScopeBuilder::<Counter, ()>::new()
//!     .in_state(|s| *s == Counter::Counting, |scope| {
//!         scope.collect_while_with(
//!             ExecutionPolicy::Ordered,
//!             |_| stream::iter(1..=3),
//!             |tick: u32, s| async move {
//!                 if tick == 3 {
//!                     Ok(s.override_state(Counter::Done))
//!                 } else {
//!                     Ok(s.no_change())
//!                 }
//!             },
//!         )
//!     })
//!     .build()
//!     .unwrap();
//!
//! let machine = StateMachine::new(Counter::Counting, side_effects).start();
//! let state = machine.wait_until(|s| s.is_final()).await.unwrap();
//! assert_eq!(state, Counter::Done);
//! # machine.shutdown().await.unwrap();
//! # });
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod machine;

// Re-export commonly used types
pub use crate::builder::{ScopeBuilder, SideEffects};
pub use crate::core::{
    Action, ChangedState, ExecutionPolicy, Predicate, ReadOnlyState, State, StateSnapshot,
};
pub use crate::effects::{EngineError, HandlerError, HandlerResult};
pub use crate::machine::{EngineConfig, MachineHandle, StateMachine};
