//! The side-effect lifecycle engine.
//!
//! This module is the "imperative shell" around the pure core: it turns
//! registered side effects into live, cancellable tokio tasks.
//!
//! # Key Concepts
//!
//! - **Side effects**: on-action, on-enter and collect-while, each in a
//!   state-changing and an effect-only form
//! - **Builders**: a predicate paired with a side-effect factory
//! - **Windows**: a [`WindowSet`] opens an instance when a predicate becomes
//!   true and cancels it (awaiting termination) when it becomes false
//! - **Identity scopes**: restart nested side effects when a derived key
//!   changes
//!
//! Handler invocations are futures owned by their instance task, so
//! dropping them is how cancellation happens. Results travel back to the
//! orchestrator tagged with the window they came from.

mod collect_while;
mod context;
mod error;
mod identity;
mod invocation;
mod on_action;
mod on_enter;
mod side_effect;
mod window;

pub use collect_while::{CollectWhile, StreamSource};
pub use context::{ChangeSink, Emission, InstanceContext, Signal, WindowId, WindowToken};
pub use error::{EngineError, HandlerError, HandlerResult};
pub use identity::{IdentityFn, IdentityScope};
pub use on_action::{ActionMatcher, OnAction};
pub use on_enter::OnEnter;
pub use side_effect::{
    EnterHandler, SideEffect, SideEffectBuilder, SideEffectInstance, TriggerHandler,
};
pub use window::WindowSet;
