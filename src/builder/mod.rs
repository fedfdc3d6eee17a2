//! Builder API for declaring side effects.
//!
//! This module provides the fluent [`ScopeBuilder`] and macros for
//! registering side effects against state predicates. Registration only
//! records immutable entries; nothing runs until an orchestrator opens the
//! corresponding windows.

pub mod error;
pub mod macros;
pub mod scope;

pub use error::BuildError;
pub use scope::{ScopeBuilder, SideEffects};
