//! Errors raised while building side-effect registrations.

use thiserror::Error;

/// Errors that can occur when finalizing a [`ScopeBuilder`](super::ScopeBuilder).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("No side effects registered. Register at least one before .build()")]
    NoSideEffects,

    #[error("until_identity_changes at position {position} has no nested side effects")]
    EmptyIdentityScope { position: usize },
}
