//! Execution policies and side-effect kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a side effect resolves a new trigger while a previous handler
/// invocation is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// Cancel the running invocation, discard its result, start the new one.
    CancelPrevious,

    /// Queue the trigger; invocations run one at a time in arrival order.
    Ordered,
}

impl ExecutionPolicy {
    /// Default for on-action and on-enter handlers.
    pub const ACTION_DEFAULT: ExecutionPolicy = ExecutionPolicy::CancelPrevious;

    /// Default for collect-while handlers.
    pub const COLLECT_DEFAULT: ExecutionPolicy = ExecutionPolicy::Ordered;
}

/// The variant of a registered side effect, used for diagnostics and as the
/// origin of recorded transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffectKind {
    OnAction,
    OnActionEffect,
    OnEnter,
    OnEnterEffect,
    CollectWhile,
    CollectWhileEffect,
    IdentityScope,
}

impl SideEffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnAction => "on-action",
            Self::OnActionEffect => "on-action-effect",
            Self::OnEnter => "on-enter",
            Self::OnEnterEffect => "on-enter-effect",
            Self::CollectWhile => "collect-while",
            Self::CollectWhileEffect => "collect-while-effect",
            Self::IdentityScope => "until-identity-changes",
        }
    }

    /// Effect variants never produce a state change.
    pub fn is_effect_only(&self) -> bool {
        matches!(
            self,
            Self::OnActionEffect | Self::OnEnterEffect | Self::CollectWhileEffect
        )
    }
}

impl fmt::Display for SideEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
