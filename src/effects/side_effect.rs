//! The side-effect abstraction and the builders an orchestrator runs.

use crate::core::{ChangedState, ExecutionPolicy, Predicate, SideEffectKind, State, StateSnapshot};
use crate::effects::context::InstanceContext;
use crate::effects::error::{EngineError, HandlerResult};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Type-erased handler that receives a trigger value and the state snapshot.
pub type TriggerHandler<T, S> =
    Arc<dyn Fn(T, StateSnapshot<S>) -> BoxFuture<'static, HandlerResult<ChangedState<S>>> + Send + Sync>;

/// Type-erased handler that only receives the state snapshot.
pub type EnterHandler<S> =
    Arc<dyn Fn(StateSnapshot<S>) -> BoxFuture<'static, HandlerResult<ChangedState<S>>> + Send + Sync>;

/// A unit of asynchronous work scoped to an activation window.
///
/// Implementations are stateless factories: every call to `instantiate`
/// produces an independent instance for one window.
pub trait SideEffect<S: State, A>: Send + Sync {
    fn kind(&self) -> SideEffectKind;

    /// How concurrent triggers are resolved. `None` for side effects that
    /// never have more than one invocation (on-enter, identity scopes).
    fn policy(&self) -> Option<ExecutionPolicy> {
        None
    }

    fn instantiate(&self, ctx: InstanceContext<S, A>) -> SideEffectInstance;
}

/// A live unit of work created when a window opens.
///
/// The instance does nothing until [`run`](SideEffectInstance::run) is
/// polled; user code (stream factories, handler closures) only runs from
/// there. Dropping the future cancels the instance along with every
/// handler invocation it owns.
pub struct SideEffectInstance {
    kind: SideEffectKind,
    run: BoxFuture<'static, Result<(), EngineError>>,
}

impl SideEffectInstance {
    pub fn new(kind: SideEffectKind, run: BoxFuture<'static, Result<(), EngineError>>) -> Self {
        SideEffectInstance { kind, run }
    }

    pub fn kind(&self) -> SideEffectKind {
        self.kind
    }

    pub fn run(self) -> BoxFuture<'static, Result<(), EngineError>> {
        self.run
    }
}

impl fmt::Debug for SideEffectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffectInstance")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A predicate paired with the side effect it gates.
pub struct SideEffectBuilder<S: State, A> {
    predicate: Predicate<S>,
    side_effect: Arc<dyn SideEffect<S, A>>,
}

impl<S: State, A> SideEffectBuilder<S, A> {
    pub fn new(predicate: Predicate<S>, side_effect: Arc<dyn SideEffect<S, A>>) -> Self {
        SideEffectBuilder {
            predicate,
            side_effect,
        }
    }

    pub fn predicate(&self) -> &Predicate<S> {
        &self.predicate
    }

    pub fn kind(&self) -> SideEffectKind {
        self.side_effect.kind()
    }

    pub fn policy(&self) -> Option<ExecutionPolicy> {
        self.side_effect.policy()
    }

    /// Create the instance for a window that just opened.
    pub fn instantiate(&self, ctx: InstanceContext<S, A>) -> SideEffectInstance {
        self.side_effect.instantiate(ctx)
    }
}

impl<S: State, A> Clone for SideEffectBuilder<S, A> {
    fn clone(&self) -> Self {
        SideEffectBuilder {
            predicate: self.predicate.clone(),
            side_effect: Arc::clone(&self.side_effect),
        }
    }
}

impl<S: State, A> fmt::Debug for SideEffectBuilder<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffectBuilder")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
