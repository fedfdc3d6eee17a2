//! Side effect that handles matching actions while its window is open.

use crate::core::{ExecutionPolicy, SideEffectKind, State};
use crate::effects::context::InstanceContext;
use crate::effects::invocation::{drive, Invocations};
use crate::effects::side_effect::{SideEffect, SideEffectInstance, TriggerHandler};
use futures::future::FutureExt;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Projection of the action sum type onto the payload a handler wants.
pub type ActionMatcher<A, T> = Arc<dyn Fn(&A) -> Option<T> + Send + Sync>;

/// Invokes its handler for every dispatched action the matcher accepts.
///
/// The handler sees the state the machine was in when the action was
/// dispatched. Actions the matcher rejects pass by unobserved.
pub struct OnAction<S: State, A, T> {
    kind: SideEffectKind,
    policy: ExecutionPolicy,
    matcher: ActionMatcher<A, T>,
    handler: TriggerHandler<T, S>,
}

impl<S: State, A, T> OnAction<S, A, T> {
    pub fn new(
        kind: SideEffectKind,
        policy: ExecutionPolicy,
        matcher: ActionMatcher<A, T>,
        handler: TriggerHandler<T, S>,
    ) -> Self {
        OnAction {
            kind,
            policy,
            matcher,
            handler,
        }
    }
}

impl<S, A, T> SideEffect<S, A> for OnAction<S, A, T>
where
    S: State,
    A: Send + Sync + 'static,
    T: Send + 'static,
{
    fn kind(&self) -> SideEffectKind {
        self.kind
    }

    fn policy(&self) -> Option<ExecutionPolicy> {
        Some(self.policy)
    }

    fn instantiate(&self, ctx: InstanceContext<S, A>) -> SideEffectInstance {
        let invocations = Invocations::new(
            self.kind,
            self.policy,
            ctx.ordered_capacity,
            Arc::clone(&self.handler),
        );
        let matcher = Arc::clone(&self.matcher);
        let run = drive(ctx, invocations, stream::pending().boxed(), move |action: &A| {
            matcher(action)
        })
        .boxed();
        SideEffectInstance::new(self.kind, run)
    }
}
