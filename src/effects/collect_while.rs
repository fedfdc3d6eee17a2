//! Side effect that consumes a stream while its window is open.

use crate::core::{ExecutionPolicy, SideEffectKind, State};
use crate::effects::context::InstanceContext;
use crate::effects::invocation::{drive, Invocations};
use crate::effects::side_effect::{SideEffect, SideEffectInstance, TriggerHandler};
use futures::future::FutureExt;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Produces the stream to collect, given the state at window-open time.
///
/// A factory rather than a stream because every window needs a fresh
/// subscription.
pub type StreamSource<S, T> = Arc<dyn Fn(&S) -> BoxStream<'static, T> + Send + Sync>;

/// Invokes its handler once per item of a lazily created stream.
///
/// Under `Ordered` pending items wait in a bounded queue; once the queue
/// is full the stream is not polled until an invocation completes. Under
/// `CancelPrevious` each item replaces the running invocation.
pub struct CollectWhile<S: State, T> {
    kind: SideEffectKind,
    policy: ExecutionPolicy,
    source: StreamSource<S, T>,
    handler: TriggerHandler<T, S>,
}

impl<S: State, T> CollectWhile<S, T> {
    pub fn new(
        kind: SideEffectKind,
        policy: ExecutionPolicy,
        source: StreamSource<S, T>,
        handler: TriggerHandler<T, S>,
    ) -> Self {
        CollectWhile {
            kind,
            policy,
            source,
            handler,
        }
    }
}

impl<S, A, T> SideEffect<S, A> for CollectWhile<S, T>
where
    S: State,
    A: Send + 'static,
    T: Send + 'static,
{
    fn kind(&self) -> SideEffectKind {
        self.kind
    }

    fn policy(&self) -> Option<ExecutionPolicy> {
        Some(self.policy)
    }

    fn instantiate(&self, ctx: InstanceContext<S, A>) -> SideEffectInstance {
        let source = Arc::clone(&self.source);
        let invocations = Invocations::new(
            self.kind,
            self.policy,
            ctx.ordered_capacity,
            Arc::clone(&self.handler),
        );
        let run = async move {
            let items = source(&ctx.initial);
            drive(ctx, invocations, items, |_: &A| None).await
        }
        .boxed();
        SideEffectInstance::new(self.kind, run)
    }
}
