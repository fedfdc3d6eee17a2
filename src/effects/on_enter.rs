//! Side effect that runs once each time its window opens.

use crate::core::{SideEffectKind, State, StateSnapshot};
use crate::effects::context::{closed, InstanceContext};
use crate::effects::error::EngineError;
use crate::effects::side_effect::{EnterHandler, SideEffect, SideEffectInstance};
use futures::future::FutureExt;
use std::sync::Arc;

/// Runs its handler with the state at window-open time.
///
/// The handler runs once per window; it is not re-triggered while the
/// predicate stays true. Closing the window drops an unfinished handler
/// and its result.
pub struct OnEnter<S: State> {
    kind: SideEffectKind,
    handler: EnterHandler<S>,
}

impl<S: State> OnEnter<S> {
    pub fn new(kind: SideEffectKind, handler: EnterHandler<S>) -> Self {
        OnEnter { kind, handler }
    }
}

impl<S, A> SideEffect<S, A> for OnEnter<S>
where
    S: State,
    A: Send + 'static,
{
    fn kind(&self) -> SideEffectKind {
        self.kind
    }

    fn instantiate(&self, ctx: InstanceContext<S, A>) -> SideEffectInstance {
        let kind = self.kind;
        let handler = Arc::clone(&self.handler);
        let InstanceContext {
            initial,
            mut signals,
            sink,
            ..
        } = ctx;

        // The handler is called on first poll, inside the instance task.
        let run = async move {
            let invocation = handler(StateSnapshot::new(initial));
            tokio::select! {
                biased;

                _ = closed(&mut signals) => {
                    tracing::trace!(kind = %kind, "window closed before handler finished");
                    Ok(())
                }
                result = invocation => {
                    let change = result.map_err(|source| EngineError::handler(kind, source))?;
                    sink.emit(kind, change)
                }
            }
        }
        .boxed();
        SideEffectInstance::new(kind, run)
    }
}
