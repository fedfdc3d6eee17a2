//! Identity-scoped restart of nested side effects.

use crate::core::{SideEffectKind, State};
use crate::effects::context::{InstanceContext, Signal};
use crate::effects::side_effect::{SideEffect, SideEffectBuilder, SideEffectInstance};
use crate::effects::window::WindowSet;
use futures::future::FutureExt;
use std::fmt::Debug;
use std::sync::Arc;

/// Derives the identity key from a state.
pub type IdentityFn<S, K> = Arc<dyn Fn(&S) -> K + Send + Sync>;

/// Runs a nested set of side effects and restarts all of them whenever the
/// identity key derived from the state changes.
///
/// While the key stays equal, state ticks are only forwarded to the nested
/// windows. When it changes, every nested window is closed (and awaited)
/// before the nested set is reopened from the new state.
pub struct IdentityScope<S: State, A, K> {
    identity: IdentityFn<S, K>,
    nested: Arc<[SideEffectBuilder<S, A>]>,
}

impl<S: State, A, K> IdentityScope<S, A, K> {
    pub fn new(identity: IdentityFn<S, K>, nested: Arc<[SideEffectBuilder<S, A>]>) -> Self {
        IdentityScope { identity, nested }
    }
}

impl<S, A, K> SideEffect<S, A> for IdentityScope<S, A, K>
where
    S: State,
    A: Clone + Send + Sync + 'static,
    K: PartialEq + Debug + Send + Sync + 'static,
{
    fn kind(&self) -> SideEffectKind {
        SideEffectKind::IdentityScope
    }

    fn instantiate(&self, ctx: InstanceContext<S, A>) -> SideEffectInstance {
        let identity = Arc::clone(&self.identity);
        let nested = Arc::clone(&self.nested);
        let InstanceContext {
            initial,
            mut signals,
            sink,
            ordered_capacity,
            ..
        } = ctx;

        let run = async move {
            let mut key = identity(&initial);
            let mut windows = WindowSet::new(nested, sink, ordered_capacity);
            windows.observe(&initial).await?;

            while let Some(signal) = signals.recv().await {
                match signal {
                    Signal::State(state) => {
                        let next = identity(&state);
                        if next != key {
                            tracing::debug!(previous = ?key, next = ?next, "identity changed, restarting nested side effects");
                            windows.close_all().await;
                            key = next;
                        }
                        windows.observe(&state).await?;
                    }
                    Signal::Action(action) => windows.dispatch(&action),
                }
            }

            windows.close_all().await;
            Ok(())
        }
        .boxed();
        SideEffectInstance::new(SideEffectKind::IdentityScope, run)
    }
}
