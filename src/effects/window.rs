//! Opening and closing activation windows.
//!
//! A [`WindowSet`] owns one slot per registered side effect. On every state
//! tick it evaluates each predicate, starts an instance for windows that
//! opened, forwards the tick to windows that stay open, and cancels
//! instances whose window closed. Cancellation is a join: the slot is only
//! free again once the instance task has terminated.

use crate::core::{panic_message, SideEffectKind, State};
use crate::effects::context::{ChangeSink, InstanceContext, Signal, WindowId, WindowToken};
use crate::effects::error::EngineError;
use crate::effects::side_effect::SideEffectBuilder;
use futures::future::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// A spawned instance and the handles needed to cancel it.
pub(crate) struct RunningInstance<S: State, A> {
    kind: SideEffectKind,
    window: WindowId,
    token: WindowToken,
    signals: Option<mpsc::UnboundedSender<Signal<S, A>>>,
    handle: Option<JoinHandle<()>>,
}

impl<S, A> RunningInstance<S, A>
where
    S: State,
    A: Send + 'static,
{
    /// Instantiate `builder` for a window that just opened and spawn it.
    fn launch(
        builder: &SideEffectBuilder<S, A>,
        state: S,
        parent: &ChangeSink<S>,
        ordered_capacity: usize,
    ) -> Self {
        let sink = parent.child();
        let token = sink.token().clone();
        let failures = sink.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = InstanceContext::new(state, rx, sink, ordered_capacity);
        let window = ctx.window();
        let kind = builder.kind();

        tracing::debug!(%kind, %window, policy = ?builder.policy(), "window opened");
        let span = tracing::debug_span!("side_effect", %kind, %window);
        let builder = builder.clone();
        // Instantiate inside the task: a panicking factory is a `Panicked` failure.
        let run = async move { builder.instantiate(ctx).run().await };
        let task = async move {
            match AssertUnwindSafe(run).catch_unwind().await {
                Ok(Ok(())) => tracing::trace!("instance finished"),
                Ok(Err(error)) => {
                    tracing::error!(%error, "side effect failed");
                    failures.fail(error);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(%message, "side effect panicked");
                    failures.fail(EngineError::Panicked { kind, message });
                }
            }
        }
        .instrument(span);

        RunningInstance {
            kind,
            window,
            token,
            signals: Some(tx),
            handle: Some(tokio::spawn(task)),
        }
    }

    fn send(&self, signal: Signal<S, A>) {
        if let Some(signals) = &self.signals {
            // A finished instance has dropped its receiver; nothing to deliver.
            let _ = signals.send(signal);
        }
    }

    /// Close the window and wait for the instance to terminate.
    async fn cancel(mut self) {
        self.token.close();
        self.signals = None;
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!(kind = %self.kind, window = %self.window, %err, "instance task did not exit cleanly");
            }
        }
        tracing::debug!(kind = %self.kind, window = %self.window, "window closed");
    }
}

impl<S: State, A> Drop for RunningInstance<S, A> {
    fn drop(&mut self) {
        // Only reached without `cancel` on error paths.
        if let Some(handle) = self.handle.take() {
            self.token.close();
            handle.abort();
        }
    }
}

struct WindowSlot<S: State, A> {
    builder: SideEffectBuilder<S, A>,
    running: Option<RunningInstance<S, A>>,
}

/// Window bookkeeping for an ordered list of side-effect builders.
pub struct WindowSet<S: State, A> {
    slots: Vec<WindowSlot<S, A>>,
    sink: ChangeSink<S>,
    ordered_capacity: usize,
}

impl<S, A> WindowSet<S, A>
where
    S: State,
    A: Clone + Send + 'static,
{
    /// `sink` is the parent window's sink; each opened window gets a child
    /// of it.
    pub fn new(
        builders: Arc<[SideEffectBuilder<S, A>]>,
        sink: ChangeSink<S>,
        ordered_capacity: usize,
    ) -> Self {
        let slots = builders
            .iter()
            .map(|builder| WindowSlot {
                builder: builder.clone(),
                running: None,
            })
            .collect();
        WindowSet {
            slots,
            sink,
            ordered_capacity,
        }
    }

    /// Re-evaluate every predicate against `state`.
    pub async fn observe(&mut self, state: &S) -> Result<(), EngineError> {
        for slot in &mut self.slots {
            let open = slot
                .builder
                .predicate()
                .evaluate(state)
                .map_err(|panic| EngineError::PredicateFailed {
                    kind: slot.builder.kind(),
                    state: panic.state,
                    message: panic.message,
                })?;

            match (slot.running.take(), open) {
                (Some(running), true) => {
                    running.send(Signal::State(state.clone()));
                    slot.running = Some(running);
                }
                (Some(running), false) => running.cancel().await,
                (None, true) => {
                    slot.running = Some(RunningInstance::launch(
                        &slot.builder,
                        state.clone(),
                        &self.sink,
                        self.ordered_capacity,
                    ));
                }
                (None, false) => {}
            }
        }
        Ok(())
    }

    /// Deliver an action to every open window.
    pub fn dispatch(&self, action: &A) {
        for running in self.slots.iter().filter_map(|slot| slot.running.as_ref()) {
            running.send(Signal::Action(action.clone()));
        }
    }

    /// Cancel every open window, awaiting each termination.
    pub async fn close_all(&mut self) {
        for slot in &mut self.slots {
            if let Some(running) = slot.running.take() {
                running.cancel().await;
            }
        }
    }

    /// Number of currently open windows.
    pub fn open_windows(&self) -> usize {
        self.slots.iter().filter(|slot| slot.running.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ScopeBuilder;
    use crate::core::{ChangedState, Predicate};
    use crate::effects::context::Emission;
    use crate::effects::side_effect::{SideEffect, SideEffectInstance};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Level(u8);

    impl State for Level {
        fn name(&self) -> &str {
            "Level"
        }
    }

    fn raised(level: &Level) -> bool {
        level.0 > 0
    }

    #[tokio::test]
    async fn windows_follow_predicates() {
        let side_effects = ScopeBuilder::<Level, ()>::new()
            .in_state(raised, |scope| {
                scope.on_enter_effect(|_s| async {
                    futures::future::pending::<()>().await;
                    Ok(())
                })
            })
            .on_enter_effect(|_s| async { Ok(()) })
            .build()
            .unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut windows = WindowSet::new(side_effects.builders(), ChangeSink::new(tx), 4);

        windows.observe(&Level(0)).await.unwrap();
        assert_eq!(windows.open_windows(), 1);

        windows.observe(&Level(1)).await.unwrap();
        windows.observe(&Level(2)).await.unwrap();
        assert_eq!(windows.open_windows(), 2);

        windows.observe(&Level(0)).await.unwrap();
        assert_eq!(windows.open_windows(), 1);

        windows.close_all().await;
        assert_eq!(windows.open_windows(), 0);
    }

    #[tokio::test]
    async fn closing_a_window_invalidates_its_changes() {
        let side_effects = ScopeBuilder::<Level, ()>::new()
            .in_state(raised, |scope| {
                scope.on_enter(|_s| async { Ok(ChangedState::Override(Level(9))) })
            })
            .build()
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut windows = WindowSet::new(side_effects.builders(), ChangeSink::new(tx), 4);

        windows.observe(&Level(1)).await.unwrap();
        let Some(Emission::Change { token, change, .. }) = rx.recv().await else {
            panic!("expected a proposed change");
        };
        assert_eq!(change.apply(&Level(1)), Some(Level(9)));
        assert!(token.is_open());

        windows.observe(&Level(0)).await.unwrap();
        assert!(!token.is_open());
    }

    #[tokio::test]
    async fn predicate_panic_is_reported() {
        let side_effects = ScopeBuilder::<Level, ()>::new()
            .in_state(
                |level: &Level| {
                    if level.0 == 3 {
                        panic!("three is not allowed");
                    }
                    true
                },
                |scope| scope.on_enter_effect(|_s| async { Ok(()) }),
            )
            .build()
            .unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut windows = WindowSet::new(side_effects.builders(), ChangeSink::new(tx), 4);

        windows.observe(&Level(1)).await.unwrap();
        let err = windows.observe(&Level(3)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::PredicateFailed { kind: SideEffectKind::OnEnterEffect, .. }
        ));
    }

    #[tokio::test]
    async fn failures_reach_the_sink() {
        let side_effects = ScopeBuilder::<Level, ()>::new()
            .on_enter(|_s| async { Err(crate::effects::HandlerError::msg("nope")) })
            .build()
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut windows = WindowSet::new(side_effects.builders(), ChangeSink::new(tx), 4);

        windows.observe(&Level(0)).await.unwrap();
        let Some(Emission::Failure(error)) = rx.recv().await else {
            panic!("expected a failure");
        };
        assert_eq!(error.to_string(), "on-enter handler failed: nope");
    }

    struct Unbuildable;

    impl SideEffect<Level, ()> for Unbuildable {
        fn kind(&self) -> SideEffectKind {
            SideEffectKind::OnEnter
        }

        fn instantiate(&self, _ctx: InstanceContext<Level, ()>) -> SideEffectInstance {
            panic!("cannot instantiate")
        }
    }

    #[tokio::test]
    async fn instantiate_panic_reaches_the_sink() {
        let builders: Arc<[SideEffectBuilder<Level, ()>]> =
            vec![SideEffectBuilder::new(Predicate::always(), Arc::new(Unbuildable))].into();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut windows = WindowSet::new(builders, ChangeSink::new(tx), 4);

        windows.observe(&Level(0)).await.unwrap();
        let Some(Emission::Failure(EngineError::Panicked { kind, message })) = rx.recv().await
        else {
            panic!("expected a panic failure");
        };
        assert_eq!(kind, SideEffectKind::OnEnter);
        assert_eq!(message, "cannot instantiate");
    }
}
