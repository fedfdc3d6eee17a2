//! Policy-driven handler invocation shared by on-action and collect-while.

use crate::core::{ChangedState, ExecutionPolicy, SideEffectKind, State, StateSnapshot};
use crate::effects::context::{InstanceContext, Signal};
use crate::effects::error::{EngineError, HandlerResult};
use crate::effects::side_effect::TriggerHandler;
use futures::future::BoxFuture;
use futures::stream::{BoxStream, StreamExt};
use std::collections::VecDeque;
use std::future::pending;

/// Handler invocations of one instance under one execution policy.
///
/// Under `CancelPrevious` there is at most one invocation alive; a new
/// trigger drops the running future. Under `Ordered` triggers wait in a
/// queue and start only after the previous invocation completed.
pub(crate) struct Invocations<S: State, T> {
    kind: SideEffectKind,
    policy: ExecutionPolicy,
    capacity: usize,
    handler: TriggerHandler<T, S>,
    queue: VecDeque<T>,
    in_flight: Option<BoxFuture<'static, HandlerResult<ChangedState<S>>>>,
}

impl<S: State, T> Invocations<S, T> {
    pub(crate) fn new(
        kind: SideEffectKind,
        policy: ExecutionPolicy,
        capacity: usize,
        handler: TriggerHandler<T, S>,
    ) -> Self {
        Invocations {
            kind,
            policy,
            capacity,
            handler,
            queue: VecDeque::new(),
            in_flight: None,
        }
    }

    fn start(&mut self, trigger: T, current: &S) {
        self.in_flight = Some((self.handler)(trigger, StateSnapshot::new(current.clone())));
    }

    /// Hand a new trigger to the policy.
    pub(crate) fn accept(&mut self, trigger: T, current: &S) {
        match self.policy {
            ExecutionPolicy::CancelPrevious => {
                if self.in_flight.take().is_some() {
                    tracing::trace!(kind = %self.kind, "cancelled previous invocation");
                }
                self.start(trigger, current);
            }
            ExecutionPolicy::Ordered => self.queue.push_back(trigger),
        }
    }

    /// Start the next queued trigger if nothing is running.
    pub(crate) fn start_next(&mut self, current: &S) {
        if self.in_flight.is_none() {
            if let Some(trigger) = self.queue.pop_front() {
                self.start(trigger, current);
            }
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    /// Whether the source may be polled for another trigger.
    pub(crate) fn has_room(&self) -> bool {
        match self.policy {
            ExecutionPolicy::CancelPrevious => true,
            ExecutionPolicy::Ordered => self.queue.len() < self.capacity,
        }
    }

    /// Resolve when the running invocation completes. Pending forever when
    /// nothing runs.
    pub(crate) async fn completion(&mut self) -> HandlerResult<ChangedState<S>> {
        let result = match self.in_flight.as_mut() {
            Some(invocation) => invocation.await,
            None => pending().await,
        };
        self.in_flight = None;
        result
    }
}

/// Run an instance until its window closes or its item source is drained.
///
/// `items` is the instance's own trigger source (a collected stream, or
/// `stream::pending()` for action handlers); `select_action` projects
/// dispatched actions onto triggers. Signals are polled first so that a
/// closing window always wins over a completing invocation.
pub(crate) async fn drive<S, A, T, F>(
    ctx: InstanceContext<S, A>,
    mut invocations: Invocations<S, T>,
    mut items: BoxStream<'static, T>,
    select_action: F,
) -> Result<(), EngineError>
where
    S: State,
    F: Fn(&A) -> Option<T>,
{
    let InstanceContext {
        initial,
        mut signals,
        sink,
        ..
    } = ctx;
    let kind = invocations.kind;
    let mut current = initial;
    let mut items_done = false;

    loop {
        invocations.start_next(&current);
        if items_done && invocations.is_idle() {
            tracing::trace!(kind = %kind, "source drained");
            return Ok(());
        }
        let accepting = !items_done && invocations.has_room();

        tokio::select! {
            biased;

            signal = signals.recv() => match signal {
                Some(Signal::State(state)) => current = state,
                Some(Signal::Action(action)) => {
                    if let Some(trigger) = select_action(&action) {
                        invocations.accept(trigger, &current);
                    }
                }
                None => {
                    if invocations.is_busy() {
                        tracing::trace!(kind = %kind, "window closed, dropping running invocation");
                    }
                    return Ok(());
                }
            },

            result = invocations.completion(), if invocations.is_busy() => {
                let change = result.map_err(|source| EngineError::handler(kind, source))?;
                sink.emit(kind, change)?;
            }

            item = items.next(), if accepting => match item {
                Some(trigger) => invocations.accept(trigger, &current),
                None => items_done = true,
            },
        }
    }
}
