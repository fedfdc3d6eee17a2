//! Reference orchestrator: the reduction loop around the engine.

use crate::builder::SideEffects;
use crate::core::{panic_message, Action, State, StateHistory, StateTransition};
use crate::effects::{ChangeSink, Emission, EngineError, WindowSet};
use crate::machine::config::{ConfigError, EngineConfig};
use chrono::Utc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Final outcome of a machine that stopped cleanly.
#[derive(Clone, Debug)]
pub struct MachineReport<S: State> {
    pub final_state: S,
    pub history: StateHistory<S>,
}

enum Command<A> {
    Dispatch(A),
    Shutdown,
}

/// A state machine definition: initial state, side effects and config.
pub struct StateMachine<S: State, A> {
    initial: S,
    side_effects: SideEffects<S, A>,
    config: EngineConfig,
}

impl<S: State, A: Action> StateMachine<S, A> {
    pub fn new(initial: S, side_effects: SideEffects<S, A>) -> Self {
        Self {
            initial,
            side_effects,
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration. Invalid configurations are rejected.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, ConfigError> {
        self.config = config.check()?;
        Ok(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawn the machine on the current tokio runtime.
    pub fn start(self) -> MachineHandle<S, A> {
        let (commands_tx, commands_rx) = mpsc::channel(self.config.command_buffer);
        let (states_tx, states_rx) = watch::channel(self.initial.clone());
        let (emissions_tx, emissions_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            current: self.initial,
            history: StateHistory::new(),
            windows: WindowSet::new(
                self.side_effects.builders(),
                ChangeSink::new(emissions_tx),
                self.config.ordered_buffer,
            ),
            record_history: self.config.record_history,
            states: states_tx,
        };

        MachineHandle {
            commands: commands_tx,
            states: states_rx,
            task: tokio::spawn(driver.run(commands_rx, emissions_rx)),
        }
    }
}

struct Driver<S: State, A> {
    current: S,
    history: StateHistory<S>,
    windows: WindowSet<S, A>,
    record_history: bool,
    states: watch::Sender<S>,
}

impl<S: State, A: Action> Driver<S, A> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command<A>>,
        mut emissions: mpsc::UnboundedReceiver<Emission<S>>,
    ) -> Result<MachineReport<S>, EngineError> {
        tracing::debug!(state = self.current.name(), "state machine started");
        if let Err(error) = self.windows.observe(&self.current).await {
            return self.abort(error).await;
        }

        loop {
            tokio::select! {
                biased;

                emission = emissions.recv() => match emission {
                    Some(Emission::Change { token, origin, change }) => {
                        if !token.is_open() {
                            tracing::trace!(%origin, "discarded change from a closed window");
                            continue;
                        }
                        // `Mutate` reducers are user code.
                        let next = match catch_unwind(AssertUnwindSafe(|| change.apply(&self.current))) {
                            Ok(Some(next)) => next,
                            Ok(None) => continue,
                            Err(payload) => {
                                let message = panic_message(payload.as_ref());
                                return self.abort(EngineError::Panicked { kind: origin, message }).await;
                            }
                        };
                        if next == self.current {
                            continue;
                        }
                        tracing::trace!(%origin, from = self.current.name(), to = next.name(), "applying change");
                        if self.record_history {
                            self.history = std::mem::take(&mut self.history).record(StateTransition {
                                from: self.current.clone(),
                                to: next.clone(),
                                timestamp: Utc::now(),
                                origin,
                            });
                        }
                        self.current = next;
                        self.states.send_replace(self.current.clone());
                        if let Err(error) = self.windows.observe(&self.current).await {
                            return self.abort(error).await;
                        }
                    }
                    Some(Emission::Failure(error)) => return self.abort(error).await,
                    None => break,
                },

                command = commands.recv() => match command {
                    Some(Command::Dispatch(action)) => {
                        tracing::trace!(?action, "dispatching action");
                        self.windows.dispatch(&action);
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        self.windows.close_all().await;
        tracing::debug!(state = self.current.name(), "state machine stopped");
        Ok(MachineReport {
            final_state: self.current,
            history: self.history,
        })
    }

    async fn abort(mut self, error: EngineError) -> Result<MachineReport<S>, EngineError> {
        tracing::error!(%error, state = self.current.name(), "state machine failed");
        self.windows.close_all().await;
        Err(error)
    }
}

/// Handle to a running machine.
pub struct MachineHandle<S: State, A> {
    commands: mpsc::Sender<Command<A>>,
    states: watch::Receiver<S>,
    task: JoinHandle<Result<MachineReport<S>, EngineError>>,
}

impl<S: State, A: Action> MachineHandle<S, A> {
    /// Send an action to every open window. Waits while the command buffer
    /// is full.
    pub async fn dispatch(&self, action: A) -> Result<(), EngineError> {
        self.commands
            .send(Command::Dispatch(action))
            .await
            .map_err(|_| EngineError::MachineStopped)
    }

    /// The most recently published state.
    pub fn current(&self) -> S {
        self.states.borrow().clone()
    }

    /// Subscribe to published states. Intermediate states may be skipped by
    /// slow subscribers.
    pub fn states(&self) -> watch::Receiver<S> {
        self.states.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_until<F>(&self, predicate: F) -> Result<S, EngineError>
    where
        F: FnMut(&S) -> bool,
    {
        let mut states = self.states.clone();
        let state = states
            .wait_for(predicate)
            .await
            .map_err(|_| EngineError::MachineStopped)?;
        Ok(state.clone())
    }

    /// Whether the machine task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the machine, cancelling every open window, and return its
    /// report. A machine that already failed returns its failure.
    pub async fn shutdown(self) -> Result<MachineReport<S>, EngineError> {
        // The machine may have stopped on its own; the join below reports why.
        let _ = self.commands.send(Command::Shutdown).await;
        self.join().await
    }

    /// Wait for the machine to stop without asking it to.
    pub async fn join(self) -> Result<MachineReport<S>, EngineError> {
        self.task
            .await
            .map_err(|err| EngineError::TaskFailed(err.to_string()))?
    }
}
