//! Plumbing between an orchestrator and live side-effect instances.
//!
//! An instance receives ordered [`Signal`]s (state ticks and actions) and
//! reports back through a [`ChangeSink`]. Every emission carries the
//! [`WindowToken`] of the window that produced it so the orchestrator can
//! drop results from windows that closed in the meantime.

use crate::core::{ChangedState, SideEffectKind, State};
use crate::effects::error::EngineError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifier of one opened activation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(Uuid);

impl WindowId {
    pub fn new() -> Self {
        WindowId(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct TokenInner {
    open: AtomicBool,
    parent: Option<WindowToken>,
}

/// Liveness flag of an activation window.
///
/// A child token is open only while it and all of its ancestors are open,
/// which is how identity scopes invalidate everything nested below them.
#[derive(Clone)]
pub struct WindowToken {
    inner: Arc<TokenInner>,
}

impl WindowToken {
    /// A root token, open until closed.
    pub fn root() -> Self {
        WindowToken {
            inner: Arc::new(TokenInner {
                open: AtomicBool::new(true),
                parent: None,
            }),
        }
    }

    pub fn child(&self) -> Self {
        WindowToken {
            inner: Arc::new(TokenInner {
                open: AtomicBool::new(true),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
            && self.inner.parent.as_ref().map_or(true, WindowToken::is_open)
    }

    pub fn close(&self) {
        self.inner.open.store(false, Ordering::Release);
    }
}

impl fmt::Debug for WindowToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowToken")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Input delivered to a live instance, in orchestrator order.
#[derive(Debug, Clone)]
pub enum Signal<S, A> {
    /// The machine moved to a new state.
    State(S),
    /// An action was dispatched while the instance's window was open.
    Action(A),
}

/// Message from an instance to the orchestrator.
#[derive(Debug)]
pub enum Emission<S: State> {
    Change {
        token: WindowToken,
        origin: SideEffectKind,
        change: ChangedState<S>,
    },
    Failure(EngineError),
}

/// Sending half of the orchestrator's serialization point, bound to one
/// window.
pub struct ChangeSink<S: State> {
    tx: mpsc::UnboundedSender<Emission<S>>,
    token: WindowToken,
}

impl<S: State> ChangeSink<S> {
    /// A sink bound to a fresh root window.
    pub fn new(tx: mpsc::UnboundedSender<Emission<S>>) -> Self {
        ChangeSink {
            tx,
            token: WindowToken::root(),
        }
    }

    /// A sink for a window nested inside this one.
    pub fn child(&self) -> Self {
        ChangeSink {
            tx: self.tx.clone(),
            token: self.token.child(),
        }
    }

    pub fn token(&self) -> &WindowToken {
        &self.token
    }

    /// Propose a change. `Unchanged` is not forwarded.
    pub fn emit(&self, origin: SideEffectKind, change: ChangedState<S>) -> Result<(), EngineError> {
        if change.is_unchanged() {
            return Ok(());
        }
        debug_assert!(!origin.is_effect_only(), "{origin} proposed a state change");
        self.tx
            .send(Emission::Change {
                token: self.token.clone(),
                origin,
                change,
            })
            .map_err(|_| EngineError::MachineStopped)
    }

    /// Report a fatal failure. Failures are delivered even after the window
    /// closed.
    pub fn fail(&self, error: EngineError) {
        if self.tx.send(Emission::Failure(error)).is_err() {
            tracing::warn!("failure reported after the state machine stopped");
        }
    }
}

impl<S: State> Clone for ChangeSink<S> {
    fn clone(&self) -> Self {
        ChangeSink {
            tx: self.tx.clone(),
            token: self.token.clone(),
        }
    }
}

/// Everything an instance needs when its window opens.
pub struct InstanceContext<S: State, A> {
    pub(crate) window: WindowId,
    pub(crate) initial: S,
    pub(crate) signals: mpsc::UnboundedReceiver<Signal<S, A>>,
    pub(crate) sink: ChangeSink<S>,
    pub(crate) ordered_capacity: usize,
}

impl<S: State, A> InstanceContext<S, A> {
    /// `initial` is the state at window-open time. The orchestrator keeps
    /// the sender of `signals`; dropping it closes the window.
    pub fn new(
        initial: S,
        signals: mpsc::UnboundedReceiver<Signal<S, A>>,
        sink: ChangeSink<S>,
        ordered_capacity: usize,
    ) -> Self {
        InstanceContext {
            window: WindowId::new(),
            initial,
            signals,
            sink,
            ordered_capacity: ordered_capacity.max(1),
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }
}

/// Wait until the orchestrator drops the signal sender.
pub(crate) async fn closed<S, A>(signals: &mut mpsc::UnboundedReceiver<Signal<S, A>>) {
    while signals.recv().await.is_some() {}
}
