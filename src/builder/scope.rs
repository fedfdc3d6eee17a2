//! Fluent registration of side effects against state predicates.

use crate::builder::error::BuildError;
use crate::core::{
    Action, ChangedState, ExecutionPolicy, Predicate, ReadOnlyState, SideEffectKind, State,
    StateSnapshot,
};
use crate::effects::{
    CollectWhile, EnterHandler, HandlerResult, IdentityScope, OnAction, OnEnter, SideEffect,
    SideEffectBuilder, StreamSource, TriggerHandler,
};
use futures::future::FutureExt;
use futures::stream::{Stream, StreamExt};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

/// Accumulates side-effect registrations for one predicate scope.
///
/// Every registration call appends an immutable record gated by the
/// scope's predicate; [`build`](ScopeBuilder::build) freezes the records
/// into [`SideEffects`]. Registrations are never deduplicated.
///
/// # Example
///
/// ```rust
/// use flowscope::builder::ScopeBuilder;
/// use flowscope::matches_action;
/// use flowscope::state_enum;
///
/// state_enum! {
///     enum Screen {
///         Loading,
///         Ready,
///     }
/// }
///
/// #[derive(Clone, Debug)]
/// enum Input {
///     Retry,
/// }
///
/// let side_effects = ScopeBuilder::<Screen, Input>::new()
///     .in_state(
///         |s| matches!(s, Screen::Loading),
///         |scope| scope.on_enter(|state| async move { Ok(state.override_state(Screen::Ready)) }),
///     )
///     .in_state(
///         |s| matches!(s, Screen::Ready),
///         |scope| {
///             scope.on_action(matches_action!(Input::Retry), |(), state| async move {
///                 Ok(state.override_state(Screen::Loading))
///             })
///         },
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(side_effects.len(), 2);
/// ```
pub struct ScopeBuilder<S: State, A> {
    predicate: Predicate<S>,
    entries: Vec<SideEffectBuilder<S, A>>,
    errors: Vec<BuildError>,
}

impl<S: State, A: Action> ScopeBuilder<S, A> {
    /// A root scope whose predicate holds for every state.
    pub fn new() -> Self {
        Self::scoped(Predicate::always())
    }

    fn scoped(predicate: Predicate<S>) -> Self {
        Self {
            predicate,
            entries: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn register(mut self, side_effect: Arc<dyn SideEffect<S, A>>) -> Self {
        self.entries
            .push(SideEffectBuilder::new(self.predicate.clone(), side_effect));
        self
    }

    fn absorb(mut self, nested: ScopeBuilder<S, A>) -> Self {
        self.entries.extend(nested.entries);
        self.errors.extend(nested.errors);
        self
    }

    /// Register the side effects of `block` under `predicate`, and-ed with
    /// this scope's predicate.
    pub fn in_state<F, B>(self, predicate: F, block: B) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
        B: FnOnce(ScopeBuilder<S, A>) -> ScopeBuilder<S, A>,
    {
        let nested = block(Self::scoped(self.predicate.and(&Predicate::new(predicate))));
        self.absorb(nested)
    }

    /// Handle matching actions, cancelling a still-running invocation when
    /// the next matching action arrives.
    pub fn on_action<T, M, H, Fut>(self, matcher: M, handler: H) -> Self
    where
        T: Send + 'static,
        M: Fn(&A) -> Option<T> + Send + Sync + 'static,
        H: Fn(T, StateSnapshot<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ChangedState<S>>> + Send + 'static,
    {
        self.on_action_with(ExecutionPolicy::ACTION_DEFAULT, matcher, handler)
    }

    /// [`on_action`](Self::on_action) with an explicit execution policy.
    pub fn on_action_with<T, M, H, Fut>(self, policy: ExecutionPolicy, matcher: M, handler: H) -> Self
    where
        T: Send + 'static,
        M: Fn(&A) -> Option<T> + Send + Sync + 'static,
        H: Fn(T, StateSnapshot<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ChangedState<S>>> + Send + 'static,
    {
        let handler: TriggerHandler<T, S> =
            Arc::new(move |trigger: T, state: StateSnapshot<S>| handler(trigger, state).boxed());
        self.register(Arc::new(OnAction::new(
            SideEffectKind::OnAction,
            policy,
            Arc::new(matcher),
            handler,
        )))
    }

    /// Handle matching actions without changing state.
    pub fn on_action_effect<T, M, H, Fut>(self, matcher: M, handler: H) -> Self
    where
        T: Send + 'static,
        M: Fn(&A) -> Option<T> + Send + Sync + 'static,
        H: Fn(T, ReadOnlyState<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.on_action_effect_with(ExecutionPolicy::ACTION_DEFAULT, matcher, handler)
    }

    /// [`on_action_effect`](Self::on_action_effect) with an explicit
    /// execution policy.
    pub fn on_action_effect_with<T, M, H, Fut>(
        self,
        policy: ExecutionPolicy,
        matcher: M,
        handler: H,
    ) -> Self
    where
        T: Send + 'static,
        M: Fn(&A) -> Option<T> + Send + Sync + 'static,
        H: Fn(T, ReadOnlyState<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        let handler = effect_handler(handler);
        self.register(Arc::new(OnAction::new(
            SideEffectKind::OnActionEffect,
            policy,
            Arc::new(matcher),
            handler,
        )))
    }

    /// Run `handler` once every time the scope's window opens.
    pub fn on_enter<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(StateSnapshot<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ChangedState<S>>> + Send + 'static,
    {
        let handler: EnterHandler<S> =
            Arc::new(move |state: StateSnapshot<S>| handler(state).boxed());
        self.register(Arc::new(OnEnter::new(SideEffectKind::OnEnter, handler)))
    }

    /// Run `handler` once every time the scope's window opens, without
    /// changing state.
    pub fn on_enter_effect<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(ReadOnlyState<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        let handler: EnterHandler<S> = Arc::new(move |state: StateSnapshot<S>| {
            let invocation = handler(state.read_only());
            async move { invocation.await.map(|()| ChangedState::Unchanged) }.boxed()
        });
        self.register(Arc::new(OnEnter::new(SideEffectKind::OnEnterEffect, handler)))
    }

    /// Collect the stream produced by `source` while the window is open,
    /// handling items strictly in order.
    ///
    /// `source` receives the state at window-open time; sources that do not
    /// depend on the state simply ignore it.
    pub fn collect_while<T, F, St, H, Fut>(self, source: F, handler: H) -> Self
    where
        T: Send + 'static,
        F: Fn(&S) -> St + Send + Sync + 'static,
        St: Stream<Item = T> + Send + 'static,
        H: Fn(T, StateSnapshot<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ChangedState<S>>> + Send + 'static,
    {
        self.collect_while_with(ExecutionPolicy::COLLECT_DEFAULT, source, handler)
    }

    /// [`collect_while`](Self::collect_while) with an explicit execution
    /// policy.
    pub fn collect_while_with<T, F, St, H, Fut>(
        self,
        policy: ExecutionPolicy,
        source: F,
        handler: H,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn(&S) -> St + Send + Sync + 'static,
        St: Stream<Item = T> + Send + 'static,
        H: Fn(T, StateSnapshot<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ChangedState<S>>> + Send + 'static,
    {
        let handler: TriggerHandler<T, S> =
            Arc::new(move |item: T, state: StateSnapshot<S>| handler(item, state).boxed());
        self.register(Arc::new(CollectWhile::new(
            SideEffectKind::CollectWhile,
            policy,
            stream_source(source),
            handler,
        )))
    }

    /// Collect a stream while the window is open without changing state.
    pub fn collect_while_effect<T, F, St, H, Fut>(self, source: F, handler: H) -> Self
    where
        T: Send + 'static,
        F: Fn(&S) -> St + Send + Sync + 'static,
        St: Stream<Item = T> + Send + 'static,
        H: Fn(T, ReadOnlyState<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.collect_while_effect_with(ExecutionPolicy::COLLECT_DEFAULT, source, handler)
    }

    /// [`collect_while_effect`](Self::collect_while_effect) with an explicit
    /// execution policy.
    pub fn collect_while_effect_with<T, F, St, H, Fut>(
        self,
        policy: ExecutionPolicy,
        source: F,
        handler: H,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn(&S) -> St + Send + Sync + 'static,
        St: Stream<Item = T> + Send + 'static,
        H: Fn(T, ReadOnlyState<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.register(Arc::new(CollectWhile::new(
            SideEffectKind::CollectWhileEffect,
            policy,
            stream_source(source),
            effect_handler(handler),
        )))
    }

    /// Run the side effects of `block` and restart all of them whenever the
    /// key produced by `identity` changes while this scope stays open.
    pub fn until_identity_changes<K, F, B>(mut self, identity: F, block: B) -> Self
    where
        K: PartialEq + Debug + Send + Sync + 'static,
        F: Fn(&S) -> K + Send + Sync + 'static,
        B: FnOnce(ScopeBuilder<S, A>) -> ScopeBuilder<S, A>,
    {
        let nested = block(Self::new());
        self.errors.extend(nested.errors);
        if nested.entries.is_empty() {
            self.errors.push(BuildError::EmptyIdentityScope {
                position: self.entries.len(),
            });
            return self;
        }
        let scope = IdentityScope::new(Arc::new(identity), nested.entries.into());
        self.register(Arc::new(scope))
    }

    /// Freeze the registrations.
    pub fn build(self) -> Result<SideEffects<S, A>, BuildError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        if self.entries.is_empty() {
            return Err(BuildError::NoSideEffects);
        }
        Ok(SideEffects {
            builders: self.entries.into(),
        })
    }
}

impl<S: State, A: Action> Default for ScopeBuilder<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

fn effect_handler<S, T, H, Fut>(handler: H) -> TriggerHandler<T, S>
where
    S: State,
    T: Send + 'static,
    H: Fn(T, ReadOnlyState<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    Arc::new(move |trigger: T, state: StateSnapshot<S>| {
        let invocation = handler(trigger, state.read_only());
        async move { invocation.await.map(|()| ChangedState::Unchanged) }.boxed()
    })
}

fn stream_source<S, T, F, St>(source: F) -> StreamSource<S, T>
where
    S: State,
    F: Fn(&S) -> St + Send + Sync + 'static,
    St: Stream<Item = T> + Send + 'static,
{
    Arc::new(move |state: &S| source(state).boxed())
}

/// Immutable, ordered list of registered side effects.
///
/// This is what an orchestrator consumes: each entry pairs a predicate with
/// a factory for side-effect instances.
pub struct SideEffects<S: State, A> {
    builders: Arc<[SideEffectBuilder<S, A>]>,
}

impl<S: State, A> SideEffects<S, A> {
    pub fn iter(&self) -> impl Iterator<Item = &SideEffectBuilder<S, A>> {
        self.builders.iter()
    }

    pub fn builders(&self) -> Arc<[SideEffectBuilder<S, A>]> {
        Arc::clone(&self.builders)
    }

    pub fn kinds(&self) -> Vec<SideEffectKind> {
        self.builders.iter().map(SideEffectBuilder::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl<S: State, A> Clone for SideEffects<S, A> {
    fn clone(&self) -> Self {
        SideEffects {
            builders: Arc::clone(&self.builders),
        }
    }
}
