//! Reference orchestrator for running side effects end to end.
//!
//! The engine in [`effects`](crate::effects) never watches the state
//! stream itself. [`StateMachine`] is the outer loop that does: it owns the
//! current state, applies [`ChangedState`](crate::core::ChangedState)
//! results one at a time in completion order, republishes the new state and
//! re-evaluates every activation window.
//!
//! # Example
//!
//! ```rust
//! use flowscope::builder::ScopeBuilder;
//! use flowscope::machine::StateMachine;
//! use flowscope::{matches_action, state_enum};
//!
//! state_enum! {
//!     enum Light {
//!         Off,
//!         On,
//!     }
//! }
//!
//! #[derive(Clone, Debug)]
//! enum Switch {
//!     Toggle,
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let side_effects = ScopeBuilder::<Light, Switch>::new()
//!     .in_state(|s| *s == Light::Off, |scope| {
//!         scope.on_action(matches_action!(Switch::Toggle), |(), s| async move {
//!             Ok(s.override_state(Light::On))
//!         })
//!     })
//!     .build()
//!     .unwrap();
//!
//! let machine = StateMachine::new(Light::Off, side_effects).start();
//! machine.dispatch(Switch::Toggle).await.unwrap();
//! machine.wait_until(|s| *s == Light::On).await.unwrap();
//!
//! let report = machine.shutdown().await.unwrap();
//! assert_eq!(report.final_state, Light::On);
//! assert_eq!(report.history.len(), 1);
//! # });
//! ```

mod config;
mod runtime;

pub use config::{ConfigError, EngineConfig};
pub use runtime::{MachineHandle, MachineReport, StateMachine};
