//! Runtime configuration for the reference orchestrator.

use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Errors in an [`EngineConfig`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("command_buffer must be greater than zero")]
    ZeroCommandBuffer,

    #[error("ordered_buffer must be greater than zero")]
    ZeroOrderedBuffer,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {}", render(.0))]
    Invalid(Vec<ConfigError>),
}

fn render(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tunables of a running machine.
///
/// Missing fields fall back to their defaults when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the channel that carries dispatched actions into the
    /// machine. `dispatch` waits while it is full.
    pub command_buffer: usize,

    /// Number of pending items an `Ordered` collect-while instance buffers
    /// before it stops polling its source.
    pub ordered_buffer: usize,

    /// Record every applied transition in the machine's history.
    pub record_history: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            ordered_buffer: 64,
            record_history: true,
        }
    }
}

impl EngineConfig {
    pub fn command_buffer(mut self, capacity: usize) -> Self {
        self.command_buffer = capacity;
        self
    }

    pub fn ordered_buffer(mut self, capacity: usize) -> Self {
        self.ordered_buffer = capacity;
        self
    }

    pub fn record_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    /// Check every setting, accumulating ALL problems.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let checks = vec![
            if self.command_buffer == 0 {
                Validation::fail(ConfigError::ZeroCommandBuffer)
            } else {
                Validation::success(())
            },
            if self.ordered_buffer == 0 {
                Validation::fail(ConfigError::ZeroOrderedBuffer)
            } else {
                Validation::success(())
            },
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// Validate into a `Result`, folding all problems into one error.
    pub fn check(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(()) => Ok(self),
            Validation::Failure(errors) => Err(ConfigError::Invalid(errors.iter().cloned().collect())),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()
    }
}
