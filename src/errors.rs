use expense_config::ConfigError;
use expense_core::{AllocationError, CoreError, InputValidationError};
use thiserror::Error;

/// Error type covering engine, configuration and export failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<InputValidationError> for EngineError {
    fn from(err: InputValidationError) -> Self {
        EngineError::Core(err.into())
    }
}

impl From<AllocationError> for EngineError {
    fn from(err: AllocationError) -> Self {
        EngineError::Core(err.into())
    }
}

impl EngineError {
    /// `true` for errors the user can fix by editing the form.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Core(
                CoreError::InputValidation(_)
                    | CoreError::Allocation(_)
                    | CoreError::DirtyState
                    | CoreError::NothingStaged
            )
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
