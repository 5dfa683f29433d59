use expense_domain::Money;
use thiserror::Error;

/// Blocking form validation failures. No state transition occurs.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputValidationError {
    #[error("Destination organization is required")]
    MissingDestination,
    #[error("Day count must be positive")]
    NonPositiveDays,
    #[error("Effective count must be positive")]
    NonPositiveEffectiveCount,
    #[error("At least one item must have a positive quantity")]
    ZeroQuantityTotal,
    #[error("{0} category warning(s) still active")]
    WarningsActive(usize),
    #[error("Quantity {quantity} for '{key}' must be a multiple of {step}")]
    QuantityStep { key: String, quantity: f64, step: u32 },
}

/// Violations of the material/service bucket invariants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Allocation mismatch: material {material} + service {service} != total {total}")]
    AllocationMismatch {
        material: Money,
        service: Money,
        total: Money,
    },
    #[error("Destination organization is required for a non-zero allocation")]
    MissingDestination,
    #[error("Service value {service} outside [0, {total}]")]
    ServiceOutOfRange { service: Money, total: Money },
}

/// Failure reported by the persistence collaborator.
///
/// `message` is shown to the user. The commit workflow logs the full text and
/// surfaces only [`PersistenceError::sanitized`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Persistence failed: {message}")]
pub struct PersistenceError {
    pub message: String,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// First line of the message, capped at [`MAX_USER_MESSAGE`] characters.
    pub fn sanitized(&self) -> Self {
        let first_line = self.message.lines().next().unwrap_or("").trim();
        let mut message: String = first_line.chars().take(MAX_USER_MESSAGE).collect();
        if first_line.chars().count() > MAX_USER_MESSAGE {
            message.push_str("...");
        }
        if message.is_empty() {
            message.push_str("storage unavailable");
        }
        Self { message }
    }
}

pub const MAX_USER_MESSAGE: usize = 80;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("Staged entry no longer matches the form; stage it again")]
    DirtyState,
    #[error("A commit is already in flight")]
    CommitInFlight,
    #[error("Nothing staged")]
    NothingStaged,
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_keeps_first_line_only() {
        let err = PersistenceError::new("connection reset\n  at driver.rs:12");
        assert_eq!(err.sanitized().message, "connection reset");
        assert_eq!(PersistenceError::new("  ").sanitized().message, "storage unavailable");

        let long = PersistenceError::new("x".repeat(200)).sanitized();
        assert_eq!(long.message.len(), MAX_USER_MESSAGE + 3);
    }
}
