//! Domain validation errors.
//!
//! These are raised at the strict boundary: building a value type from
//! fresh input, driving a status transition, or asking the role registry
//! for something it does not know. Callers at the HTTP layer map
//! [`DomainError::IllegalArgument`] to a 400 response.

/// Errors raised by value types and registries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The supplied value does not satisfy the type's rules, or the
    /// registry was used before it was loaded.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// A status transition that the state machine does not allow.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Status the value object was in.
        from: String,
        /// Status that was requested.
        to: String,
    },
}

impl DomainError {
    /// Shorthand for building an [`DomainError::IllegalArgument`].
    pub fn illegal(message: impl Into<String>) -> Self {
        Self::IllegalArgument(message.into())
    }
}
