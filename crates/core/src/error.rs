//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type returned by persistence ports.
pub type StoreResult<T> = Result<T, StoreError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// ownership, illegal transitions). Authentication failures are produced only
/// by the auth gate and live in `warta-auth`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (malformed input, caller-correctable).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The addressed entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Illegal state transition or uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Valid identity, but not allowed to perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure; detail is not meant for clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::Internal(_) => "internal_error",
        }
    }
}

/// Error returned by persistence ports (in-memory or SQL).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("uniqueness violated: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("missing reference: {0}")]
    NotFound(String),

    /// Connection, query or lock failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => DomainError::Conflict(msg),
            StoreError::NotFound(what) => DomainError::NotFound(what),
            StoreError::Backend(msg) => DomainError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_domain_taxonomy() {
        assert_eq!(
            DomainError::from(StoreError::Conflict("letter number".into())),
            DomainError::conflict("letter number")
        );
        assert_eq!(
            DomainError::from(StoreError::NotFound("identity".into())).code(),
            "not_found"
        );
        assert!(matches!(
            DomainError::from(StoreError::backend("pool closed")),
            DomainError::Internal(_)
        ));
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(DomainError::not_found("disposition").to_string(), "disposition not found");
    }
}
