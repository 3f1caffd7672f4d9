//! Error taxonomy for registry operations.
//!
//! Every operation reports failures synchronously through [`RegistryError`].
//! Admission failures (duplicate, capacity) are expected user-facing
//! outcomes, not transient faults, so nothing here is retried.

use http::StatusCode;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Malformed or temporally invalid input (e.g. a past event date).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The caller is anonymous but the action requires an identity.
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    /// The actor is known but lacks authorization for the action.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// A referenced entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Uniqueness or state conflict (duplicate name, ticket type, registration).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The event has no remaining seats.
    ///
    /// Kept apart from [`RegistryError::Conflict`]: it resolves by itself as
    /// registrations are cancelled.
    #[error("Capacity exhausted: {0}")]
    Capacity(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Discriminant of [`RegistryError`] for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`RegistryError::Validation`].
    Validation,
    /// See [`RegistryError::Unauthenticated`].
    Unauthenticated,
    /// See [`RegistryError::Permission`].
    Permission,
    /// See [`RegistryError::NotFound`].
    NotFound,
    /// See [`RegistryError::Conflict`].
    Conflict,
    /// See [`RegistryError::Capacity`].
    Capacity,
    /// See [`RegistryError::Storage`].
    Storage,
}

impl RegistryError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    /// Create a permission error.
    #[must_use]
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a capacity error.
    #[must_use]
    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity(message.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Permission(_) => ErrorKind::Permission,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Capacity(_) => ErrorKind::Capacity,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// HTTP status an outer boundary should answer with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Permission => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::Capacity => StatusCode::CONFLICT,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is an expected admission outcome.
    #[must_use]
    pub const fn is_admission_rejection(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict | ErrorKind::Capacity)
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RegistryError>;
