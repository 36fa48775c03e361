//! # DomainError
//!
//! Centralized error handling for the case-tracking ecosystem.
//! Adapters map their own failures onto these variants.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Resource not found (e.g., Case, Property, Tag)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., field too long, bad e-mail, file type not allowed)
    #[error("validation error: {0}")]
    Validation(String),

    /// No usable identity was presented (e.g., bad bearer token, wrong password)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity is known but lacks the required privilege (non-staff)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization: {err}"))
    }
}

/// A specialized Result type for case-tracking logic.
pub type Result<T> = std::result::Result<T, DomainError>;
