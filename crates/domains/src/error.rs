//! # DomainError
//!
//! Centralized error handling for the Campus-Board ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all core operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Referenced entity absent (e.g. Notice, Comment, Reply)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Authenticated but not authorized (disabled student,
    /// non-owner non-admin delete attempt)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed or contradictory input (e.g. both commentId and
    /// parentReplyId supplied, or neither)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Duplicate engagement rows and other unique-constraint collisions
    #[error("conflict: {0}")]
    Conflict(String),

    /// No valid session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g. DB down, blob store timeout)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Shorthand for the most common variant.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }
}

/// A specialized Result type for Campus-Board logic.
pub type Result<T> = std::result::Result<T, DomainError>;
