//! Error types for the BOAMP search client.
//!
//! This module provides structured error handling with:
//! - `AppError`: Domain-specific errors for portal operations
//! - `Result<T>`: Type alias for Results using AppError

use thiserror::Error;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for portal operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network unreachable, DNS failure, TLS failure, request never completed
    #[error("Network error: {0}")]
    Transport(String),

    /// The portal answered with a non-success HTTP status
    #[error("Provider error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Dataset field catalog could not be fetched or decoded
    #[error("Schema resolution failed: {0}")]
    Schema(String),

    /// Response body was not the expected JSON shape
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a schema resolution error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// True for HTTP 4xx responses. These mean the addressed dialect
    /// rejected the query and the other dialect is worth a try; anything
    /// else is surfaced as-is.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if (400..500).contains(status))
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
