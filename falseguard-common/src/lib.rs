//! Common types and utilities shared across FalseGuard crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used throughout the FalseGuard workspace. It is intentionally lightweight
//! so that every crate can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`FalseguardError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use falseguard_common::FalseguardError;
//!
//! let err = FalseguardError::Config("missing llm section".to_string());
//! assert_eq!(err.to_string(), "Configuration error: missing llm section");
//! ```
pub mod observability;

/// Error types used across the FalseGuard system.
#[derive(thiserror::Error, Debug)]
pub enum FalseguardError {
    /// A provider (LLM or search backend) failed to complete a request.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider does not support the requested capability (e.g. media input).
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,

    /// Anything bubbling up from lower-level plumbing.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`FalseguardError`].
pub type Result<T> = std::result::Result<T, FalseguardError>;
