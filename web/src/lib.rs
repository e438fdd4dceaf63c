//! # Orderwire Web
//!
//! Axum integration shared by the orderwire HTTP surfaces: the common
//! [`AppError`] response type with its mappings from store errors, and the
//! health endpoint every listener exposes.
//!
//! Handlers return `Result<_, AppError>` and propagate store errors with `?`;
//! the error converts itself into a JSON response with a stable `code` field
//! clients can branch on.

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod health;

pub use error::AppError;
pub use health::health_check;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
