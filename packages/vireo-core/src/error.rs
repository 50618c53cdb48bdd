//! Centralized error types for the Vireo core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Assigns every variant a stable machine-readable code
//! - Converts collaborator errors into the application-wide [`CoreError`]

use serde::Serialize;
use thiserror::Error;

use crate::cast::CastError;
use crate::catalog::CatalogError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths (logs, diagnostic events).
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for CatalogError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "catalog_not_found",
            Self::Unavailable(_) => "catalog_unavailable",
        }
    }
}

impl ErrorCode for CastError {
    fn code(&self) -> &'static str {
        match self {
            Self::Bind(_) => "registry_bind_failed",
            Self::Connect { .. } => "control_point_connect_failed",
            Self::Command(_) => "control_command_failed",
        }
    }
}

/// Application-wide error type for the session coordinator.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum CoreError {
    /// Storage collaborator failure.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Discovery/control subsystem failure.
    #[error("Cast error: {0}")]
    Cast(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog_error",
            Self::Cast(_) => "cast_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

// Re-export Result type aliases from their defining modules
pub use crate::cast::{CastResult, CommandResult};
pub use crate::catalog::CatalogResult;

/// Convenient Result alias for application-wide operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err.to_string())
    }
}

impl From<CastError> for CoreError {
    fn from(err: CastError) -> Self {
        Self::Cast(err.to_string())
    }
}
