// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for Catalog operations
//!
//! This module defines the error types used throughout the catalog layer.
//!
//! Only failures that keep a cache from producing a usable collection are
//! errors. A dropped detail row or an orphaned argument level is logged where
//! it happens and never reaches the caller, and cancellation is not an error
//! at all.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during Catalog operations
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum CatalogError {
    /// Failed to connect to the database
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query '{statement}' failed: {reason}")]
    QueryFailed { statement: String, reason: String },

    /// Query execution timed out
    #[error("Query timed out after {0}s")]
    QueryTimeout(u64),

    /// Permission denied for requested operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A row lacks a field the row mapper requires
    #[error("Missing field '{field}' in result row")]
    MissingField { field: String },

    /// A row field holds a value of the wrong shape
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// A named object does not exist in its owning cache
    #[error("{kind} '{name}' not found")]
    ObjectNotFound { kind: &'static str, name: String },

    /// A packed `name:position` list could not be parsed
    #[error("Invalid packed column list: {0}")]
    InvalidPackedValue(String),

    /// Invalid catalog configuration
    #[error("Invalid catalog configuration: {0}")]
    ConfigurationError(String),

    /// The specified feature is not supported by this catalog implementation
    #[error("Feature not supported: {0}")]
    NotSupported(String),
}

impl CatalogError {
    /// Build a [`CatalogError::QueryFailed`] for a statement id
    pub fn query_failed(statement: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::QueryFailed {
            statement: statement.into(),
            reason: reason.into(),
        }
    }

    /// Whether a lenient read policy may turn this error into an empty result.
    ///
    /// Permission-gated and version-dependent dictionary views fail this way;
    /// connection and mapping failures never qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CatalogError::PermissionDenied(_) | CatalogError::NotSupported(_)
        )
    }

    /// Whether the error comes from mapping a single row rather than from
    /// the query. Such rows are skipped with a warning.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            CatalogError::MissingField { .. }
                | CatalogError::InvalidValue { .. }
                | CatalogError::InvalidPackedValue(_)
        )
    }
}
