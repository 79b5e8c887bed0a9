//! Error taxonomy and non-fatal diagnostics.
//!
//! Store access failures and missing metadata never abort a run: the
//! affected entity is skipped, a [`SweepWarning`] is recorded and
//! processing continues with siblings. Only an invalid configuration is
//! fatal, and it is rejected before any mutating call is issued. Budget
//! expiry is not an error at all; it is reported through the run
//! statistics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity is unreachable (permission revoked, deleted mid-run).
    #[error("access denied: {entity}")]
    AccessDenied { entity: String },

    /// The entity does not exist.
    #[error("not found: {entity}")]
    NotFound { entity: String },

    /// Metadata could not be retrieved for an existing entity.
    #[error("metadata unavailable for {entity}: {message}")]
    Metadata { entity: String, message: String },

    /// Backend-specific failure.
    #[error("{message}")]
    Other { message: String },
}

impl StoreError {
    /// Create an access-denied error.
    pub fn access_denied(entity: impl Into<String>) -> Self {
        Self::AccessDenied {
            entity: entity.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Create a metadata error.
    pub fn metadata(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Metadata {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a backend-specific error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Fatal errors that abort a whole invocation.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Required input is empty or malformed. Raised before any mutating
    /// store call.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SweepError {
    /// Create an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Kind of non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A folder or its listing was unreachable; its subtree was skipped.
    FolderUnreachable,
    /// A file operation failed; the file was skipped.
    FileUnreachable,
    /// A content hash could not be fetched; the file left dedup
    /// consideration.
    HashUnavailable,
}

/// Non-fatal diagnostic recorded during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepWarning {
    /// Identity or path of the affected entity.
    pub entity: String,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl SweepWarning {
    /// Create a new warning.
    pub fn new(entity: impl Into<String>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            entity: entity.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a folder-unreachable warning.
    pub fn folder_unreachable(entity: impl Into<String>, error: &StoreError) -> Self {
        Self::new(entity, error.to_string(), WarningKind::FolderUnreachable)
    }

    /// Create a file-unreachable warning.
    pub fn file_unreachable(entity: impl Into<String>, error: &StoreError) -> Self {
        Self::new(entity, error.to_string(), WarningKind::FileUnreachable)
    }

    /// Create a hash-unavailable warning.
    pub fn hash_unavailable(entity: impl Into<String>, error: &StoreError) -> Self {
        Self::new(entity, error.to_string(), WarningKind::HashUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::access_denied("folder-1");
        assert_eq!(err.to_string(), "access denied: folder-1");

        let err = StoreError::metadata("file-1", "digest pending");
        assert!(err.to_string().contains("file-1"));
        assert!(err.to_string().contains("digest pending"));
    }

    #[test]
    fn test_warning_creation() {
        let warning =
            SweepWarning::folder_unreachable("folder-1", &StoreError::not_found("folder-1"));
        assert_eq!(warning.kind, WarningKind::FolderUnreachable);
        assert!(warning.message.contains("not found"));
    }
}
