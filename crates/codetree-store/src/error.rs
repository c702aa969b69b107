use std::path::PathBuf;

use codetree_types::ValidationError;

/// Errors from a collection storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The replacement file could not be moved over the data file.
    #[error("failed to persist {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
}

/// Result alias for storage backend operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from code-tree operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The write batch was rejected; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No node carries the requested code.
    #[error("code not found: {code}")]
    NotFound { code: String },

    /// Reading or writing the collection failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TreeError {
    /// `true` for errors the caller can fix by changing its input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

/// Result alias for code-tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_passed_through() {
        let err = TreeError::from(ValidationError::ParentNotFound("NOPE".into()));
        assert_eq!(err.to_string(), "Parent code not found: NOPE");
        assert!(err.is_client_error());
    }

    #[test]
    fn storage_errors_are_not_client_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TreeError::from(StorageError::from(io));
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn persist_error_shows_path() {
        let err = StorageError::Persist {
            path: PathBuf::from("data/code-tree.json"),
            reason: "busy".into(),
        };
        assert_eq!(err.to_string(), "failed to persist data/code-tree.json: busy");
    }
}
