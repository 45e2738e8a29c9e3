//! Error types for the core index.
//!
//! Per-file indexing defects are data, not errors: they live in the
//! manifest as degraded or skipped entries so one bad file never aborts a
//! multi-file run. The variants here cover the remaining cases: bad
//! arguments to index operations and resource-level failures that are fatal
//! to a whole run.

use thiserror::Error;

/// Unified error type for index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A path was expected in the index but is not present.
    #[error("file not indexed: {path}")]
    FileNotIndexed { path: String },

    /// Snapshot serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal defect (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl IndexError {
    /// Create a file-not-indexed error.
    pub fn file_not_indexed(path: impl Into<String>) -> Self {
        IndexError::FileNotIndexed { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        IndexError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_indexed_display() {
        let err = IndexError::file_not_indexed("gone.py");
        assert_eq!(err.to_string(), "file not indexed: gone.py");
    }

    #[test]
    fn internal_display() {
        let err = IndexError::internal("postings out of sync");
        assert_eq!(err.to_string(), "internal error: postings out of sync");
    }
}
