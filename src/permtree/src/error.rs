//! Error types for rule compilation and permission checks

use thiserror::Error;

/// Why a query path was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The path has no segments at all
    #[error("path is empty")]
    EmptyPath,

    /// A segment between two separators (or at either end) is empty
    #[error("segment {position} is empty")]
    EmptySegment { position: usize },

    /// The wildcard token only belongs in rule patterns
    #[error("segment {position} is the wildcard token")]
    Wildcard { position: usize },

    /// A segment supplied on its own contains the separator
    #[error("segment {position} contains the separator")]
    Separator { position: usize },
}

/// Permission tree errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A rule pattern contains an empty segment
    #[error("Malformed pattern '{pattern}': segment {position} is empty")]
    MalformedPattern { pattern: String, position: usize },

    /// A query path cannot be resolved
    #[error("Invalid query '{path}': {reason}")]
    InvalidQuery { path: String, reason: QueryError },

    /// Separator/wildcard configuration is unusable
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
}

impl Error {
    pub(crate) fn query(path: impl Into<String>, reason: QueryError) -> Self {
        Self::InvalidQuery {
            path: path.into(),
            reason,
        }
    }
}

/// Result type for permission tree operations
pub type Result<T> = std::result::Result<T, Error>;
