//! Error types for DocPack core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DocPack core operations.
///
/// A missing field is never an error; lookups return `None` and updates
/// report a per-field outcome instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Scalar codec error.
    #[error("codec error: {0}")]
    Codec(#[from] docpack_codec::CodecError),

    /// The buffer and the structure index disagree. The document must be
    /// discarded.
    #[error("document corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// Serialized bytes do not describe a valid document.
    #[error("invalid document format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Input value cannot be turned into a document.
    #[error("invalid input document: {message}")]
    InvalidInput {
        /// Description of why the input was rejected.
        message: String,
    },

    /// Update document is not a map of operator blocks.
    #[error("invalid update document: {message}")]
    InvalidUpdate {
        /// Description of the malformed update.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an invalid update error.
    pub fn invalid_update(message: impl Into<String>) -> Self {
        Self::InvalidUpdate {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Whether the document that produced this error must be discarded.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}
