//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode value to MessagePack.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Bytes remained after a complete value was decoded.
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// Invalid MessagePack structure.
    #[error("invalid MessagePack structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Unsupported MessagePack type.
    #[error("unsupported MessagePack type: {type_name}")]
    UnsupportedType {
        /// Name of the unsupported type.
        type_name: String,
    },

    /// A length prefix exceeded the decoder's limit.
    #[error("size limit exceeded: claimed {claimed}, max allowed {max_allowed}")]
    SizeLimitExceeded {
        /// Length announced by the input.
        claimed: u64,
        /// Largest length the decoder accepts.
        max_allowed: u64,
    },

    /// Containers nested deeper than the decoder accepts.
    #[error("nesting exceeds {max_depth} levels")]
    DepthLimitExceeded {
        /// Deepest nesting the decoder accepts.
        max_depth: usize,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }
}
