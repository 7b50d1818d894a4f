//! Error types for the cache
//!
//! Provides the unified error taxonomy shared by backends, codecs and the
//! typed cache.

use std::error::Error as StdError;

use thiserror::Error;

// == Codec Error Enum ==
/// Failure raised by a codec while converting between values and bytes.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value could not be serialized
    #[error("{codec} encode failed: {message}")]
    Encode {
        codec: &'static str,
        message: String,
    },

    /// The payload could not be deserialized into the requested type
    #[error("{codec} decode failed: {message}")]
    Decode {
        codec: &'static str,
        message: String,
    },
}

impl CodecError {
    pub fn encode(codec: &'static str, err: impl std::fmt::Display) -> Self {
        CodecError::Encode {
            codec,
            message: err.to_string(),
        }
    }

    pub fn decode(codec: &'static str, err: impl std::fmt::Display) -> Self {
        CodecError::Decode {
            codec,
            message: err.to_string(),
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for every cache operation.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired. Expected and frequent; outputs are left untouched.
    #[error("cache miss")]
    Miss,

    /// The caller broke an operation contract (empty key, zero TTL, oversized value)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization or deserialization failure
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Underlying store failure (connection, protocol, timeout)
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl CacheError {
    /// Wraps an adapter failure as a backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        CacheError::Backend(err.into())
    }

    /// Returns true for the `Miss` sentinel.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss)
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
