//! Unified error system for Courier
//!
//! A single error enum shared by every crate in the workspace. Variants map
//! to the error taxonomy of the mediator: decode/validation failures,
//! capability failures (messaging, key management, registry, storage), and
//! configuration errors.

use serde::{Deserialize, Serialize};

/// Unified error type for all Courier operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum CourierError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// What was invalid
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found
        message: String,
    },

    /// Inbound payload could not be decoded
    #[error("Decode error: {message}")]
    Decode {
        /// Decode failure detail
        message: String,
    },

    /// Cryptographic or key-management operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Crypto failure detail
        message: String,
    },

    /// Messaging capability failed
    #[error("Messaging error: {message}")]
    Messaging {
        /// Messaging failure detail
        message: String,
    },

    /// DID registry operation failed
    #[error("Registry error: {message}")]
    Registry {
        /// Registry failure detail
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Storage failure detail
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Internal failure detail
        message: String,
    },
}

impl CourierError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a messaging error
    pub fn messaging(message: impl Into<String>) -> Self {
        Self::Messaging {
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type for all Courier operations
pub type CourierResult<T> = Result<T, CourierError>;

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_variant_prefix() {
        let err = CourierError::invalid("did document mandatory");
        assert_eq!(err.to_string(), "Invalid: did document mandatory");
    }

    #[test]
    fn constructors_map_to_variants() {
        assert!(matches!(
            CourierError::not_found("did-value"),
            CourierError::NotFound { .. }
        ));
        assert!(matches!(
            CourierError::storage("disk full"),
            CourierError::Storage { .. }
        ));
    }
}
