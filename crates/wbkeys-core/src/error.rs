//! Error types for wbkeys core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer will map these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for wbkeys operations.
pub type Result<T> = std::result::Result<T, WbError>;

/// Core error type for wbkeys operations.
#[derive(Debug, Error)]
pub enum WbError {
    /// Operation called out of order or with an invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Derived key material could not be installed into the key ring
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// Armored key could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Recipient id was never added to the key ring
    #[error("Public key not found for recipient: {0}")]
    RecipientNotFound(String),

    /// No identity is installed in the key ring
    #[error("No identity installed in key ring")]
    NoIdentity,

    /// Private key operation attempted while the key ring is locked
    #[error("Key ring is locked")]
    Locked,

    /// Passphrase is absent or does not open the private key
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// Parallel message and signer lists differ in length
    #[error("Mismatched input: {messages} messages but {keys} public keys")]
    MismatchedInput { messages: usize, keys: usize },

    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Signature did not verify against the expected signer
    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl WbError {
    /// Whether this error came out of an underlying cryptographic operation
    /// (as opposed to call order, lookup or input shape).
    pub fn is_crypto_failure(&self) -> bool {
        matches!(
            self,
            WbError::Crypto(_) | WbError::InvalidSignature(_) | WbError::IncorrectPassphrase
        )
    }
}
