//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes. Core errors are classified in
//! [`CliError::from_core`].

use std::fmt;

use wbkeys_core::WbError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Missing file or unknown recipient
    NotFound { message: String, hint: String },

    /// Keycode does not unlock the identity
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),

    /// Ciphertext could not be decrypted or its signature did not verify
    IntegrityFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::IntegrityFailed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Classify a core error, if it has a dedicated exit code.
    pub fn from_core(err: &WbError) -> Option<Self> {
        match err {
            WbError::RecipientNotFound(id) => Some(CliError::not_found(
                format!("Unknown recipient: {}", id),
                "Pass its public key with --recipient ID=FILE",
            )),
            WbError::IncorrectPassphrase => Some(CliError::AuthFailed {
                message: "Keycode does not unlock this identity".to_string(),
                hint: None,
            }),
            WbError::InvalidInput(_)
            | WbError::InvalidKey(_)
            | WbError::MismatchedInput { .. }
            | WbError::Configuration(_) => Some(CliError::invalid_input(err.to_string())),
            WbError::Crypto(_) | WbError::InvalidSignature(_) => {
                Some(CliError::IntegrityFailed(err.to_string()))
            }
            _ => None,
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::IntegrityFailed(_) => exit_codes::INTEGRITY_FAILED,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}
