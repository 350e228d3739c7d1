//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, and by clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Missing file or unknown recipient.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Keycode does not unlock the identity.
    pub const AUTH_FAILED: i32 = 5;

    /// Decryption or signature verification failed.
    pub const INTEGRITY_FAILED: i32 = 6;
}

/// Environment variable holding the keycode for non-interactive use.
pub const KEYCODE_ENV: &str = "WBKEYS_KEYCODE";

/// Environment variable with a tracing filter directive.
pub const LOG_ENV: &str = "WBKEYS_LOG";
