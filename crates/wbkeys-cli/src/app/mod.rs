//! Application-level utilities for the wbkeys CLI.
//!
//! - Context combining CLI arguments with the loaded configuration
//! - Re-opening an identity from keycode, salt and armored private key

mod context;
mod session;

pub use context::AppContext;
