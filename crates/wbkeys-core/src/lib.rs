//! # wbkeys core
//!
//! Keycode identity and secure messaging for a whistleblower submission channel.
//!
//! A whistleblower holds only a low-entropy keycode. Together with a
//! per-submission salt it deterministically yields a long-term identity,
//! which signs and encrypts attachments and answers for every recipient and
//! decrypts their replies.
//!
//! ## Architecture
//!
//! - **primitives**: the `CryptoPrimitives` capability and its age/Ed25519 implementation
//! - **vault**: in-memory passphrase holder
//! - **keyring**: the identity, recipient public keys, lock state
//! - **session**: derivation and envelope orchestration
//! - **submission** / **blob**: records and payloads exchanged with the submission flow

pub mod blob;
pub mod config;
pub mod error;
pub mod keyring;
pub mod primitives;
pub mod session;
pub mod submission;
pub mod vault;

pub use blob::{blob_to_byte_array, FileBlob, OCTET_STREAM};
pub use config::CryptoConfig;
pub use error::{Result, WbError};
pub use keyring::KeyRing;
pub use primitives::{
    AgePrimitives, CryptoPrimitives, DerivedMaterial, EncryptedMessage, Framing, KeyPair,
};
pub use session::{SessionVariables, WhistleblowerSession};
pub use submission::{Receiver, Submission};
pub use vault::PassphraseVault;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
