//! Records exchanged with the submission flow.

use serde::{Deserialize, Serialize};

/// Submission record the derivation writes into.
///
/// The session fills these fields; the surrounding flow owns persistence
/// and transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    /// One-way receipt proof of the keycode
    pub receipt_hash: String,
    /// Armored, passphrase-protected private key
    pub ccrypto_key_private: String,
    /// Armored public key
    pub ccrypto_key_public: String,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A recipient of the submission and their armored public key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Receiver {
    pub id: String,
    pub ccrypto_key_public: String,
}

impl Receiver {
    pub fn new(id: impl Into<String>, ccrypto_key_public: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ccrypto_key_public: ccrypto_key_public.into(),
        }
    }

    /// Receivers without a key never make it into the key ring.
    pub fn has_public_key(&self) -> bool {
        !self.ccrypto_key_public.trim().is_empty()
    }
}

impl AsRef<str> for Receiver {
    fn as_ref(&self) -> &str {
        &self.id
    }
}
