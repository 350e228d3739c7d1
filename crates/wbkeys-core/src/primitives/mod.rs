//! Cryptographic capability consumed by the key ring and the session.
//!
//! The orchestration code never touches a concrete cipher. Everything it
//! needs is expressed by the [`CryptoPrimitives`] trait:
//!
//! - **Derivation**: keycode + salt -> passphrase and receipt authentication
//! - **Key generation**: passphrase -> protected keypair (deterministic)
//! - **Armor**: text encodings for keys and messages
//! - **Envelopes**: signed multi-recipient encryption and verified decryption
//!
//! [`AgePrimitives`] is the implementation shipped with this crate. Tests may
//! substitute any other implementation, e.g. a wrapper that counts calls.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::{Result, WbError};

mod age_ed25519;
mod armor;

pub use age_ed25519::{AgeMessage, AgePrimitives, AgePrivateKey, AgePublicKey, AgeUnlockedKey};

/// Output of password derivation.
///
/// Produced once per derivation and consumed immediately: the passphrase goes
/// into the vault, the authentication value into the submission receipt.
pub struct DerivedMaterial {
    /// Secret that generates and unlocks the identity
    pub passphrase: SecretString,
    /// One-way receipt proof, safe to transmit
    pub authentication: String,
}

impl std::fmt::Debug for DerivedMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedMaterial")
            .field("passphrase", &"[REDACTED]")
            .field("authentication", &self.authentication)
            .finish()
    }
}

/// Freshly generated identity.
pub struct KeyPair<K, P> {
    pub private_key: K,
    pub public_key: P,
}

/// How an encrypted envelope is framed on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Raw bytes, for attachments
    Binary,
    /// ASCII armor, for text stored or transmitted as a string
    Armored,
}

/// Encrypted envelope in the framing that was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedMessage {
    Binary(Vec<u8>),
    Armored(String),
}

impl EncryptedMessage {
    /// Raw octets of the envelope (armored text is returned as its UTF-8 bytes).
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            EncryptedMessage::Binary(bytes) => bytes,
            EncryptedMessage::Armored(text) => text.into_bytes(),
        }
    }

    /// Armored text of the envelope; binary envelopes are rejected.
    pub fn into_armored(self) -> Result<String> {
        match self {
            EncryptedMessage::Armored(text) => Ok(text),
            EncryptedMessage::Binary(_) => Err(WbError::Crypto(
                "expected an armored envelope but got binary framing".to_string(),
            )),
        }
    }
}

/// Public-key primitives the core orchestrates.
///
/// Key and message representations are opaque associated types; the core
/// only moves them between calls.
#[async_trait]
pub trait CryptoPrimitives: Send + Sync {
    /// Recipient / signer public key
    type PublicKey: Clone + Send + Sync;
    /// Passphrase-protected private key, as installed in the key ring
    type PrivateKey: Send + Sync;
    /// Private key after a successful unlock
    type UnlockedKey: Send + Sync;
    /// Parsed envelope ready for decryption
    type Message: Send + Sync;

    /// Stretch a low-entropy secret into a passphrase and a receipt value.
    async fn derive_from_password(
        &self,
        secret: &str,
        salt: &str,
        strength: u32,
    ) -> Result<DerivedMaterial>;

    /// Generate the keypair belonging to `passphrase`.
    ///
    /// The same passphrase must always yield the same public key.
    async fn generate_key_pair(
        &self,
        passphrase: &SecretString,
    ) -> Result<KeyPair<Self::PrivateKey, Self::PublicKey>>;

    fn armor_private_key(&self, key: &Self::PrivateKey) -> Result<String>;

    fn armor_public_key(&self, key: &Self::PublicKey) -> String;

    fn parse_armored_private_key(&self, armored: &str) -> Result<Self::PrivateKey>;

    /// Parse every key block in `armored`. Private key blocks yield their public part.
    fn parse_armored_key(&self, armored: &str) -> Result<Vec<Self::PublicKey>>;

    fn public_key_of(&self, key: &Self::PrivateKey) -> Self::PublicKey;

    /// Open a protected private key. Fails with `IncorrectPassphrase` on mismatch.
    async fn unlock_private_key(
        &self,
        key: &Self::PrivateKey,
        passphrase: &SecretString,
    ) -> Result<Self::UnlockedKey>;

    fn parse_armored_message(&self, text: &str) -> Result<Self::Message>;

    /// Wrap binary envelope bytes for decryption.
    fn message_from_bytes(&self, bytes: Vec<u8>) -> Result<Self::Message>;

    /// Sign `data` with `signing_key`, then encrypt it to every recipient.
    async fn encrypt(
        &self,
        data: &[u8],
        recipients: &[Self::PublicKey],
        signing_key: &Self::UnlockedKey,
        framing: Framing,
    ) -> Result<EncryptedMessage>;

    /// Decrypt `message` and verify it was signed by `signer`.
    async fn decrypt(
        &self,
        message: &Self::Message,
        private_key: &Self::UnlockedKey,
        signer: &Self::PublicKey,
    ) -> Result<Vec<u8>>;
}

/// First key of an armored key text, the way callers address a single signer
/// or recipient.
pub(crate) fn parse_first_public_key<P: CryptoPrimitives + ?Sized>(
    primitives: &P,
    armored: &str,
) -> Result<P::PublicKey> {
    if armored.trim().is_empty() {
        return Err(WbError::InvalidKey("empty armored key".to_string()));
    }
    primitives
        .parse_armored_key(armored)?
        .into_iter()
        .next()
        .ok_or_else(|| WbError::InvalidKey("armored text contains no key".to_string()))
}
