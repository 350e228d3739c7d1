#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use wbkeys_core::primitives::{
    AgePrimitives, CryptoPrimitives, DerivedMaterial, EncryptedMessage, Framing, KeyPair,
};
use wbkeys_core::{CryptoConfig, Result, Submission, WbError, WhistleblowerSession};

pub const SALT: &str = "integration-salt-0001";

/// Low-cost parameters for tests.
pub fn fast_config() -> CryptoConfig {
    CryptoConfig {
        derivation_strength: 8,
        kdf_iterations: 1,
        key_protection_work_factor: 4,
        ..CryptoConfig::default()
    }
}

/// Delegates to the wrapped primitives and counts decrypt calls. Can be
/// told to refuse every unlock.
pub struct CountingPrimitives<P> {
    inner: P,
    decrypt_calls: AtomicUsize,
    refuse_unlock: AtomicBool,
}

impl<P> CountingPrimitives<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            decrypt_calls: AtomicUsize::new(0),
            refuse_unlock: AtomicBool::new(false),
        }
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    pub fn refuse_unlocks(&self, refuse: bool) {
        self.refuse_unlock.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl<P: CryptoPrimitives> CryptoPrimitives for CountingPrimitives<P> {
    type PublicKey = P::PublicKey;
    type PrivateKey = P::PrivateKey;
    type UnlockedKey = P::UnlockedKey;
    type Message = P::Message;

    async fn derive_from_password(
        &self,
        secret: &str,
        salt: &str,
        strength: u32,
    ) -> Result<DerivedMaterial> {
        self.inner.derive_from_password(secret, salt, strength).await
    }

    async fn generate_key_pair(
        &self,
        passphrase: &SecretString,
    ) -> Result<KeyPair<Self::PrivateKey, Self::PublicKey>> {
        self.inner.generate_key_pair(passphrase).await
    }

    fn armor_private_key(&self, key: &Self::PrivateKey) -> Result<String> {
        self.inner.armor_private_key(key)
    }

    fn armor_public_key(&self, key: &Self::PublicKey) -> String {
        self.inner.armor_public_key(key)
    }

    fn parse_armored_private_key(&self, armored: &str) -> Result<Self::PrivateKey> {
        self.inner.parse_armored_private_key(armored)
    }

    fn parse_armored_key(&self, armored: &str) -> Result<Vec<Self::PublicKey>> {
        self.inner.parse_armored_key(armored)
    }

    fn public_key_of(&self, key: &Self::PrivateKey) -> Self::PublicKey {
        self.inner.public_key_of(key)
    }

    async fn unlock_private_key(
        &self,
        key: &Self::PrivateKey,
        passphrase: &SecretString,
    ) -> Result<Self::UnlockedKey> {
        if self.refuse_unlock.load(Ordering::SeqCst) {
            return Err(WbError::Crypto("unlock disabled".to_string()));
        }
        self.inner.unlock_private_key(key, passphrase).await
    }

    fn parse_armored_message(&self, text: &str) -> Result<Self::Message> {
        self.inner.parse_armored_message(text)
    }

    fn message_from_bytes(&self, bytes: Vec<u8>) -> Result<Self::Message> {
        self.inner.message_from_bytes(bytes)
    }

    async fn encrypt(
        &self,
        data: &[u8],
        recipients: &[Self::PublicKey],
        signing_key: &Self::UnlockedKey,
        framing: Framing,
    ) -> Result<EncryptedMessage> {
        self.inner
            .encrypt(data, recipients, signing_key, framing)
            .await
    }

    async fn decrypt(
        &self,
        message: &Self::Message,
        private_key: &Self::UnlockedKey,
        signer: &Self::PublicKey,
    ) -> Result<Vec<u8>> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decrypt(message, private_key, signer).await
    }
}

pub type CountingSession = WhistleblowerSession<CountingPrimitives<AgePrimitives>>;

/// A session whose primitives count decrypt calls, plus a handle on them.
pub fn counting_session() -> (CountingSession, Arc<CountingPrimitives<AgePrimitives>>) {
    let config = fast_config();
    let primitives = Arc::new(CountingPrimitives::new(AgePrimitives::new(&config)));
    let session = WhistleblowerSession::new(primitives.clone(), config)
        .expect("fast config should be valid");
    (session, primitives)
}

pub fn session() -> WhistleblowerSession<AgePrimitives> {
    WhistleblowerSession::with_config(fast_config()).expect("fast config should be valid")
}

/// Derive a fresh, unlocked identity for `keycode`.
pub async fn derived_session(keycode: &str) -> (WhistleblowerSession<AgePrimitives>, Submission) {
    let mut session = session();
    let mut submission = Submission::new();
    session
        .derive_key(keycode, SALT, &mut submission)
        .await
        .expect("derive should succeed");
    (session, submission)
}
