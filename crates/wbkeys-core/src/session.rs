//! Whistleblower session: derivation, key ring lifecycle and envelopes.
//!
//! A [`WhistleblowerSession`] owns the passphrase vault and the key ring for
//! one whistleblower. Sessions share nothing, so any number of them can live
//! in one process.

use std::sync::Arc;

use futures::future::try_join_all;
use secrecy::SecretString;
use tracing::{debug, info};

use crate::blob::{blob_to_byte_array, FileBlob};
use crate::config::CryptoConfig;
use crate::error::{Result, WbError};
use crate::keyring::KeyRing;
use crate::primitives::{parse_first_public_key, AgePrimitives, CryptoPrimitives, Framing};
use crate::submission::{Receiver, Submission};
use crate::vault::PassphraseVault;

/// Flags observable by the surrounding submission flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionVariables {
    /// Set once an identity has been derived or installed
    pub key_derived: bool,
}

/// Single-owner context for one whistleblower's identity.
pub struct WhistleblowerSession<P: CryptoPrimitives> {
    primitives: Arc<P>,
    config: CryptoConfig,
    vault: PassphraseVault,
    keyring: KeyRing<P>,
    variables: SessionVariables,
}

impl WhistleblowerSession<AgePrimitives> {
    /// Session backed by the shipped age/Ed25519 primitives.
    pub fn with_config(config: CryptoConfig) -> Result<Self> {
        let primitives = Arc::new(AgePrimitives::new(&config));
        Self::new(primitives, config)
    }
}

impl<P: CryptoPrimitives> WhistleblowerSession<P> {
    pub fn new(primitives: Arc<P>, config: CryptoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            keyring: KeyRing::new(primitives.clone()),
            primitives,
            config,
            vault: PassphraseVault::new(),
            variables: SessionVariables::default(),
        })
    }

    pub fn variables(&self) -> &SessionVariables {
        &self.variables
    }

    pub fn key_derived(&self) -> bool {
        self.variables.key_derived
    }

    pub fn keyring(&self) -> &KeyRing<P> {
        &self.keyring
    }

    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    pub fn config(&self) -> &CryptoConfig {
        &self.config
    }

    pub fn store_passphrase(&mut self, passphrase: SecretString) {
        self.vault.store(passphrase);
    }

    /// Unlock the installed identity with the stored passphrase.
    pub async fn unlock(&mut self) -> Result<()> {
        self.keyring.unlock(self.vault.get()).await
    }

    /// Re-lock the identity. No passphrase check.
    pub fn lock(&mut self) -> Result<()> {
        self.keyring.lock()
    }

    /// Erase the passphrase and the whole key ring.
    pub fn clear(&mut self) {
        self.vault.clear();
        self.keyring.clear();
        self.variables.key_derived = false;
        debug!("Session cleared");
    }

    pub fn add_pub_key(&mut self, id: &str, armored_public_key: &str) -> Result<()> {
        self.keyring.add_pub_key(id, armored_public_key)
    }

    /// Install an existing armored private key and the receivers' public keys.
    ///
    /// Requires a stored passphrase. Receivers with an empty key are skipped.
    /// Every receiver key is parsed before the ring is touched, so a failure
    /// leaves the session unchanged. The identity is left Locked.
    pub fn initialize(&mut self, armored_private_key: &str, receivers: &[Receiver]) -> Result<()> {
        if self.vault.is_empty() {
            return Err(WbError::Configuration(
                "a passphrase must be stored before initializing the key ring".to_string(),
            ));
        }

        let receiver_keys = receivers
            .iter()
            .filter(|receiver| receiver.has_public_key())
            .map(|receiver| {
                parse_first_public_key(self.primitives.as_ref(), &receiver.ccrypto_key_public)
                    .map(|key| (receiver.id.clone(), key))
            })
            .collect::<Result<Vec<_>>>()?;

        if !self
            .keyring
            .initialize(armored_private_key, &self.config.owner_label)
        {
            return Err(WbError::InvalidKey(
                "private key could not be installed".to_string(),
            ));
        }

        let skipped = receivers.len() - receiver_keys.len();
        for (id, key) in receiver_keys {
            self.keyring.insert_pub_key(id, key);
        }
        self.variables.key_derived = true;

        info!(
            receivers = self.keyring.recipient_count() - 1,
            skipped, "Key ring initialized"
        );
        Ok(())
    }

    /// Turn `keycode` and `salt` into an installed, unlocked identity and
    /// record it on `submission`.
    ///
    /// The receipt hash is written as soon as it is known, before key
    /// generation. The new identity is unlocked before it is installed; if
    /// anything after the receipt fails, the key ring, vault and
    /// `key_derived` flag are untouched.
    pub async fn derive_key(
        &mut self,
        keycode: &str,
        salt: &str,
        submission: &mut Submission,
    ) -> Result<()> {
        info!(strength = self.config.derivation_strength, "Deriving identity from keycode");
        let material = self
            .primitives
            .derive_from_password(keycode, salt, self.config.derivation_strength)
            .await?;
        submission.receipt_hash = material.authentication.clone();

        let pair = self.primitives.generate_key_pair(&material.passphrase).await?;
        let armored_private = self
            .primitives
            .armor_private_key(&pair.private_key)
            .map_err(|e| WbError::KeyDerivationFailed(e.to_string()))?;
        let armored_public = self.primitives.armor_public_key(&pair.public_key);

        let private_key = self
            .primitives
            .parse_armored_private_key(&armored_private)
            .map_err(|e| {
                WbError::KeyDerivationFailed(format!("generated private key was rejected: {}", e))
            })?;
        let unlocked = self
            .primitives
            .unlock_private_key(&private_key, &material.passphrase)
            .await?;

        self.keyring
            .install_unlocked(private_key, unlocked, &self.config.owner_label);
        self.vault.store(material.passphrase);

        submission.ccrypto_key_private = armored_private;
        submission.ccrypto_key_public = armored_public;
        self.variables.key_derived = true;

        info!("Identity derived and unlocked");
        Ok(())
    }

    /// Re-derive the passphrase for `keycode` and `salt` and store it.
    ///
    /// Used by a returning whistleblower who still holds their armored
    /// private key: follow with [`initialize`](Self::initialize) and
    /// [`unlock`](Self::unlock). Returns the receipt hash.
    pub async fn recover_passphrase(&mut self, keycode: &str, salt: &str) -> Result<String> {
        let material = self
            .primitives
            .derive_from_password(keycode, salt, self.config.derivation_strength)
            .await?;
        self.vault.store(material.passphrase);
        debug!("Passphrase recovered from keycode");
        Ok(material.authentication)
    }

    /// Sign and encrypt an attachment for `receivers`.
    ///
    /// The result keeps the original name and is always typed
    /// `application/octet-stream`.
    pub async fn handle_file_encryption<S: AsRef<str>>(
        &self,
        file: &FileBlob,
        receivers: &[S],
    ) -> Result<FileBlob> {
        let data = blob_to_byte_array(&file.data[..]).await?;
        let recipients = self.resolve_recipients(receivers)?;
        let signing_key = self.keyring.get_key()?;

        let encrypted = self
            .primitives
            .encrypt(&data, &recipients, signing_key, Framing::Binary)
            .await?;

        debug!(
            file = %file.name,
            recipients = recipients.len(),
            "Attachment encrypted"
        );
        Ok(FileBlob::octet_stream(file.name.clone(), encrypted.into_bytes()))
    }

    /// Sign and encrypt JSON answers as an armored envelope.
    ///
    /// The sender's own public key is always added to the recipients.
    pub async fn encrypt_and_sign_answers<S: AsRef<str>>(
        &self,
        json_answers: &str,
        receiver_ids: &[S],
    ) -> Result<String> {
        let recipients = self.resolve_recipients(receiver_ids)?;
        let recipients = self.augment_with_sender(recipients)?;
        let signing_key = self.keyring.get_key()?;

        let armored = self
            .primitives
            .encrypt(json_answers.as_bytes(), &recipients, signing_key, Framing::Armored)
            .await?
            .into_armored()?;

        debug!(recipients = recipients.len(), "Answers encrypted");
        Ok(armored)
    }

    /// Decrypt armored messages, verifying message `i` against signer key `i`.
    ///
    /// Lists of different length are rejected before any decryption. An
    /// empty batch yields an empty result without touching the key ring. All
    /// messages are processed concurrently; output order matches input order
    /// and any single failure fails the whole batch.
    pub async fn decrypt_and_verify_messages<M, K>(
        &self,
        messages: &[M],
        public_keys: &[K],
    ) -> Result<Vec<String>>
    where
        M: AsRef<str>,
        K: AsRef<str>,
    {
        if messages.len() != public_keys.len() {
            return Err(WbError::MismatchedInput {
                messages: messages.len(),
                keys: public_keys.len(),
            });
        }
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let private_key = self.keyring.get_key()?;

        let tasks = messages
            .iter()
            .zip(public_keys)
            .enumerate()
            .map(|(index, (message, key))| {
                self.decrypt_one(index, message.as_ref(), key.as_ref(), private_key)
            });
        let plaintexts = try_join_all(tasks).await?;

        debug!(count = plaintexts.len(), "Messages decrypted and verified");
        Ok(plaintexts)
    }

    /// Decrypt a binary attachment envelope and verify its signer.
    pub async fn decrypt_and_verify_file(
        &self,
        file: &FileBlob,
        signer_public_key: &str,
    ) -> Result<FileBlob> {
        let signer = parse_first_public_key(self.primitives.as_ref(), signer_public_key)?;
        let private_key = self.keyring.get_key()?;

        let bytes = blob_to_byte_array(&file.data[..]).await?;
        let message = self.primitives.message_from_bytes(bytes)?;
        let data = self.primitives.decrypt(&message, private_key, &signer).await?;

        debug!(file = %file.name, "Attachment decrypted and verified");
        Ok(FileBlob::octet_stream(file.name.clone(), data))
    }

    fn resolve_recipients<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<P::PublicKey>> {
        ids.iter()
            .map(|id| self.keyring.get_pub_key(id.as_ref()).cloned())
            .collect()
    }

    /// Augment the recipient set with the sender's own public key.
    fn augment_with_sender(&self, mut recipients: Vec<P::PublicKey>) -> Result<Vec<P::PublicKey>> {
        recipients.push(self.keyring.owner_public_key()?.clone());
        Ok(recipients)
    }

    async fn decrypt_one(
        &self,
        index: usize,
        armored_message: &str,
        armored_signer: &str,
        private_key: &P::UnlockedKey,
    ) -> Result<String> {
        let message = self.primitives.parse_armored_message(armored_message)?;
        let signer = parse_first_public_key(self.primitives.as_ref(), armored_signer)?;
        let plaintext = self.primitives.decrypt(&message, private_key, &signer).await?;
        String::from_utf8(plaintext).map_err(|_| {
            WbError::InvalidInput(format!("message {} is not valid UTF-8 text", index))
        })
    }
}

impl<P: CryptoPrimitives> std::fmt::Debug for WhistleblowerSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhistleblowerSession")
            .field("config", &self.config)
            .field("vault", &self.vault)
            .field("keyring", &self.keyring)
            .field("variables", &self.variables)
            .finish()
    }
}
