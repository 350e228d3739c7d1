//! age + Ed25519 implementation of [`CryptoPrimitives`].
//!
//! - **Derivation**: Argon2id over keycode and salt; the receipt value is
//!   SHA-512 of the resulting passphrase
//! - **Key generation**: HKDF-SHA256 expands the passphrase into an X25519
//!   age identity and an Ed25519 signing key, so the same passphrase always
//!   regenerates the same identity
//! - **Key protection**: the secret seeds are sealed with age's scrypt
//!   passphrase recipient
//! - **Envelopes**: the payload is signed first, then the signed frame is
//!   encrypted to every recipient with age (binary or ASCII armored)

use std::io::{Read, Write};
use std::iter;
use std::str::FromStr;
use std::sync::Arc;

use age::armor::{ArmoredReader, ArmoredWriter, Format};
use argon2::Argon2;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bech32::{ToBase32, Variant};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SIGNATURE_LENGTH};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::armor::{armor, dearmor, PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL};
use super::{CryptoPrimitives, DerivedMaterial, EncryptedMessage, Framing, KeyPair};
use crate::config::{CryptoConfig, STRENGTH_RANGE};
use crate::error::{Result, WbError};

/// Length of the Argon2id output and of each generated seed.
const SEED_LENGTH: usize = 32;

/// Argon2 rejects shorter salts.
const MIN_SALT_LENGTH: usize = 8;

/// HKDF salt separating key generation from any other use of the passphrase.
const KEYGEN_DOMAIN: &[u8] = b"wbkeys/keygen/v1";
const ENCRYPTION_SEED_INFO: &[u8] = b"x25519 encryption";
const SIGNING_SEED_INFO: &[u8] = b"ed25519 signing";

/// Version of the key documents and of the signed envelope frame.
const FORMAT_VERSION: u8 = 1;

const ARMORED_MESSAGE_BEGIN: &str = "-----BEGIN AGE ENCRYPTED FILE-----";

/// Public half of an identity: where to encrypt to, and whose signatures to trust.
#[derive(Clone)]
pub struct AgePublicKey {
    encryption: age::x25519::Recipient,
    signing: VerifyingKey,
}

impl AgePublicKey {
    /// The age recipient string (`age1...`).
    pub fn recipient(&self) -> String {
        self.encryption.to_string()
    }

    /// Short hex fingerprint of the signing key, suitable for logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.signing.as_bytes());
        hex::encode(&digest[..8])
    }

    fn to_document(&self) -> PublicKeyDocument {
        PublicKeyDocument {
            version: FORMAT_VERSION,
            encryption: self.encryption.to_string(),
            signing: STANDARD.encode(self.signing.as_bytes()),
        }
    }

    fn from_document(document: &PublicKeyDocument) -> Result<Self> {
        check_version(document.version)?;
        let encryption = age::x25519::Recipient::from_str(&document.encryption)
            .map_err(|e| WbError::InvalidKey(format!("invalid encryption key: {}", e)))?;
        let signing_bytes = decode_seed(&document.signing, "signing key")?;
        let signing = VerifyingKey::from_bytes(&signing_bytes)
            .map_err(|e| WbError::InvalidKey(format!("invalid signing key: {}", e)))?;
        Ok(Self {
            encryption,
            signing,
        })
    }
}

impl PartialEq for AgePublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.signing == other.signing && self.recipient() == other.recipient()
    }
}

impl Eq for AgePublicKey {}

impl std::fmt::Debug for AgePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgePublicKey")
            .field("recipient", &self.recipient())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Private key as stored: public half in the clear, secret seeds sealed
/// under the passphrase.
#[derive(Clone)]
pub struct AgePrivateKey {
    public: AgePublicKey,
    sealed: Vec<u8>,
}

impl std::fmt::Debug for AgePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgePrivateKey")
            .field("public", &self.public)
            .field("sealed", &format!("{} bytes", self.sealed.len()))
            .finish()
    }
}

/// Private key after unlock. Usable for decryption and signing.
///
/// Clones share the same secret material.
#[derive(Clone)]
pub struct AgeUnlockedKey {
    secrets: Arc<UnlockedSecrets>,
}

struct UnlockedSecrets {
    encryption: age::x25519::Identity,
    signing: SigningKey,
}

impl std::fmt::Debug for AgeUnlockedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgeUnlockedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Binary age envelope.
#[derive(Debug, Clone)]
pub struct AgeMessage {
    bytes: Vec<u8>,
}

impl AgeMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Serialize, Deserialize)]
struct PublicKeyDocument {
    version: u8,
    encryption: String,
    signing: String,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyDocument {
    version: u8,
    public: PublicKeyDocument,
    sealed: String,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SecretSeeds {
    version: u8,
    encryption: String,
    signing: String,
}

/// age/Ed25519 primitives configured from [`CryptoConfig`].
#[derive(Debug, Clone)]
pub struct AgePrimitives {
    kdf_iterations: u32,
    kdf_parallelism: u32,
    work_factor: u8,
}

impl AgePrimitives {
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            kdf_iterations: config.kdf_iterations,
            kdf_parallelism: config.kdf_parallelism,
            work_factor: config.key_protection_work_factor,
        }
    }
}

impl Default for AgePrimitives {
    fn default() -> Self {
        Self::new(&CryptoConfig::default())
    }
}

#[async_trait]
impl CryptoPrimitives for AgePrimitives {
    type PublicKey = AgePublicKey;
    type PrivateKey = AgePrivateKey;
    type UnlockedKey = AgeUnlockedKey;
    type Message = AgeMessage;

    async fn derive_from_password(
        &self,
        secret: &str,
        salt: &str,
        strength: u32,
    ) -> Result<DerivedMaterial> {
        if secret.is_empty() {
            return Err(WbError::InvalidInput("Keycode cannot be empty".to_string()));
        }
        if salt.len() < MIN_SALT_LENGTH {
            return Err(WbError::InvalidInput(format!(
                "Salt must be at least {} bytes",
                MIN_SALT_LENGTH
            )));
        }
        if !STRENGTH_RANGE.contains(&strength) {
            return Err(WbError::InvalidInput(format!(
                "Derivation strength must be between {} and {} (got {})",
                STRENGTH_RANGE.start(),
                STRENGTH_RANGE.end(),
                strength
            )));
        }

        let secret = Zeroizing::new(secret.to_string());
        let salt = salt.to_string();
        let (iterations, parallelism) = (self.kdf_iterations, self.kdf_parallelism);
        tokio::task::spawn_blocking(move || {
            derive_blocking(&secret, &salt, strength, iterations, parallelism)
        })
        .await
        .map_err(|e| WbError::Crypto(format!("Derivation task failed: {}", e)))?
    }

    async fn generate_key_pair(
        &self,
        passphrase: &SecretString,
    ) -> Result<KeyPair<AgePrivateKey, AgePublicKey>> {
        let passphrase = Zeroizing::new(passphrase.expose_secret().to_string());
        let work_factor = self.work_factor;
        tokio::task::spawn_blocking(move || generate_blocking(&passphrase, work_factor))
            .await
            .map_err(|e| WbError::Crypto(format!("Key generation task failed: {}", e)))?
    }

    fn armor_private_key(&self, key: &AgePrivateKey) -> Result<String> {
        let document = PrivateKeyDocument {
            version: FORMAT_VERSION,
            public: key.public.to_document(),
            sealed: STANDARD.encode(&key.sealed),
        };
        let body = serde_json::to_vec(&document)?;
        Ok(armor(PRIVATE_KEY_LABEL, &body))
    }

    fn armor_public_key(&self, key: &AgePublicKey) -> String {
        // Serializing a struct of plain strings cannot fail
        let body = serde_json::to_vec(&key.to_document()).unwrap_or_default();
        armor(PUBLIC_KEY_LABEL, &body)
    }

    fn parse_armored_private_key(&self, armored: &str) -> Result<AgePrivateKey> {
        let block = dearmor(armored)?
            .into_iter()
            .find(|block| block.label == PRIVATE_KEY_LABEL)
            .ok_or_else(|| WbError::InvalidKey("no private key block found".to_string()))?;
        let document: PrivateKeyDocument = serde_json::from_slice(&block.body)
            .map_err(|e| WbError::InvalidKey(format!("malformed private key: {}", e)))?;
        check_version(document.version)?;
        let public = AgePublicKey::from_document(&document.public)?;
        let sealed = STANDARD
            .decode(document.sealed.as_bytes())
            .map_err(|e| WbError::InvalidKey(format!("invalid sealed key encoding: {}", e)))?;

        // Reject anything that is not an age passphrase envelope up front
        let decryptor = age::Decryptor::new(&sealed[..])
            .map_err(|e| WbError::InvalidKey(format!("invalid sealed key: {}", e)))?;
        if !decryptor.is_scrypt() {
            return Err(WbError::InvalidKey(
                "sealed key is not passphrase protected".to_string(),
            ));
        }

        Ok(AgePrivateKey { public, sealed })
    }

    fn parse_armored_key(&self, armored: &str) -> Result<Vec<AgePublicKey>> {
        dearmor(armored)?
            .iter()
            .map(|block| match block.label.as_str() {
                PUBLIC_KEY_LABEL => {
                    let document: PublicKeyDocument = serde_json::from_slice(&block.body)
                        .map_err(|e| WbError::InvalidKey(format!("malformed public key: {}", e)))?;
                    AgePublicKey::from_document(&document)
                }
                PRIVATE_KEY_LABEL => {
                    let document: PrivateKeyDocument = serde_json::from_slice(&block.body)
                        .map_err(|e| {
                            WbError::InvalidKey(format!("malformed private key: {}", e))
                        })?;
                    AgePublicKey::from_document(&document.public)
                }
                other => Err(WbError::InvalidKey(format!(
                    "unsupported armor block '{}'",
                    other
                ))),
            })
            .collect()
    }

    fn public_key_of(&self, key: &AgePrivateKey) -> AgePublicKey {
        key.public.clone()
    }

    async fn unlock_private_key(
        &self,
        key: &AgePrivateKey,
        passphrase: &SecretString,
    ) -> Result<AgeUnlockedKey> {
        let key = key.clone();
        let passphrase = Zeroizing::new(passphrase.expose_secret().to_string());
        let max_work_factor = self.work_factor;
        tokio::task::spawn_blocking(move || unlock_blocking(&key, &passphrase, max_work_factor))
            .await
            .map_err(|e| WbError::Crypto(format!("Unlock task failed: {}", e)))?
    }

    fn parse_armored_message(&self, text: &str) -> Result<AgeMessage> {
        let trimmed = text.trim();
        if !trimmed.starts_with(ARMORED_MESSAGE_BEGIN) {
            return Err(WbError::Crypto("message is not ASCII armored".to_string()));
        }
        let mut reader = ArmoredReader::new(trimmed.as_bytes());
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| WbError::Crypto(format!("Failed to read armored message: {}", e)))?;
        self.message_from_bytes(bytes)
    }

    fn message_from_bytes(&self, bytes: Vec<u8>) -> Result<AgeMessage> {
        age::Decryptor::new(&bytes[..])
            .map_err(|e| WbError::Crypto(format!("Invalid message header: {}", e)))?;
        Ok(AgeMessage { bytes })
    }

    async fn encrypt(
        &self,
        data: &[u8],
        recipients: &[AgePublicKey],
        signing_key: &AgeUnlockedKey,
        framing: Framing,
    ) -> Result<EncryptedMessage> {
        if recipients.is_empty() {
            return Err(WbError::InvalidInput(
                "at least one recipient is required".to_string(),
            ));
        }

        let data = Zeroizing::new(data.to_vec());
        let recipients = recipients.to_vec();
        let signing_key = signing_key.clone();
        tokio::task::spawn_blocking(move || {
            encrypt_blocking(&data, &recipients, &signing_key, framing)
        })
        .await
        .map_err(|e| WbError::Crypto(format!("Encryption task failed: {}", e)))?
    }

    async fn decrypt(
        &self,
        message: &AgeMessage,
        private_key: &AgeUnlockedKey,
        signer: &AgePublicKey,
    ) -> Result<Vec<u8>> {
        let message = message.clone();
        let private_key = private_key.clone();
        let signer = signer.clone();
        tokio::task::spawn_blocking(move || decrypt_blocking(&message, &private_key, &signer))
            .await
            .map_err(|e| WbError::Crypto(format!("Decryption task failed: {}", e)))?
    }
}

fn derive_blocking(
    secret: &str,
    salt: &str,
    strength: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<DerivedMaterial> {
    let params = argon2::Params::new(1u32 << strength, iterations, parallelism, Some(SEED_LENGTH))
        .map_err(|e| WbError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; SEED_LENGTH]);
    argon2
        .hash_password_into(secret.as_bytes(), salt.as_bytes(), &mut key[..])
        .map_err(|e| WbError::Crypto(format!("Key derivation failed: {}", e)))?;

    let passphrase = Zeroizing::new(hex::encode(&key[..]));
    let authentication = hex::encode(Sha512::digest(passphrase.as_bytes()));
    Ok(DerivedMaterial {
        passphrase: SecretString::from(passphrase.to_string()),
        authentication,
    })
}

fn generate_blocking(
    passphrase: &str,
    work_factor: u8,
) -> Result<KeyPair<AgePrivateKey, AgePublicKey>> {
    let hkdf = Hkdf::<Sha256>::new(Some(KEYGEN_DOMAIN), passphrase.as_bytes());
    let mut encryption_seed = Zeroizing::new([0u8; SEED_LENGTH]);
    let mut signing_seed = Zeroizing::new([0u8; SEED_LENGTH]);
    hkdf.expand(ENCRYPTION_SEED_INFO, &mut encryption_seed[..])
        .and_then(|_| hkdf.expand(SIGNING_SEED_INFO, &mut signing_seed[..]))
        .map_err(|e| WbError::Crypto(format!("Seed expansion failed: {}", e)))?;

    let identity = age_identity(&encryption_seed)?;
    let signing = SigningKey::from_bytes(&signing_seed);
    let public = AgePublicKey {
        encryption: identity.to_public(),
        signing: signing.verifying_key(),
    };

    let seeds = SecretSeeds {
        version: FORMAT_VERSION,
        encryption: STANDARD.encode(&encryption_seed[..]),
        signing: STANDARD.encode(&signing_seed[..]),
    };
    let plaintext = Zeroizing::new(serde_json::to_vec(&seeds)?);
    let sealed = seal_with_passphrase(&plaintext, passphrase, work_factor)?;

    Ok(KeyPair {
        private_key: AgePrivateKey {
            public: public.clone(),
            sealed,
        },
        public_key: public,
    })
}

fn unlock_blocking(
    key: &AgePrivateKey,
    passphrase: &str,
    max_work_factor: u8,
) -> Result<AgeUnlockedKey> {
    let decryptor = age::Decryptor::new(&key.sealed[..])
        .map_err(|e| WbError::InvalidKey(format!("invalid sealed key: {}", e)))?;
    let mut identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
    identity.set_max_work_factor(max_work_factor);
    let mut reader = decryptor
        .decrypt(iter::once(&identity as &dyn age::Identity))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys
            | age::DecryptError::DecryptionFailed
            | age::DecryptError::KeyDecryptionFailed => WbError::IncorrectPassphrase,
            age::DecryptError::ExcessiveWork { .. } => WbError::Configuration(format!(
                "private key protection exceeds the allowed work factor: {}",
                e
            )),
            _ => WbError::Crypto(format!("Failed to open private key: {}", e)),
        })?;

    let mut plaintext = Zeroizing::new(Vec::new());
    reader
        .read_to_end(&mut plaintext)
        .map_err(|e| WbError::Crypto(format!("Failed to read private key: {}", e)))?;
    let seeds: SecretSeeds = serde_json::from_slice(&plaintext)
        .map_err(|e| WbError::InvalidKey(format!("malformed secret seeds: {}", e)))?;
    check_version(seeds.version)?;

    let secrets = UnlockedSecrets {
        encryption: age_identity(&decode_seed(&seeds.encryption, "encryption seed")?)?,
        signing: SigningKey::from_bytes(&decode_seed(&seeds.signing, "signing seed")?),
    };
    if secrets.signing.verifying_key() != key.public.signing
        || secrets.encryption.to_public().to_string() != key.public.recipient()
    {
        return Err(WbError::InvalidKey(
            "sealed secret does not match the public key".to_string(),
        ));
    }
    Ok(AgeUnlockedKey {
        secrets: Arc::new(secrets),
    })
}

fn encrypt_blocking(
    data: &[u8],
    recipients: &[AgePublicKey],
    signing_key: &AgeUnlockedKey,
    framing: Framing,
) -> Result<EncryptedMessage> {
    let signature = signing_key.secrets.signing.sign(data);
    let mut frame = Zeroizing::new(Vec::with_capacity(1 + SIGNATURE_LENGTH + data.len()));
    frame.push(FORMAT_VERSION);
    frame.extend_from_slice(&signature.to_bytes());
    frame.extend_from_slice(data);

    let encryptor = age::Encryptor::with_recipients(
        recipients
            .iter()
            .map(|recipient| &recipient.encryption as &dyn age::Recipient),
    )
    .map_err(|e| WbError::Crypto(format!("Failed to create encryptor: {}", e)))?;

    let mut encrypted = Vec::new();
    match framing {
        Framing::Binary => {
            let mut writer = encryptor
                .wrap_output(&mut encrypted)
                .map_err(|e| WbError::Crypto(format!("Failed to create encryptor: {}", e)))?;
            writer
                .write_all(&frame)
                .map_err(|e| WbError::Crypto(format!("Encryption write failed: {}", e)))?;
            writer
                .finish()
                .map_err(|e| WbError::Crypto(format!("Encryption finish failed: {}", e)))?;
            Ok(EncryptedMessage::Binary(encrypted))
        }
        Framing::Armored => {
            let armored = ArmoredWriter::wrap_output(&mut encrypted, Format::AsciiArmor)
                .map_err(|e| WbError::Crypto(format!("Failed to create armor: {}", e)))?;
            let mut writer = encryptor
                .wrap_output(armored)
                .map_err(|e| WbError::Crypto(format!("Failed to create encryptor: {}", e)))?;
            writer
                .write_all(&frame)
                .map_err(|e| WbError::Crypto(format!("Encryption write failed: {}", e)))?;
            writer
                .finish()
                .and_then(|armor| armor.finish())
                .map_err(|e| WbError::Crypto(format!("Encryption finish failed: {}", e)))?;
            let text = String::from_utf8(encrypted)
                .map_err(|e| WbError::Crypto(format!("Armor produced non UTF-8: {}", e)))?;
            Ok(EncryptedMessage::Armored(text))
        }
    }
}

fn decrypt_blocking(
    message: &AgeMessage,
    private_key: &AgeUnlockedKey,
    signer: &AgePublicKey,
) -> Result<Vec<u8>> {
    let decryptor = age::Decryptor::new(&message.bytes[..])
        .map_err(|e| WbError::Crypto(format!("Failed to create decryptor: {}", e)))?;
    let mut reader = decryptor
        .decrypt(iter::once(
            &private_key.secrets.encryption as &dyn age::Identity,
        ))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys => {
                WbError::Crypto("message is not addressed to this identity".to_string())
            }
            _ => WbError::Crypto(format!("Decryption failed: {}", e)),
        })?;

    let mut frame = Zeroizing::new(Vec::new());
    reader
        .read_to_end(&mut frame)
        .map_err(|e| WbError::Crypto(format!("Failed to read decrypted data: {}", e)))?;

    let (signature, payload) = split_frame(&frame)?;
    signer.signing.verify(payload, &signature).map_err(|_| {
        WbError::InvalidSignature(format!(
            "payload was not signed by key {}",
            signer.fingerprint()
        ))
    })?;
    Ok(payload.to_vec())
}

fn seal_with_passphrase(plaintext: &[u8], passphrase: &str, work_factor: u8) -> Result<Vec<u8>> {
    let mut recipient = age::scrypt::Recipient::new(SecretString::from(passphrase.to_string()));
    recipient.set_work_factor(work_factor);
    let encryptor =
        age::Encryptor::with_recipients(iter::once(&recipient as &dyn age::Recipient))
            .map_err(|e| WbError::Crypto(format!("Failed to create encryptor: {}", e)))?;

    let mut sealed = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut sealed)
        .map_err(|e| WbError::Crypto(format!("Failed to create encryptor: {}", e)))?;
    writer
        .write_all(plaintext)
        .map_err(|e| WbError::Crypto(format!("Encryption write failed: {}", e)))?;
    writer
        .finish()
        .map_err(|e| WbError::Crypto(format!("Encryption finish failed: {}", e)))?;
    Ok(sealed)
}

/// Build an age X25519 identity from raw secret bytes via its bech32 form.
fn age_identity(seed: &[u8; SEED_LENGTH]) -> Result<age::x25519::Identity> {
    let encoded = bech32::encode("age-secret-key-", seed.to_base32(), Variant::Bech32)
        .map_err(|e| WbError::Crypto(format!("Failed to encode identity: {}", e)))?;
    let encoded = Zeroizing::new(encoded.to_ascii_uppercase());
    age::x25519::Identity::from_str(&encoded)
        .map_err(|e| WbError::InvalidKey(format!("invalid encryption identity: {}", e)))
}

fn decode_seed(encoded: &str, what: &str) -> Result<[u8; SEED_LENGTH]> {
    let bytes = Zeroizing::new(
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| WbError::InvalidKey(format!("invalid {} encoding: {}", what, e)))?,
    );
    <[u8; SEED_LENGTH]>::try_from(&bytes[..]).map_err(|_| {
        WbError::InvalidKey(format!(
            "{} must be {} bytes (got {})",
            what,
            SEED_LENGTH,
            bytes.len()
        ))
    })
}

fn split_frame(frame: &[u8]) -> Result<(Signature, &[u8])> {
    match frame.split_first() {
        Some((&FORMAT_VERSION, rest)) if rest.len() >= SIGNATURE_LENGTH => {
            let (signature, payload) = rest.split_at(SIGNATURE_LENGTH);
            let signature = <[u8; SIGNATURE_LENGTH]>::try_from(signature)
                .map_err(|_| WbError::Crypto("truncated signature".to_string()))?;
            Ok((Signature::from_bytes(&signature), payload))
        }
        Some((&FORMAT_VERSION, _)) => Err(WbError::Crypto(
            "signed frame is shorter than a signature".to_string(),
        )),
        _ => Err(WbError::Crypto("unsupported envelope frame".to_string())),
    }
}

fn check_version(version: u8) -> Result<()> {
    if version != FORMAT_VERSION {
        return Err(WbError::InvalidKey(format!(
            "unsupported key format version {}",
            version
        )));
    }
    Ok(())
}
