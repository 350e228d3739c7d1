//! The in-memory key ring: one private identity plus known recipients.
//!
//! Installing key material and authorizing its use are separate steps. After
//! [`KeyRing::initialize`] the identity is present but Locked; only
//! [`KeyRing::unlock`] with the matching passphrase makes the private key
//! available to signing and decryption.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::error::{Result, WbError};
use crate::primitives::{parse_first_public_key, CryptoPrimitives};

struct InstalledIdentity<P: CryptoPrimitives> {
    owner: String,
    private_key: P::PrivateKey,
    public_key: P::PublicKey,
    /// `Some` while Unlocked
    unlocked: Option<P::UnlockedKey>,
}

/// Owner of the current identity and of the recipient public keys.
pub struct KeyRing<P: CryptoPrimitives> {
    primitives: Arc<P>,
    identity: Option<InstalledIdentity<P>>,
    recipients: HashMap<String, P::PublicKey>,
}

impl<P: CryptoPrimitives> KeyRing<P> {
    pub fn new(primitives: Arc<P>) -> Self {
        Self {
            primitives,
            identity: None,
            recipients: HashMap::new(),
        }
    }

    /// Install `armored_private_key` as the identity of `owner_label`.
    ///
    /// Returns `false` when the key cannot be parsed; the ring is then left
    /// exactly as it was. On success any previous identity is discarded, the
    /// owner's public key is registered under `owner_label`, and the ring is
    /// Locked.
    pub fn initialize(&mut self, armored_private_key: &str, owner_label: &str) -> bool {
        let private_key = match self.primitives.parse_armored_private_key(armored_private_key) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Rejected private key during key ring initialization");
                return false;
            }
        };
        self.install(private_key, None, owner_label);
        true
    }

    /// Install an identity the caller has already unlocked. Replaces any
    /// previous identity and leaves the ring Unlocked.
    pub(crate) fn install_unlocked(
        &mut self,
        private_key: P::PrivateKey,
        unlocked: P::UnlockedKey,
        owner_label: &str,
    ) {
        self.install(private_key, Some(unlocked), owner_label);
    }

    fn install(
        &mut self,
        private_key: P::PrivateKey,
        unlocked: Option<P::UnlockedKey>,
        owner_label: &str,
    ) {
        let public_key = self.primitives.public_key_of(&private_key);

        if let Some(previous) = self.identity.take() {
            debug!(owner = %previous.owner, "Replacing installed identity");
            self.recipients.remove(&previous.owner);
        }
        self.recipients
            .insert(owner_label.to_string(), public_key.clone());
        info!(
            owner = owner_label,
            unlocked = unlocked.is_some(),
            "Identity installed"
        );
        self.identity = Some(InstalledIdentity {
            owner: owner_label.to_string(),
            private_key,
            public_key,
            unlocked,
        });
    }

    /// Parse and store a recipient key, overwriting any entry with the same id.
    pub fn add_pub_key(&mut self, id: &str, armored_public_key: &str) -> Result<()> {
        let key = parse_first_public_key(self.primitives.as_ref(), armored_public_key)?;
        self.insert_pub_key(id.to_string(), key);
        Ok(())
    }

    pub(crate) fn insert_pub_key(&mut self, id: String, key: P::PublicKey) {
        debug!(recipient = %id, "Recipient key registered");
        self.recipients.insert(id, key);
    }

    pub fn get_pub_key(&self, id: &str) -> Result<&P::PublicKey> {
        self.recipients
            .get(id)
            .ok_or_else(|| WbError::RecipientNotFound(id.to_string()))
    }

    /// The unlocked private key. Never unlocks implicitly.
    pub fn get_key(&self) -> Result<&P::UnlockedKey> {
        let identity = self.identity.as_ref().ok_or(WbError::NoIdentity)?;
        identity.unlocked.as_ref().ok_or(WbError::Locked)
    }

    /// Unlock the identity with `passphrase`.
    ///
    /// An absent or wrong passphrase fails with `IncorrectPassphrase` and
    /// leaves the lock state unchanged.
    pub async fn unlock(&mut self, passphrase: Option<&SecretString>) -> Result<()> {
        let identity = self.identity.as_mut().ok_or(WbError::NoIdentity)?;
        let Some(passphrase) = passphrase else {
            warn!(owner = %identity.owner, "Unlock attempted without a passphrase");
            return Err(WbError::IncorrectPassphrase);
        };

        match self
            .primitives
            .unlock_private_key(&identity.private_key, passphrase)
            .await
        {
            Ok(unlocked) => {
                identity.unlocked = Some(unlocked);
                debug!(owner = %identity.owner, "Key ring unlocked");
                Ok(())
            }
            Err(e) => {
                warn!(owner = %identity.owner, error = %e, "Key ring unlock rejected");
                Err(e)
            }
        }
    }

    /// Drop the unlocked key. Idempotent.
    pub fn lock(&mut self) -> Result<()> {
        let identity = self.identity.as_mut().ok_or(WbError::NoIdentity)?;
        if identity.unlocked.take().is_some() {
            debug!(owner = %identity.owner, "Key ring locked");
        }
        Ok(())
    }

    /// Forget the identity and every recipient.
    pub fn clear(&mut self) {
        self.identity = None;
        self.recipients.clear();
        debug!("Key ring cleared");
    }

    pub fn is_initialized(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_unlocked(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| identity.unlocked.is_some())
    }

    pub fn owner(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.owner.as_str())
    }

    pub fn owner_public_key(&self) -> Result<&P::PublicKey> {
        self.identity
            .as_ref()
            .map(|identity| &identity.public_key)
            .ok_or(WbError::NoIdentity)
    }

    /// Number of registered public keys, the owner's included.
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recipients.contains_key(id)
    }
}

impl<P: CryptoPrimitives> std::fmt::Debug for KeyRing<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("owner", &self.owner())
            .field("unlocked", &self.is_unlocked())
            .field("recipients", &self.recipients.len())
            .finish()
    }
}
