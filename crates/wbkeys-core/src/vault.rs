//! In-memory holder of the identity's unlocking secret.

use secrecy::SecretString;

/// The single secret that unlocks the installed identity.
///
/// Nothing is persisted. The secret is zeroized when overwritten or cleared.
#[derive(Default)]
pub struct PassphraseVault {
    secret: Option<SecretString>,
}

impl PassphraseVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored secret. No validation.
    pub fn store(&mut self, passphrase: SecretString) {
        self.secret = Some(passphrase);
    }

    pub fn clear(&mut self) {
        self.secret = None;
    }

    pub fn get(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_none()
    }
}

impl std::fmt::Debug for PassphraseVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseVault")
            .field("stored", &self.secret.is_some())
            .finish()
    }
}
