//! Re-opening a previously derived identity.

use secrecy::ExposeSecret;
use tracing::debug;
use wbkeys_core::{AgePrimitives, Receiver, WbError, WhistleblowerSession};

use crate::cli::IdentityArgs;
use crate::errors::CliError;
use crate::helpers::{prompt_keycode, read_text, RecipientArg};

use super::AppContext;

impl AppContext<'_> {
    /// Re-derive the passphrase from the keycode, install the armored
    /// identity with `recipients`, and unlock it.
    pub async fn open_session(
        &self,
        identity: &IdentityArgs,
        recipients: &[RecipientArg],
    ) -> anyhow::Result<WhistleblowerSession<AgePrimitives>> {
        let armored_private = read_text(&identity.identity)?;
        let receivers = recipients
            .iter()
            .map(|recipient| {
                Ok(Receiver::new(
                    recipient.id.clone(),
                    read_text(&recipient.path)?,
                ))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let keycode = prompt_keycode(self.no_input(), false)?;
        let mut session = self.new_session()?;
        session
            .recover_passphrase(keycode.expose_secret(), &identity.salt)
            .await?;
        session.initialize(&armored_private, &receivers)?;
        session.unlock().await.map_err(|e| match e {
            WbError::IncorrectPassphrase => anyhow::Error::from(CliError::auth_failed_with_hint(
                "Keycode does not unlock this identity",
                "Check the keycode and the --salt used when the identity was derived",
            )),
            other => other.into(),
        })?;

        debug!(
            recipients = session.keyring().recipient_count(),
            "Identity opened"
        );
        Ok(session)
    }
}
