//! Application context for the wbkeys CLI.

use wbkeys_core::{AgePrimitives, CryptoConfig, WhistleblowerSession};

use crate::cli::Cli;
use crate::config::WbkeysConfig;

/// CLI arguments bundled with the loaded configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: WbkeysConfig,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli, config: WbkeysConfig) -> Self {
        Self { cli, config }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn no_input(&self) -> bool {
        self.cli.no_input
    }

    pub fn crypto(&self) -> &CryptoConfig {
        &self.config.crypto
    }

    /// A fresh session with nothing installed.
    pub fn new_session(&self) -> anyhow::Result<WhistleblowerSession<AgePrimitives>> {
        Ok(WhistleblowerSession::with_config(self.config.crypto.clone())?)
    }
}
