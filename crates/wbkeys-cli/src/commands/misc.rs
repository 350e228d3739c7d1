use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use wbkeys_core::{AgePrimitives, CryptoPrimitives};

use crate::app::AppContext;
use crate::cli::Cli;
use crate::helpers::{read_text, write_output};

pub fn handle_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "wbkeys", &mut std::io::stdout());
    Ok(())
}

/// The public part of a private key is readable without the keycode.
pub fn handle_export_public(ctx: &AppContext<'_>, identity: &Path) -> anyhow::Result<()> {
    let primitives = AgePrimitives::new(ctx.crypto());
    let private_key = primitives.parse_armored_private_key(&read_text(identity)?)?;
    let armored = primitives.armor_public_key(&primitives.public_key_of(&private_key));
    write_output(None, armored.as_bytes())
}
