use secrecy::ExposeSecret;
use wbkeys_core::Submission;

use crate::app::AppContext;
use crate::cli::DeriveArgs;
use crate::helpers::{prompt_keycode, write_output};

pub async fn handle_derive(ctx: &AppContext<'_>, args: &DeriveArgs) -> anyhow::Result<()> {
    let keycode = prompt_keycode(ctx.no_input(), true)?;
    let mut session = ctx.new_session()?;
    let mut submission = Submission::new();
    session
        .derive_key(keycode.expose_secret(), &args.salt, &mut submission)
        .await?;

    let mut json = serde_json::to_string_pretty(&submission)?;
    json.push('\n');
    write_output(args.out.as_deref(), json.as_bytes())?;

    if let Some(path) = &args.out {
        if !ctx.quiet() {
            eprintln!("Wrote submission record to {}", path.display());
        }
    }
    Ok(())
}
