use wbkeys_core::FileBlob;

use crate::app::AppContext;
use crate::cli::{DecryptArgs, DecryptFileArgs};
use crate::helpers::{ensure_exists, read_text, write_output};

pub async fn handle_decrypt(ctx: &AppContext<'_>, args: &DecryptArgs) -> anyhow::Result<()> {
    let messages = args
        .messages
        .iter()
        .map(|path| read_text(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let signers = args
        .signers
        .iter()
        .map(|path| read_text(path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let session = ctx.open_session(&args.identity, &[]).await?;
    let plaintexts = session
        .decrypt_and_verify_messages(&messages, &signers)
        .await?;

    let mut json = serde_json::to_string_pretty(&plaintexts)?;
    json.push('\n');
    write_output(None, json.as_bytes())
}

pub async fn handle_decrypt_file(
    ctx: &AppContext<'_>,
    args: &DecryptFileArgs,
) -> anyhow::Result<()> {
    ensure_exists(&args.file)?;
    let signer = read_text(&args.signer)?;
    let session = ctx.open_session(&args.identity, &[]).await?;

    let blob = FileBlob::from_path(&args.file).await?;
    let decrypted = session.decrypt_and_verify_file(&blob, &signer).await?;
    write_output(Some(&args.out), &decrypted.data)?;

    if !ctx.quiet() {
        eprintln!("Decrypted {} to {}", decrypted.name, args.out.display());
    }
    Ok(())
}
