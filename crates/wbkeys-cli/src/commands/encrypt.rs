use wbkeys_core::FileBlob;

use crate::app::AppContext;
use crate::cli::{EncryptAnswersArgs, EncryptFileArgs};
use crate::errors::CliError;
use crate::helpers::{ensure_exists, read_text, write_output};

pub async fn handle_encrypt_file(
    ctx: &AppContext<'_>,
    args: &EncryptFileArgs,
) -> anyhow::Result<()> {
    ensure_exists(&args.file)?;
    let session = ctx.open_session(&args.identity, &args.recipients).await?;

    let blob = FileBlob::from_path(&args.file).await?;
    let ids: Vec<&str> = args.recipients.iter().map(|r| r.id.as_str()).collect();
    let encrypted = session.handle_file_encryption(&blob, &ids).await?;
    write_output(Some(&args.out), &encrypted.data)?;

    if !ctx.quiet() {
        eprintln!(
            "Encrypted {} for {} recipient(s) to {}",
            encrypted.name,
            ids.len(),
            args.out.display()
        );
    }
    Ok(())
}

pub async fn handle_encrypt_answers(
    ctx: &AppContext<'_>,
    args: &EncryptAnswersArgs,
) -> anyhow::Result<()> {
    let answers = read_text(&args.answers)?;
    serde_json::from_str::<serde_json::Value>(&answers)
        .map_err(|e| CliError::invalid_input(format!("Answers are not valid JSON: {}", e)))?;

    let session = ctx.open_session(&args.identity, &args.recipients).await?;
    let ids: Vec<&str> = args.recipients.iter().map(|r| r.id.as_str()).collect();
    let armored = session.encrypt_and_sign_answers(&answers, &ids).await?;
    write_output(args.out.as_deref(), armored.as_bytes())?;
    Ok(())
}
