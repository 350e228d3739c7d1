//! wbkeys CLI - keycode identities and signed, encrypted submissions
//!
//! Command-line front end to `wbkeys-core`: derive an identity from a
//! keycode, encrypt attachments and answers for recipients, and decrypt and
//! verify what comes back.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wbkeys_core::WbError;

use app::AppContext;
use cli::{Cli, Commands};
use config::load_config;
use constants::LOG_ENV;
use errors::CliError;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        exit_with(err);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging.level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let ctx = AppContext::new(cli, config);
    runtime.block_on(dispatch(&ctx, &cli.command))
}

async fn dispatch(ctx: &AppContext<'_>, command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Derive(args) => commands::handle_derive(ctx, args).await,
        Commands::EncryptFile(args) => commands::handle_encrypt_file(ctx, args).await,
        Commands::EncryptAnswers(args) => commands::handle_encrypt_answers(ctx, args).await,
        Commands::Decrypt(args) => commands::handle_decrypt(ctx, args).await,
        Commands::DecryptFile(args) => commands::handle_decrypt_file(ctx, args).await,
        Commands::ExportPublic { identity } => commands::handle_export_public(ctx, identity),
        Commands::Completions { shell } => commands::handle_completions(*shell),
    }
}

/// Logs go to stderr so stdout stays machine readable.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn exit_with(err: anyhow::Error) -> ! {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        cli_err.exit();
    }
    if let Some(cli_err) = err.downcast_ref::<WbError>().and_then(CliError::from_core) {
        cli_err.exit();
    }
    eprintln!("Error: {:#}", err);
    std::process::exit(1)
}
