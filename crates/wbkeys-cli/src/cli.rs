use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use wbkeys_core::VERSION;

use crate::helpers::{parse_recipient_arg, RecipientArg};

/// wbkeys - keycode identities and signed, encrypted submissions
#[derive(Parser)]
#[command(name = "wbkeys")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "WBKEYS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

/// Identity selection shared by every command that signs or decrypts.
#[derive(Args)]
pub struct IdentityArgs {
    /// Armored private key written by `wbkeys derive`
    #[arg(long, value_name = "FILE")]
    pub identity: PathBuf,

    /// Salt the identity was derived with
    #[arg(long)]
    pub salt: String,
}

/// Arguments for the `derive` command
#[derive(Args)]
pub struct DeriveArgs {
    /// Per-submission salt (at least 8 bytes)
    #[arg(long)]
    pub salt: String,

    /// Write the submission record here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// Arguments for the `encrypt-file` command
#[derive(Args)]
pub struct EncryptFileArgs {
    /// Attachment to encrypt
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Recipient as ID=PUBLIC_KEY_FILE (repeatable)
    #[arg(long = "recipient", value_name = "ID=FILE", value_parser = parse_recipient_arg, required = true)]
    pub recipients: Vec<RecipientArg>,

    /// Output path for the encrypted attachment
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
}

/// Arguments for the `encrypt-answers` command
#[derive(Args)]
pub struct EncryptAnswersArgs {
    /// JSON answers file ("-" for stdin)
    #[arg(value_name = "JSON_FILE")]
    pub answers: PathBuf,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Recipient as ID=PUBLIC_KEY_FILE (repeatable)
    #[arg(long = "recipient", value_name = "ID=FILE", value_parser = parse_recipient_arg)]
    pub recipients: Vec<RecipientArg>,

    /// Write the armored envelope here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// Arguments for the `decrypt` command
#[derive(Args)]
pub struct DecryptArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Armored message file (repeatable, paired with --signer)
    #[arg(long = "message", value_name = "FILE", required = true)]
    pub messages: Vec<PathBuf>,

    /// Signer public key file for the message at the same position
    #[arg(long = "signer", value_name = "FILE")]
    pub signers: Vec<PathBuf>,
}

/// Arguments for the `decrypt-file` command
#[derive(Args)]
pub struct DecryptFileArgs {
    /// Encrypted attachment
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Public key file of the sender
    #[arg(long, value_name = "FILE")]
    pub signer: PathBuf,

    /// Output path for the decrypted attachment
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Derive an identity from a keycode and print the submission record
    Derive(DeriveArgs),

    /// Sign and encrypt an attachment for one or more recipients
    EncryptFile(EncryptFileArgs),

    /// Sign and encrypt JSON answers (the sender is always a recipient)
    EncryptAnswers(EncryptAnswersArgs),

    /// Decrypt armored messages and verify their signers
    Decrypt(DecryptArgs),

    /// Decrypt an attachment and verify its signer
    DecryptFile(DecryptFileArgs),

    /// Print the public key of an armored private key
    ExportPublic {
        /// Armored private key
        #[arg(long, value_name = "FILE")]
        identity: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}
