//! Input and file helpers for the CLI.

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use dialoguer::Password;
use secrecy::SecretString;

use crate::constants::KEYCODE_ENV;
use crate::errors::CliError;

/// `--recipient ID=FILE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientArg {
    pub id: String,
    pub path: PathBuf,
}

pub fn parse_recipient_arg(value: &str) -> Result<RecipientArg, String> {
    let (id, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ID=FILE, got '{}'", value))?;
    let id = id.trim();
    if id.is_empty() || path.trim().is_empty() {
        return Err(format!("expected ID=FILE, got '{}'", value));
    }
    Ok(RecipientArg {
        id: id.to_string(),
        path: PathBuf::from(path.trim()),
    })
}

/// Read the keycode from `WBKEYS_KEYCODE`, or prompt for it.
///
/// `confirm` asks twice, for the first derivation of an identity.
pub fn prompt_keycode(no_input: bool, confirm: bool) -> anyhow::Result<SecretString> {
    if let Ok(value) = std::env::var(KEYCODE_ENV) {
        if !value.trim().is_empty() {
            return Ok(SecretString::from(value));
        }
    }
    if no_input || !io::stdin().is_terminal() {
        return Err(CliError::invalid_input(format!(
            "No keycode provided and no TTY available. Set {}.",
            KEYCODE_ENV
        ))
        .into());
    }

    let prompt = Password::new().with_prompt("Keycode");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm keycode", "Keycodes do not match")
    } else {
        prompt
    };
    let value = prompt
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read keycode: {}", e))?;
    Ok(SecretString::from(value))
}

/// Read a text file, or stdin for `-`.
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
        return Ok(buffer);
    }
    ensure_exists(path)?;
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
}

pub fn ensure_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(CliError::not_found(
            format!("No file found at {}", path.display()),
            "Check the path and try again",
        )
        .into());
    }
    Ok(())
}

/// Write `contents` to `out`, or to stdout when no path is given.
pub fn write_output(out: Option<&Path>, contents: &[u8]) -> anyhow::Result<()> {
    match out {
        Some(path) => std::fs::write(path, contents)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e)),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipient_arg() {
        let arg = parse_recipient_arg("journalist=keys/j.pub").unwrap();
        assert_eq!(arg.id, "journalist");
        assert_eq!(arg.path, PathBuf::from("keys/j.pub"));

        assert!(parse_recipient_arg("journalist").is_err());
        assert!(parse_recipient_arg("=keys/j.pub").is_err());
        assert!(parse_recipient_arg("journalist=").is_err());
    }
}
