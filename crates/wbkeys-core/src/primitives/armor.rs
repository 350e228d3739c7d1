//! Text armor for key material.
//!
//! Keys are stored as PEM-style blocks: a `-----BEGIN <LABEL>-----` line,
//! the standard base64 body wrapped at 64 columns, and a matching END line.
//! Several blocks may follow each other in one text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, WbError};

pub(crate) const PUBLIC_KEY_LABEL: &str = "WBKEYS PUBLIC KEY";
pub(crate) const PRIVATE_KEY_LABEL: &str = "WBKEYS PRIVATE KEY";

const LINE_WIDTH: usize = 64;

/// One decoded block.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ArmoredBlock {
    pub label: String,
    pub body: Vec<u8>,
}

pub(crate) fn armor(label: &str, body: &[u8]) -> String {
    let encoded = STANDARD.encode(body);
    let mut out = format!("-----BEGIN {}-----\n", label);
    // base64 output is ASCII, so byte chunks are valid str slices
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out.push_str(&format!("-----END {}-----\n", label));
    out
}

pub(crate) fn dearmor(text: &str) -> Result<Vec<ArmoredBlock>> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        match current.take() {
            None => {
                let label = parse_marker(line, "BEGIN").ok_or_else(|| {
                    WbError::InvalidKey("expected an armor BEGIN line".to_string())
                })?;
                current = Some((label.to_string(), String::new()));
            }
            Some((label, mut encoded)) => {
                if let Some(end_label) = parse_marker(line, "END") {
                    if end_label != label {
                        return Err(WbError::InvalidKey(format!(
                            "armor END label '{}' does not match BEGIN label '{}'",
                            end_label, label
                        )));
                    }
                    let body = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                        WbError::InvalidKey(format!("invalid base64 in armor body: {}", e))
                    })?;
                    blocks.push(ArmoredBlock { label, body });
                } else {
                    encoded.push_str(line);
                    current = Some((label, encoded));
                }
            }
        }
    }

    if let Some((label, _)) = current {
        return Err(WbError::InvalidKey(format!(
            "armor block '{}' is missing its END line",
            label
        )));
    }
    if blocks.is_empty() {
        return Err(WbError::InvalidKey("no armored block found".to_string()));
    }
    Ok(blocks)
}

fn parse_marker<'a>(line: &'a str, kind: &str) -> Option<&'a str> {
    line.strip_prefix("-----")?
        .strip_suffix("-----")?
        .strip_prefix(kind)?
        .strip_prefix(' ')
}
