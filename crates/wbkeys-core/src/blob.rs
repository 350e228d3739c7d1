//! File-like payloads and byte conversion.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;

/// Generic binary content type. Encrypted attachments always carry it so
/// transport layers pass the bytes through untouched.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A named blob of bytes with a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn octet_stream(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::new(name, OCTET_STREAM, data)
    }

    /// Read a file from disk. The blob is named after the file name component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let data = blob_to_byte_array(file).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::octet_stream(name, data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Drain an async reader into a byte vector.
pub async fn blob_to_byte_array<R: AsyncRead + Unpin>(mut reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(bytes)
}
