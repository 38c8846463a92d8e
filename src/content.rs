//! File content loading.
//!
//! Files are sniffed before they are read in full: a NUL byte, or any
//! control byte other than tab, line feed and carriage return, in the first
//! [`SNIFF_LEN`] bytes marks the file as binary.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Number of leading bytes inspected by [`is_binary`].
pub const SNIFF_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The loaded contents of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    /// A binary file whose bytes were not loaded.
    Binary,
}

impl FileContent {
    pub fn is_binary(&self) -> bool {
        matches!(self, FileContent::Binary)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(text) => Some(text),
            FileContent::Binary => None,
        }
    }
}

/// Whether `bytes` look like the start of a binary file.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(SNIFF_LEN)]
        .iter()
        .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r'))
}

/// Load a file.
///
/// With `skip_binary`, binary files come back as [`FileContent::Binary`]
/// without being read past the sniffed prefix. Otherwise every file is
/// decoded as text, lossily where it is not valid UTF-8.
pub fn load_content(path: &Path, skip_binary: bool) -> Result<FileContent, ContentError> {
    let read_err = |source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;

    let mut bytes = Vec::new();
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut bytes)
        .map_err(read_err)?;

    if skip_binary && is_binary(&bytes) {
        return Ok(FileContent::Binary);
    }

    file.read_to_end(&mut bytes).map_err(read_err)?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Ok(FileContent::Text(text))
}
