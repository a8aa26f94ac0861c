//! UTF-16 text I/O and hpprgm program-container support.
//!
//! Calculator program files come in three flavours: plain UTF-8 text,
//! UTF-16LE text with a byte-order mark, and the binary hpprgm container
//! that wraps UTF-16LE program code in a small header. This crate loads
//! any of the three into a `String` and writes the two binary flavours
//! back out.

pub mod hpprgm;
pub mod utf16;

use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading or writing program files.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: container header is inconsistent")]
    MalformedContainer { path: PathBuf },
}

/// Load the program text stored at `path`, whatever its on-disk flavour.
///
/// UTF-16LE files are detected by their byte-order mark, containers by
/// signature or by a header-size/code-size consistency check. Anything
/// else is treated as plain UTF-8 source.
pub fn load_program_text(path: &Path) -> Result<String, ContainerError> {
    let bytes = fs::read(path).map_err(|source| ContainerError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if utf16::has_bom(&bytes) {
        log::debug!("{}: UTF-16LE text", path.display());
        return Ok(utf16::decode_utf16le(&bytes[2..]));
    }

    if hpprgm::is_g2(&bytes) || hpprgm::is_g1(&bytes) {
        log::debug!("{}: hpprgm container", path.display());
        return hpprgm::extract_code(&bytes).ok_or_else(|| ContainerError::MalformedContainer {
            path: path.to_path_buf(),
        });
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write `text` to `path` as UTF-16LE with a byte-order mark.
pub fn write_utf16le_file(path: &Path, text: &str) -> Result<(), ContainerError> {
    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    utf16::push_bom(&mut bytes);
    utf16::encode_utf16le(text, &mut bytes);
    fs::write(path, bytes).map_err(|source| ContainerError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `text` to `path` wrapped in an hpprgm container header.
pub fn write_container_file(path: &Path, text: &str) -> Result<(), ContainerError> {
    let bytes = hpprgm::build_container(text);
    fs::write(path, bytes).map_err(|source| ContainerError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_plain_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("EXPORT A()\nBEGIN\nEND;\n".as_bytes()).unwrap();
        let text = load_program_text(file.path()).unwrap();
        assert_eq!(text, "EXPORT A()\nBEGIN\nEND;\n");
    }

    #[test]
    fn loads_utf16le_with_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = Vec::new();
        utf16::push_bom(&mut bytes);
        utf16::encode_utf16le("A▶B;\n", &mut bytes);
        file.write_all(&bytes).unwrap();
        let text = load_program_text(file.path()).unwrap();
        assert_eq!(text, "A▶B;\n");
    }

    #[test]
    fn round_trips_container_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_container_file(file.path(), "BEGIN\nEND;\n").unwrap();
        let text = load_program_text(file.path()).unwrap();
        assert_eq!(text, "BEGIN\nEND;\n");
    }
}
