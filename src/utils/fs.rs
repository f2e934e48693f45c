//! File helpers with explicit absent/failed outcomes.
//!
//! A missing file is a normal condition (cold cache, first run) and is
//! reported as `Ok(None)`. Every other failure is an `Err` the caller must
//! handle; nothing here turns an error into content.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a UTF-8 file, returning `Ok(None)` when it does not exist.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write a file through a temp file in the same directory, persisted over
/// the target.
///
/// Readers never observe a half-written file.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_optional_missing() {
        let dir = TempDir::new().unwrap();
        let result = read_optional(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_optional_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_optional(dir.path()).is_err());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/manifest.json");

        write_atomic(&path, b"{}").unwrap();
        write_atomic(&path, b"{\"a\":\"b\"}").unwrap();

        assert_eq!(read_optional(&path).unwrap().unwrap(), "{\"a\":\"b\"}");
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, ["manifest.json"]);
    }

    #[test]
    fn test_write_atomic_below_a_file_is_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        assert!(write_atomic(&blocker.join("manifest.json"), b"{}").is_err());
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
    }
}
