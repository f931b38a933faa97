//! The served media file and the primitives used to answer range requests.

pub mod content_type;
pub mod range;
pub mod reader;

pub use content_type::resolve_content_type;
pub use range::ByteRange;
pub use reader::RangeReader;

use std::io;
use std::path::{Path, PathBuf};

/// The single file exposed by a media server instance.
///
/// Size and content type are captured once when the server starts and
/// never change afterwards, so the value is shared across connections
/// without synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    path: PathBuf,
    file_name: String,
    size: u64,
    content_type: String,
}

impl ServedFile {
    /// Resolves `path` to an absolute path and records its metadata.
    ///
    /// The name and content type come from `path` as given, not from a
    /// symlink target, so they agree with the serving URL.
    ///
    /// # Errors
    ///
    /// Fails if the path does not exist or is not a regular file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let file_name = file_name_of(path);
        let path = std::fs::canonicalize(path)?;
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let content_type = resolve_content_type(&file_name);

        Ok(Self {
            path,
            file_name,
            size: metadata.len(),
            content_type,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used in the serving URL.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Size in bytes at server start.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Returns the final component of `path` as a lossy UTF-8 string.
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_captures_size_and_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.mkv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 4096]).unwrap();

        let served = ServedFile::load(&path).unwrap();
        assert_eq!(served.size(), 4096);
        assert_eq!(served.file_name(), "movie.mkv");
        assert_eq!(served.content_type(), "video/x-matroska");
        assert!(served.path().is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_keeps_the_name_it_was_given() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("blob.bin");
        std::fs::write(&target, [0u8; 64]).unwrap();
        let link = dir.path().join("movie.mkv");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let served = ServedFile::load(&link).unwrap();
        assert_eq!(served.file_name(), "movie.mkv");
        assert_eq!(served.content_type(), "video/x-matroska");
        assert_eq!(served.path(), std::fs::canonicalize(&target).unwrap().as_path());
        assert_eq!(served.size(), 64);
    }

    #[test]
    fn load_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServedFile::load(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn load_rejects_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServedFile::load(&dir.path().join("missing.mp4")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
