//! File capability contract and a local filesystem implementation.

use log::info;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type FileResult<T> = Result<T, FileError>;

/// MIME type attached to exported annotation files.
pub const JSON_MIME: &str = "application/json";

/// Opaque reference to a file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub path: PathBuf,
}

impl FileHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

#[derive(Debug)]
pub enum FileError {
    Io { path: PathBuf, source: std::io::Error },
    InvalidFileName(String),
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "file access failed for `{}`: {source}", path.display())
            }
            Self::InvalidFileName(name) => write!(f, "invalid download file name: `{name}`"),
        }
    }
}

impl Error for FileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidFileName(_) => None,
        }
    }
}

/// Picker, reader and download primitives provided by the host.
pub trait FileGateway {
    /// Asks the user for a file. `Ok(None)` means the dialog was dismissed.
    fn pick_file(&mut self) -> FileResult<Option<FileHandle>>;
    fn read_text(&mut self, file: &FileHandle) -> FileResult<String>;
    fn download(&mut self, content: &str, file_name: &str, mime: &str) -> FileResult<()>;
}

/// Filesystem gateway: "picking" pops queued paths, downloads land in a
/// fixed directory.
#[derive(Debug)]
pub struct FsFileGateway {
    download_dir: PathBuf,
    selections: VecDeque<PathBuf>,
}

impl FsFileGateway {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            selections: VecDeque::new(),
        }
    }

    /// Queues the path returned by the next `pick_file` call.
    pub fn select(&mut self, path: impl Into<PathBuf>) {
        self.selections.push_back(path.into());
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl FileGateway for FsFileGateway {
    fn pick_file(&mut self) -> FileResult<Option<FileHandle>> {
        Ok(self.selections.pop_front().map(FileHandle::from_path))
    }

    fn read_text(&mut self, file: &FileHandle) -> FileResult<String> {
        std::fs::read_to_string(&file.path).map_err(|source| FileError::Io {
            path: file.path.clone(),
            source,
        })
    }

    fn download(&mut self, content: &str, file_name: &str, mime: &str) -> FileResult<()> {
        let name = Path::new(file_name);
        if file_name.trim().is_empty() || name.components().count() != 1 {
            return Err(FileError::InvalidFileName(file_name.to_string()));
        }

        std::fs::create_dir_all(&self.download_dir).map_err(|source| FileError::Io {
            path: self.download_dir.clone(),
            source,
        })?;
        let target = self.download_dir.join(name);
        std::fs::write(&target, content).map_err(|source| FileError::Io {
            path: target.clone(),
            source,
        })?;

        info!(
            "event=file_download module=files status=ok path={} mime={} bytes={}",
            target.display(),
            mime,
            content.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileError, FileGateway, FsFileGateway, JSON_MIME};

    #[test]
    fn download_writes_into_target_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut files = FsFileGateway::new(dir.path());
        files
            .download("[]", "regions.json", JSON_MIME)
            .expect("download should succeed");

        let written =
            std::fs::read_to_string(dir.path().join("regions.json")).expect("file written");
        assert_eq!(written, "[]");
    }

    #[test]
    fn download_rejects_nested_names() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut files = FsFileGateway::new(dir.path());
        let err = files
            .download("[]", "../escape.json", JSON_MIME)
            .expect_err("nested path must be rejected");
        assert!(matches!(err, FileError::InvalidFileName(_)));
    }

    #[test]
    fn pick_returns_queued_selection_once() {
        let mut files = FsFileGateway::new("/tmp");
        files.select("/data/take1.json");
        let picked = files.pick_file().expect("pick").expect("selection");
        assert_eq!(picked.name, "take1.json");
        assert!(files.pick_file().expect("pick").is_none());
    }
}
