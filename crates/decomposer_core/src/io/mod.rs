//! File I/O collaborator surface.
//!
//! # Responsibility
//! - Define the two file operations the core needs: read a file as text and
//!   offer text for download.
//! - Provide a filesystem-backed implementation for native callers.
//!
//! # Invariants
//! - The core never knows the transport behind a surface.
//! - Downloads are written under the surface root only; file names with
//!   path separators are rejected.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const MIME_JSON: &str = "application/json";
pub const MIME_TEXT: &str = "text/plain;charset=utf-8";
pub const MIME_TABLE: &str = "text/csv;charset=utf-8";

pub type IoResult<T> = Result<T, IoError>;

#[derive(Debug)]
pub enum IoError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Download name is empty or contains path components.
    InvalidFileName(String),
}

impl Display for IoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
            Self::InvalidFileName(name) => write!(f, "invalid download file name `{name}`"),
        }
    }
}

impl Error for IoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::InvalidFileName(_) => None,
        }
    }
}

/// Transport the core uses for file reads and downloads.
pub trait FileSurface {
    /// Reads the whole file as UTF-8 text.
    fn read_text(&self, path: &Path) -> IoResult<String>;
    /// Offers `content` to the user under `file_name`.
    fn offer_download(&self, file_name: &str, content: &str, mime_type: &str) -> IoResult<()>;
}

/// Filesystem surface: reads any path, writes downloads into `root`.
#[derive(Debug, Clone)]
pub struct FsSurface {
    root: PathBuf,
}

impl FsSurface {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target path of a download with `file_name`.
    pub fn download_path(&self, file_name: &str) -> IoResult<PathBuf> {
        let candidate = Path::new(file_name);
        let is_plain_name = candidate.file_name().and_then(|name| name.to_str()) == Some(file_name);
        if file_name.trim().is_empty() || !is_plain_name {
            return Err(IoError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

impl FileSurface for FsSurface {
    fn read_text(&self, path: &Path) -> IoResult<String> {
        std::fs::read_to_string(path).map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn offer_download(&self, file_name: &str, content: &str, mime_type: &str) -> IoResult<()> {
        let path = self.download_path(file_name)?;
        std::fs::create_dir_all(&self.root).map_err(|source| IoError::Write {
            path: self.root.clone(),
            source,
        })?;
        std::fs::write(&path, content).map_err(|source| IoError::Write {
            path: path.clone(),
            source,
        })?;
        info!(
            "event=download module=io status=ok file={} mime={} bytes={}",
            file_name,
            mime_type,
            content.len()
        );
        Ok(())
    }
}
