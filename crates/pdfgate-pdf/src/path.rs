use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Reasons a caller-supplied path is rejected before anything touches the file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidPath {
    #[error("path is missing")]
    Missing,
    #[error("path is empty")]
    Empty,
    #[error("no file exists at {0}")]
    NotFound(String),
}

/// A canonical path that existed at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath(PathBuf);

impl ValidatedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ValidatedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

pub fn validate(path: Option<&Path>) -> Result<ValidatedPath, InvalidPath> {
    let path = path.ok_or(InvalidPath::Missing)?;
    if path.as_os_str().is_empty() {
        return Err(InvalidPath::Empty);
    }
    fs::canonicalize(path)
        .map(ValidatedPath)
        .map_err(|_| InvalidPath::NotFound(path.display().to_string()))
}
