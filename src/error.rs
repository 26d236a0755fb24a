use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// All errors produced by the addon and its work-unit executor.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A source, index, or metadata read failed.
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A destination or index write failed.
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A destination parent directory could not be created.
    #[error("cannot create directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output tree could not be traversed.
    #[error("cannot walk '{}': {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file exists but does not parse.
    #[error("invalid config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// Shorthand constructors.
impl BuildError {
    pub fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn create_dir(path: &Path, source: io::Error) -> Self {
        Self::CreateDir {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn walk(path: &Path, source: io::Error) -> Self {
        Self::Walk {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn config(path: &Path, source: serde_json::Error) -> Self {
        Self::Config {
            path: path.to_path_buf(),
            source,
        }
    }
}
