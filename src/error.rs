//! Error type shared by the flat and composite editors

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading or rewriting a configuration file.
///
/// Content problems are never errors: lines the scanner does not understand
/// are passed through untouched. Only I/O can fail.
#[derive(Error, Debug)]
pub enum EditError {
    /// The file could not be read (including when it does not exist).
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The rewritten content could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temporary file could not be renamed over the target.
    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EditError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        EditError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        EditError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true if the error was caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            EditError::Read { source, .. }
            | EditError::Write { source, .. }
            | EditError::Persist { source, .. } => source.kind() == io::ErrorKind::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
