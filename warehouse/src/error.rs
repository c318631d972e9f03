//! Error types for warehouse operations.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {path} (line {line}): {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Database not initialized at {0} (run `etl init` first)")]
    NotInitialized(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to process {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Broad failure classes the batch driver reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileSystem,
    MalformedRecord,
    Store,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::FileSystem => "filesystem",
            ErrorKind::MalformedRecord => "malformed-record",
            ErrorKind::Store => "store",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::FileSystem { .. } => ErrorKind::FileSystem,
            Error::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Error::DuckDb(_) | Error::NotInitialized(_) => ErrorKind::Store,
            Error::Config(_) => ErrorKind::Config,
            Error::File { source, .. } => source.kind(),
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileSystem {
            path: path.into(),
            source,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
        let message = e.to_string();
        let source = e
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other(message));
        Error::FileSystem { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
