use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize alias document for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{0}' is not a valid session short id (8+ lowercase letters or digits)")]
    InvalidShortId(String),

    #[error("cannot resolve home directory for the session config root")]
    HomeDirNotFound,

    #[error("failed to format current timestamp: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl SessionStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }
}

/// Reasons an alias operation was refused or could not be saved.
#[derive(Debug, Error)]
pub enum AliasError {
    #[error("Alias name cannot be empty")]
    EmptyName,

    #[error("Alias name '{0}' must contain only letters, numbers, dashes, and underscores")]
    InvalidName(String),

    #[error("'{0}' is a reserved alias name")]
    ReservedName(String),

    #[error("Alias '{0}' not found")]
    NotFound(String),

    #[error("Alias '{0}' already exists")]
    AlreadyExists(String),

    #[error("failed to save aliases: {0}")]
    Persist(#[from] SessionStoreError),
}
